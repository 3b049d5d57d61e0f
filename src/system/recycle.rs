use anyhow::Result;

/// The OS recycle bin, as an opaque size/empty pair
pub trait RecycleBin: Send + Sync {
    /// Bytes currently held in the bin
    fn size(&self) -> Result<u64>;

    /// Permanently remove everything in the bin
    fn empty(&self) -> Result<()>;
}

/// Recycle bin backed by the `trash` crate
#[derive(Debug, Default, Clone, Copy)]
pub struct TrashCanBin;

#[cfg(any(
    windows,
    all(unix, not(target_os = "macos"), not(target_os = "ios"), not(target_os = "android"))
))]
impl RecycleBin for TrashCanBin {
    fn size(&self) -> Result<u64> {
        use trash::{TrashItemSize, os_limited};

        let items = os_limited::list()?;
        let mut total = 0u64;
        for item in &items {
            match os_limited::metadata(item) {
                Ok(meta) => {
                    // directories report an entry count, not bytes
                    if let TrashItemSize::Bytes(bytes) = meta.size {
                        total += bytes;
                    }
                }
                Err(e) => tracing::debug!(item = %item.original_path().display(), error = %e, "skipping trash item"),
            }
        }
        Ok(total)
    }

    fn empty(&self) -> Result<()> {
        let items = trash::os_limited::list()?;
        if items.is_empty() {
            return Ok(());
        }
        trash::os_limited::purge_all(items)?;
        Ok(())
    }
}

#[cfg(not(any(
    windows,
    all(unix, not(target_os = "macos"), not(target_os = "ios"), not(target_os = "android"))
)))]
impl RecycleBin for TrashCanBin {
    fn size(&self) -> Result<u64> {
        Err(crate::common::errors::PadmaError::Unsupported {
            feature: "Recycle bin inspection".into(),
        }
        .into())
    }

    fn empty(&self) -> Result<()> {
        Err(crate::common::errors::PadmaError::Unsupported {
            feature: "Emptying the recycle bin".into(),
        }
        .into())
    }
}
