//! Filesystem primitives used by the walker, the reclaim engine and the
//! browser locator.
//!
//! Everything that touches the disk goes through [`Filesystem`] so tests can
//! inject locked, vanished or permission-denied entries without needing a
//! real OS that produces them.

use std::io;
use std::path::{Path, PathBuf};

/// What a directory entry is, as far as scanning cares
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    File,
    Dir,
    /// Symlinks, sockets, devices: never sized, never traversed
    Other,
}

/// Result of a `stat` on a single entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntryMeta {
    pub kind: EntryKind,
    pub len: u64,
}

impl EntryMeta {
    pub fn is_file(&self) -> bool {
        self.kind == EntryKind::File
    }

    pub fn is_dir(&self) -> bool {
        self.kind == EntryKind::Dir
    }
}

pub trait Filesystem: Send + Sync {
    /// List the immediate children of `path`, in listing order
    fn read_dir(&self, path: &Path) -> io::Result<Vec<PathBuf>>;

    /// Stat without following symlinks
    fn stat(&self, path: &Path) -> io::Result<EntryMeta>;

    /// Stat a scan or clean root, following it if it is a symlink or
    /// junction. Entries below the root are never followed.
    fn stat_root(&self, path: &Path) -> io::Result<EntryMeta> {
        self.stat(path)
    }

    fn exists(&self, path: &Path) -> bool {
        self.stat(path).is_ok()
    }

    fn remove_file(&self, path: &Path) -> io::Result<()>;

    fn remove_dir_all(&self, path: &Path) -> io::Result<()>;

    /// Move to the platform recycle bin
    fn move_to_trash(&self, path: &Path) -> io::Result<()>;
}

/// The real disk
#[derive(Debug, Default, Clone, Copy)]
pub struct LocalFs;

impl Filesystem for LocalFs {
    fn read_dir(&self, path: &Path) -> io::Result<Vec<PathBuf>> {
        let mut children = Vec::new();
        for entry in std::fs::read_dir(path)? {
            match entry {
                Ok(entry) => children.push(entry.path()),
                Err(e) => {
                    tracing::debug!(dir = %path.display(), error = %e, "skipping unreadable directory entry");
                }
            }
        }
        Ok(children)
    }

    fn stat(&self, path: &Path) -> io::Result<EntryMeta> {
        std::fs::symlink_metadata(path).map(entry_meta)
    }

    fn stat_root(&self, path: &Path) -> io::Result<EntryMeta> {
        std::fs::metadata(path).map(entry_meta)
    }

    fn remove_file(&self, path: &Path) -> io::Result<()> {
        std::fs::remove_file(path)
    }

    fn remove_dir_all(&self, path: &Path) -> io::Result<()> {
        std::fs::remove_dir_all(path)
    }

    fn move_to_trash(&self, path: &Path) -> io::Result<()> {
        trash::delete(path).map_err(|e| io::Error::other(e.to_string()))
    }
}

fn entry_meta(meta: std::fs::Metadata) -> EntryMeta {
    let file_type = meta.file_type();
    let kind = if file_type.is_file() {
        EntryKind::File
    } else if file_type.is_dir() {
        EntryKind::Dir
    } else {
        EntryKind::Other
    };
    EntryMeta {
        kind,
        len: if kind == EntryKind::File { meta.len() } else { 0 },
    }
}

/// Remove a file or a whole directory tree
pub fn remove_entry(fs: &dyn Filesystem, path: &Path, meta: &EntryMeta) -> io::Result<()> {
    if meta.is_dir() {
        fs.remove_dir_all(path)
    } else {
        fs.remove_file(path)
    }
}

/// Whether an I/O error is the ordinary noise of a live filesystem:
/// a locked or in-use file, a permission refusal, or an entry deleted
/// between listing and touching it
pub fn is_transient(err: &io::Error) -> bool {
    matches!(
        err.kind(),
        io::ErrorKind::PermissionDenied | io::ErrorKind::NotFound
    ) || is_sharing_violation(err)
}

#[cfg(windows)]
fn is_sharing_violation(err: &io::Error) -> bool {
    // ERROR_SHARING_VIOLATION, ERROR_LOCK_VIOLATION
    matches!(err.raw_os_error(), Some(32) | Some(33))
}

#[cfg(not(windows))]
fn is_sharing_violation(err: &io::Error) -> bool {
    // EBUSY, ETXTBSY
    matches!(err.raw_os_error(), Some(16) | Some(26))
}
