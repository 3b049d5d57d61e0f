use serde::Serialize;
use std::collections::BTreeMap;
use std::io;
use std::path::{Path, PathBuf};

use crate::common::config::{Config, DeletePolicy, FreedSpaceAccounting};
use crate::common::fs::{self, EntryKind, EntryMeta, Filesystem};
use crate::common::errors::PadmaError;
use crate::common::safety;
use crate::scanner::catalog::{self, Catalog, CategoryKind, CategorySpec};
use crate::scanner::walker::{self, WalkOptions};
use crate::system::recycle::RecycleBin;

/// How a clean request removes things and reports them
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CleanOptions {
    pub policy: DeletePolicy,
    pub accounting: FreedSpaceAccounting,
    /// Measure only; nothing is removed
    pub dry_run: bool,
}

impl CleanOptions {
    pub fn from_config(config: &Config) -> Self {
        Self {
            policy: config.bulk_delete,
            accounting: config.freed_space,
            dry_run: false,
        }
    }
}

/// Outcome of cleaning one category
#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CategoryClean {
    /// The category's roots were attempted. Partial failures do not clear it.
    pub success: bool,
    pub freed_space: u64,
    #[serde(skip_serializing_if = "is_zero")]
    pub removed: usize,
    #[serde(skip_serializing_if = "is_zero")]
    pub failed: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

fn is_zero(n: &usize) -> bool {
    *n == 0
}

impl CategoryClean {
    fn ok(freed_space: u64) -> Self {
        Self {
            success: true,
            freed_space,
            ..Self::default()
        }
    }

    fn failed(error: String) -> Self {
        Self {
            success: false,
            error: Some(error),
            ..Self::default()
        }
    }
}

/// Category -> clean outcome
pub type CleanResult = BTreeMap<String, CategoryClean>;

/// Deletes category contents best-effort.
///
/// Categories are cleaned one after another. A root that was already
/// cleaned earlier in the same request (directly or through a parent) is
/// skipped, so overlapping categories never double-count freed space.
pub struct ReclaimEngine<'a> {
    pub catalog: &'a Catalog,
    pub fs: &'a dyn Filesystem,
    pub recycle: &'a dyn RecycleBin,
    pub config: &'a Config,
    pub options: CleanOptions,
}

/// Tally for one root
#[derive(Debug, Default)]
struct RootTally {
    freed: u64,
    removed: usize,
    failed: usize,
}

enum RootState {
    Missing,
    Inaccessible(String),
    Ready(Vec<PathBuf>),
}

impl<'a> ReclaimEngine<'a> {
    pub fn new(catalog: &'a Catalog, fs: &'a dyn Filesystem, recycle: &'a dyn RecycleBin, config: &'a Config) -> Self {
        Self {
            catalog,
            fs,
            recycle,
            config,
            options: CleanOptions::from_config(config),
        }
    }

    pub fn with_options(mut self, options: CleanOptions) -> Self {
        self.options = options;
        self
    }

    /// Clean every requested category. Always returns an entry for each one;
    /// an unknown category is a no-op reporting zero bytes.
    pub fn clean(&self, categories: &[String], progress: Option<&dyn Fn(&str, &CategoryClean)>) -> CleanResult {
        let mut result = CleanResult::new();
        let mut cleaned_roots: Vec<PathBuf> = Vec::new();

        for name in categories {
            if result.contains_key(name) {
                continue;
            }
            let outcome = match self.catalog.get(name) {
                None => {
                    tracing::debug!(category = %name, "unknown category, nothing to clean");
                    CategoryClean::ok(0)
                }
                Some(spec) => match spec.kind {
                    CategoryKind::Recycle => self.clean_recycle(),
                    CategoryKind::Walk => self.clean_category(spec, &mut cleaned_roots),
                },
            };

            tracing::info!(
                category = %name,
                success = outcome.success,
                freed = outcome.freed_space,
                removed = outcome.removed,
                failed = outcome.failed,
                dry_run = self.options.dry_run,
                "cleaned"
            );
            if let Some(report) = progress {
                report(name, &outcome);
            }
            result.insert(name.clone(), outcome);
        }

        result
    }

    /// Clean one category outside a batch request, e.g. a browser's cache
    /// directories built on the fly
    pub fn clean_spec(&self, spec: &CategorySpec) -> CategoryClean {
        match spec.kind {
            CategoryKind::Recycle => self.clean_recycle(),
            CategoryKind::Walk => self.clean_category(spec, &mut Vec::new()),
        }
    }

    fn clean_recycle(&self) -> CategoryClean {
        let size = match self.recycle.size() {
            Ok(size) => size,
            Err(e) => {
                tracing::warn!(error = %e, "recycle bin size unavailable");
                0
            }
        };
        if self.options.dry_run {
            return CategoryClean::ok(size);
        }
        match self.recycle.empty() {
            Ok(()) => CategoryClean::ok(size),
            Err(e) => {
                tracing::warn!(error = %e, "emptying the recycle bin failed");
                CategoryClean::failed(format!("Emptying the recycle bin failed: {}", e))
            }
        }
    }

    fn clean_category(&self, spec: &CategorySpec, cleaned_roots: &mut Vec<PathBuf>) -> CategoryClean {
        let mut outcome = CategoryClean::ok(0);
        let mut attempted = false;
        let mut blocked: Option<String> = None;

        for root in spec.resolve_roots(self.fs) {
            if safety::is_protected(&root) {
                tracing::warn!(category = %spec.name, root = %root.display(), "refusing to clean protected root");
                blocked = Some(format!("Refusing to clean protected path: '{}'", root.display()));
                continue;
            }
            if cleaned_roots.iter().any(|done| catalog::nests(&root, done)) {
                tracing::debug!(category = %spec.name, root = %root.display(), "root already cleaned in this request");
                attempted = true;
                continue;
            }

            match self.root_state(&root) {
                RootState::Missing => {}
                RootState::Inaccessible(reason) => {
                    tracing::warn!(category = %spec.name, root = %root.display(), %reason, "root inaccessible");
                    blocked = Some(reason);
                }
                RootState::Ready(children) => {
                    attempted = true;
                    let tally = self.clean_root(spec, &children);
                    outcome.freed_space += tally.freed;
                    outcome.removed += tally.removed;
                    outcome.failed += tally.failed;
                    cleaned_roots.push(root);
                }
            }
        }

        if let Some(reason) = blocked {
            if !attempted {
                return CategoryClean::failed(reason);
            }
        }
        outcome
    }

    fn root_state(&self, root: &Path) -> RootState {
        match self.fs.stat_root(root) {
            Ok(meta) if meta.is_dir() => match self.fs.read_dir(root) {
                Ok(children) => RootState::Ready(children),
                Err(e) => RootState::Inaccessible(PadmaError::from_io(root, e).to_string()),
            },
            Ok(_) => RootState::Missing,
            Err(e) if e.kind() == io::ErrorKind::NotFound => RootState::Missing,
            Err(e) => RootState::Inaccessible(PadmaError::from_io(root, e).to_string()),
        }
    }

    fn clean_root(&self, spec: &CategorySpec, children: &[PathBuf]) -> RootTally {
        let mut tally = RootTally::default();

        for child in children {
            if self.config.is_excluded(child) {
                tracing::debug!(path = %child.display(), "excluded by config");
                continue;
            }
            let meta = match self.fs.stat(child) {
                Ok(meta) => meta,
                Err(e) => {
                    tracing::debug!(path = %child.display(), error = %e, "skipping entry");
                    tally.failed += 1;
                    continue;
                }
            };

            let before = self.measure(child, &meta, spec.max_depth);
            if self.options.dry_run {
                tally.freed += before;
                tally.removed += 1;
                continue;
            }

            match self.remove(child, &meta) {
                Ok(()) => {
                    tally.freed += before;
                    tally.removed += 1;
                }
                Err(e) => {
                    tracing::debug!(path = %child.display(), error = %e, "could not remove entry");
                    tally.failed += 1;
                    tally.freed += match self.options.accounting {
                        FreedSpaceAccounting::Optimistic => before,
                        FreedSpaceAccounting::Verified if meta.is_dir() => {
                            let after = walker::walk(self.fs, child, &self.child_walk(spec.max_depth)).total_size;
                            before.saturating_sub(after)
                        }
                        FreedSpaceAccounting::Verified => 0,
                    };
                }
            }
        }

        tally
    }

    /// Size of a direct child of a root as the scanner sees it: a
    /// directory's contents are counted down to the category's depth
    fn measure(&self, path: &Path, meta: &EntryMeta, max_depth: u32) -> u64 {
        match meta.kind {
            EntryKind::File => meta.len,
            EntryKind::Dir if max_depth > 0 => walker::walk(self.fs, path, &self.child_walk(max_depth)).total_size,
            _ => 0,
        }
    }

    fn child_walk(&self, max_depth: u32) -> WalkOptions {
        WalkOptions::new(max_depth.saturating_sub(1))
    }

    fn remove(&self, path: &Path, meta: &EntryMeta) -> io::Result<()> {
        match self.options.policy {
            DeletePolicy::Trash => self.fs.move_to_trash(path),
            DeletePolicy::Permanent => match meta.kind {
                EntryKind::Dir => match self.fs.remove_dir_all(path) {
                    Ok(()) => Ok(()),
                    // something inside is locked; take what we can
                    Err(e) if fs::is_transient(&e) => {
                        purge_dir(self.fs, path);
                        Err(e)
                    }
                    Err(e) => Err(e),
                },
                _ => self.fs.remove_file(path),
            },
        }
    }
}

/// Remove everything removable below `dir`, then `dir` itself if possible
fn purge_dir(fs: &dyn Filesystem, dir: &Path) {
    let Ok(children) = fs.read_dir(dir) else {
        return;
    };
    for child in children {
        match fs.stat(&child) {
            Ok(meta) if meta.is_dir() => purge_dir(fs, &child),
            Ok(_) => {
                if let Err(e) = fs.remove_file(&child) {
                    tracing::debug!(path = %child.display(), error = %e, "left in place");
                }
            }
            Err(_) => {}
        }
    }
    let _ = fs.remove_dir_all(dir);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::fs::LocalFs;
    use crate::common::locations::Locations;
    use crate::scanner::catalog::RootSpec;
    use tempfile::TempDir;

    struct NoBin;

    impl RecycleBin for NoBin {
        fn size(&self) -> anyhow::Result<u64> {
            Ok(0)
        }

        fn empty(&self) -> anyhow::Result<()> {
            Ok(())
        }
    }

    fn catalog_with(dir: &TempDir, name: &str, roots: Vec<PathBuf>, max_depth: u32) -> Catalog {
        let mut catalog = Catalog::builtin(&Locations::rooted_at(dir.path()));
        catalog.insert(CategorySpec {
            name: name.to_string(),
            description: String::new(),
            kind: CategoryKind::Walk,
            max_depth,
            roots: roots.into_iter().map(RootSpec::Path).collect(),
            user_defined: true,
        });
        catalog
    }

    fn write(path: &Path, len: usize) {
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, vec![0u8; len]).unwrap();
    }

    #[test]
    fn test_dry_run_keeps_files() {
        let dir = TempDir::new().unwrap();
        let root = dir.path().join("junk");
        write(&root.join("a.bin"), 300);
        write(&root.join("sub/b.bin"), 200);

        let catalog = catalog_with(&dir, "junk", vec![root.clone()], 3);
        let config = Config::default();
        let mut options = CleanOptions::from_config(&config);
        options.dry_run = true;

        let result = ReclaimEngine::new(&catalog, &LocalFs, &NoBin, &config)
            .with_options(options)
            .clean(&["junk".to_string()], None);
        assert_eq!(result["junk"].freed_space, 500);
        assert!(root.join("a.bin").exists());
    }

    #[test]
    fn test_root_itself_is_kept() {
        let dir = TempDir::new().unwrap();
        let root = dir.path().join("junk");
        write(&root.join("a.bin"), 10);

        let catalog = catalog_with(&dir, "junk", vec![root.clone()], 3);
        let config = Config::default();
        let result = ReclaimEngine::new(&catalog, &LocalFs, &NoBin, &config).clean(&["junk".to_string()], None);
        assert!(result["junk"].success);
        assert_eq!(result["junk"].removed, 1);
        assert!(root.is_dir());
        assert!(!root.join("a.bin").exists());
    }

    #[test]
    fn test_excluded_entries_survive() {
        let dir = TempDir::new().unwrap();
        let root = dir.path().join("junk");
        write(&root.join("keep-me.bin"), 10);
        write(&root.join("drop.bin"), 20);

        let catalog = catalog_with(&dir, "junk", vec![root.clone()], 3);
        let mut config = Config::default();
        config.exclude_paths.push("keep-me".into());
        let result = ReclaimEngine::new(&catalog, &LocalFs, &NoBin, &config).clean(&["junk".to_string()], None);
        assert_eq!(result["junk"].freed_space, 20);
        assert!(root.join("keep-me.bin").exists());
    }

    #[test]
    fn test_protected_root_fails() {
        let dir = TempDir::new().unwrap();
        let home = dirs::home_dir().unwrap();
        let catalog = catalog_with(&dir, "home", vec![home.clone()], 1);
        let config = Config::default();
        let mut options = CleanOptions::from_config(&config);
        options.dry_run = true;

        let result = ReclaimEngine::new(&catalog, &LocalFs, &NoBin, &config)
            .with_options(options)
            .clean(&["home".to_string()], None);
        assert!(!result["home"].success);
        assert_eq!(result["home"].freed_space, 0);
        assert!(result["home"].error.is_some());
    }

    #[test]
    fn test_recycle_clean_reports_bin_size() {
        struct Bin;
        impl RecycleBin for Bin {
            fn size(&self) -> anyhow::Result<u64> {
                Ok(777)
            }
            fn empty(&self) -> anyhow::Result<()> {
                Ok(())
            }
        }
        struct StuckBin;
        impl RecycleBin for StuckBin {
            fn size(&self) -> anyhow::Result<u64> {
                Ok(777)
            }
            fn empty(&self) -> anyhow::Result<()> {
                anyhow::bail!("shell refused")
            }
        }

        let dir = TempDir::new().unwrap();
        let catalog = Catalog::builtin(&Locations::rooted_at(dir.path()));
        let config = Config::default();

        let result = ReclaimEngine::new(&catalog, &LocalFs, &Bin, &config).clean(&["recycle".to_string()], None);
        assert_eq!(result["recycle"], CategoryClean::ok(777));

        let result = ReclaimEngine::new(&catalog, &LocalFs, &StuckBin, &config).clean(&["recycle".to_string()], None);
        assert!(!result["recycle"].success);
        assert_eq!(result["recycle"].freed_space, 0);
    }
}
