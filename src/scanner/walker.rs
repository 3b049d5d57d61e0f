use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;
use walkdir::WalkDir;

use crate::common::fs::{EntryKind, Filesystem};

/// Shared flag that aborts an in-flight walk between directory visits
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Bounds for a single walk
#[derive(Debug, Clone, Default)]
pub struct WalkOptions {
    /// Deepest listing level whose files are counted. Children of the root
    /// are level 0.
    pub max_depth: u32,
    pub cancel: Option<CancelToken>,
    pub deadline: Option<Instant>,
}

impl WalkOptions {
    pub fn new(max_depth: u32) -> Self {
        Self {
            max_depth,
            ..Self::default()
        }
    }

    pub fn with_cancel(mut self, token: CancelToken) -> Self {
        self.cancel = Some(token);
        self
    }

    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    fn should_stop(&self) -> bool {
        self.cancel.as_ref().is_some_and(|c| c.is_cancelled())
            || self.deadline.is_some_and(|d| Instant::now() >= d)
    }
}

/// Totals gathered by one walk
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WalkResult {
    pub total_size: u64,
    /// Regular files in directory-listing order
    pub files: Vec<PathBuf>,
    /// Entries dropped because they could not be listed or stat'ed
    pub skipped: usize,
    /// The walk stopped early on a cancel or deadline
    pub cancelled: bool,
}

impl WalkResult {
    /// Fold another root's totals into this one
    pub fn merge(&mut self, other: WalkResult) {
        self.total_size += other.total_size;
        self.files.extend(other.files);
        self.skipped += other.skipped;
        self.cancelled |= other.cancelled;
    }
}

/// Recursively total the regular files under `root`.
///
/// Ignore-and-continue: any entry that cannot be listed or stat'ed is
/// counted in `skipped` and contributes nothing; siblings are still
/// visited. A root that is missing or not a directory yields an empty
/// result. A symlinked root is followed once; symlinks below it are
/// neither sized nor followed.
pub fn walk(fs: &dyn Filesystem, root: &Path, opts: &WalkOptions) -> WalkResult {
    let mut result = WalkResult::default();

    match fs.stat_root(root) {
        Ok(meta) if meta.is_dir() => walk_dir(fs, root, 0, opts, &mut result),
        Ok(_) => {}
        Err(e) => {
            tracing::debug!(root = %root.display(), error = %e, "walk root unavailable");
        }
    }

    result
}

fn walk_dir(fs: &dyn Filesystem, dir: &Path, depth: u32, opts: &WalkOptions, acc: &mut WalkResult) {
    if depth > opts.max_depth {
        return;
    }
    if opts.should_stop() {
        acc.cancelled = true;
        return;
    }

    let children = match fs.read_dir(dir) {
        Ok(children) => children,
        Err(e) => {
            tracing::debug!(dir = %dir.display(), error = %e, "skipping unreadable directory");
            acc.skipped += 1;
            return;
        }
    };

    for child in children {
        if acc.cancelled {
            return;
        }
        let meta = match fs.stat(&child) {
            Ok(meta) => meta,
            Err(e) => {
                tracing::debug!(path = %child.display(), error = %e, "skipping entry");
                acc.skipped += 1;
                continue;
            }
        };

        match meta.kind {
            EntryKind::File => {
                acc.total_size += meta.len;
                acc.files.push(child);
            }
            EntryKind::Dir => walk_dir(fs, &child, depth + 1, opts, acc),
            EntryKind::Other => {}
        }
    }
}

/// A single file found by the largest-files search
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct FileEntry {
    pub path: PathBuf,
    pub size: u64,
}

/// Find the biggest files under `root`, largest first.
///
/// Hidden directories and `node_modules` are not descended into.
pub fn largest_files(root: &Path, limit: usize, min_size: u64, max_depth: Option<usize>) -> Vec<FileEntry> {
    let mut results = Vec::new();

    if !root.exists() {
        return results;
    }

    let mut walker = WalkDir::new(root).follow_links(false);
    if let Some(depth) = max_depth {
        walker = walker.max_depth(depth);
    }

    for entry in walker
        .into_iter()
        .filter_entry(|e| {
            if e.depth() == 0 {
                return true;
            }
            let name = e.file_name().to_string_lossy();
            !name.starts_with('.') && name != "node_modules"
        })
        .filter_map(|e| e.ok())
    {
        if entry.file_type().is_file() {
            if let Ok(metadata) = entry.metadata() {
                let size = metadata.len();
                if size >= min_size {
                    results.push(FileEntry {
                        path: entry.path().to_path_buf(),
                        size,
                    });
                }
            }
        }
    }

    results.sort_by(|a, b| b.size.cmp(&a.size).then_with(|| a.path.cmp(&b.path)));
    results.truncate(limit);
    results
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::fs::{EntryMeta, LocalFs};
    use std::io;
    use tempfile::TempDir;

    fn write(path: &Path, len: usize) {
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, vec![0u8; len]).unwrap();
    }

    #[test]
    fn test_missing_root_is_empty() {
        let dir = TempDir::new().unwrap();
        let result = walk(&LocalFs, &dir.path().join("nope"), &WalkOptions::new(5));
        assert_eq!(result, WalkResult::default());
    }

    #[test]
    fn test_file_root_is_empty() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("f.bin");
        write(&file, 10);
        let result = walk(&LocalFs, &file, &WalkOptions::new(5));
        assert_eq!(result.total_size, 0);
        assert!(result.files.is_empty());
    }

    #[cfg(unix)]
    #[test]
    fn test_symlinked_root_followed_once() {
        let dir = TempDir::new().unwrap();
        let real = dir.path().join("real");
        write(&real.join("a.bin"), 4096);
        let elsewhere = dir.path().join("elsewhere");
        write(&elsewhere.join("b.bin"), 100);
        std::os::unix::fs::symlink(&elsewhere, real.join("inner-link")).unwrap();
        let link = dir.path().join("link");
        std::os::unix::fs::symlink(&real, &link).unwrap();

        let result = walk(&LocalFs, &link, &WalkOptions::new(5));
        assert_eq!(result.total_size, 4096);
        assert_eq!(result.files, vec![link.join("a.bin")]);
    }

    #[test]
    fn test_depth_levels() {
        let dir = TempDir::new().unwrap();
        write(&dir.path().join("l0.bin"), 1);
        write(&dir.path().join("a/l1.bin"), 10);
        write(&dir.path().join("a/b/l2.bin"), 100);
        write(&dir.path().join("a/b/c/l3.bin"), 1000);

        let sizes: Vec<u64> = (0..4)
            .map(|d| walk(&LocalFs, dir.path(), &WalkOptions::new(d)).total_size)
            .collect();
        assert_eq!(sizes, vec![1, 11, 111, 1111]);
    }

    #[test]
    fn test_precancelled_walk_stops() {
        let dir = TempDir::new().unwrap();
        write(&dir.path().join("x.bin"), 5);

        let token = CancelToken::new();
        token.cancel();
        let result = walk(&LocalFs, dir.path(), &WalkOptions::new(3).with_cancel(token));
        assert!(result.cancelled);
        assert_eq!(result.total_size, 0);
    }

    #[test]
    fn test_expired_deadline_stops() {
        let dir = TempDir::new().unwrap();
        write(&dir.path().join("x.bin"), 5);

        let opts = WalkOptions::new(3).with_deadline(Instant::now());
        assert!(walk(&LocalFs, dir.path(), &opts).cancelled);
    }

    /// Lists `a.bin`, `locked.bin` and `gone/`; only `a.bin` can be stat'ed
    /// besides the root, and `gone/` fails to list.
    struct FlakyFs;

    impl Filesystem for FlakyFs {
        fn read_dir(&self, path: &Path) -> io::Result<Vec<PathBuf>> {
            if path == Path::new("/root") {
                Ok(vec!["/root/a.bin".into(), "/root/locked.bin".into(), "/root/gone".into()])
            } else {
                Err(io::ErrorKind::NotFound.into())
            }
        }

        fn stat(&self, path: &Path) -> io::Result<EntryMeta> {
            match path.to_str() {
                Some("/root") | Some("/root/gone") => Ok(EntryMeta { kind: EntryKind::Dir, len: 0 }),
                Some("/root/a.bin") => Ok(EntryMeta { kind: EntryKind::File, len: 42 }),
                _ => Err(io::ErrorKind::PermissionDenied.into()),
            }
        }

        fn remove_file(&self, _: &Path) -> io::Result<()> {
            Ok(())
        }

        fn remove_dir_all(&self, _: &Path) -> io::Result<()> {
            Ok(())
        }

        fn move_to_trash(&self, _: &Path) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_inaccessible_entries_are_skipped() {
        let result = walk(&FlakyFs, Path::new("/root"), &WalkOptions::new(3));
        assert_eq!(result.total_size, 42);
        assert_eq!(result.files, vec![PathBuf::from("/root/a.bin")]);
        assert_eq!(result.skipped, 2);
        assert!(!result.cancelled);
    }

    #[test]
    fn test_largest_files() {
        let dir = TempDir::new().unwrap();
        write(&dir.path().join("small.bin"), 10);
        write(&dir.path().join("big.bin"), 5000);
        write(&dir.path().join("sub/mid.bin"), 800);
        write(&dir.path().join(".hidden/huge.bin"), 9000);
        write(&dir.path().join("node_modules/dep.bin"), 9000);

        let found = largest_files(dir.path(), 2, 100, None);
        let names: Vec<_> = found
            .iter()
            .map(|f| f.path.file_name().unwrap().to_string_lossy().to_string())
            .collect();
        assert_eq!(names, vec!["big.bin", "mid.bin"]);
        assert_eq!(found[0].size, 5000);
    }
}
