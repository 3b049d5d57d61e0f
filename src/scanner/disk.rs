use serde::Serialize;
use std::path::{Path, PathBuf};

use super::walker::{self, WalkOptions};
use crate::common::fs::{EntryKind, Filesystem};

/// Entries read per directory; the rest of a huge directory is ignored
const MAX_ENTRIES_READ: usize = 50;

/// Children kept per directory after sorting by size
const MAX_CHILDREN_KEPT: usize = 20;

/// Depth used to size directories below the tree's last expanded level
const LEAF_WALK_DEPTH: u32 = 10;

/// A node of the disk usage tree
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DiskItem {
    pub name: String,
    pub path: PathBuf,
    pub size: u64,
    pub is_directory: bool,
    pub children: Vec<DiskItem>,
}

/// Build a size tree under `root`, expanding `depth` levels of directories.
///
/// Returns `None` when `root` cannot be stat'ed. Unreadable children are
/// omitted.
pub fn analyze(fs: &dyn Filesystem, root: &Path, depth: u32) -> Option<DiskItem> {
    let meta = fs.stat_root(root).ok()?;
    let name = root
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| root.display().to_string());

    Some(match meta.kind {
        EntryKind::File => DiskItem {
            name,
            path: root.to_path_buf(),
            size: meta.len,
            is_directory: false,
            children: Vec::new(),
        },
        EntryKind::Dir => analyze_dir(fs, root, name, depth),
        EntryKind::Other => DiskItem {
            name,
            path: root.to_path_buf(),
            size: 0,
            is_directory: false,
            children: Vec::new(),
        },
    })
}

fn analyze_dir(fs: &dyn Filesystem, dir: &Path, name: String, depth: u32) -> DiskItem {
    let entries = match fs.read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            tracing::debug!(dir = %dir.display(), error = %e, "cannot list directory");
            Vec::new()
        }
    };

    let mut children = Vec::new();
    for entry in entries.into_iter().take(MAX_ENTRIES_READ) {
        let Ok(meta) = fs.stat(&entry) else {
            continue;
        };
        let child_name = entry
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();

        match meta.kind {
            EntryKind::File => children.push(DiskItem {
                name: child_name,
                path: entry,
                size: meta.len,
                is_directory: false,
                children: Vec::new(),
            }),
            EntryKind::Dir if depth > 0 => {
                children.push(analyze_dir(fs, &entry, child_name, depth - 1));
            }
            EntryKind::Dir => {
                let size = walker::walk(fs, &entry, &WalkOptions::new(LEAF_WALK_DEPTH)).total_size;
                children.push(DiskItem {
                    name: child_name,
                    path: entry,
                    size,
                    is_directory: true,
                    children: Vec::new(),
                });
            }
            EntryKind::Other => {}
        }
    }

    let size = children.iter().map(|c| c.size).sum();
    children.sort_by(|a, b| b.size.cmp(&a.size).then_with(|| a.name.cmp(&b.name)));
    children.truncate(MAX_CHILDREN_KEPT);

    DiskItem {
        name,
        path: dir.to_path_buf(),
        size,
        is_directory: true,
        children,
    }
}
