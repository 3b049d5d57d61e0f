pub mod catalog;
pub mod disk;
pub mod walker;

use rayon::prelude::*;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::PathBuf;

use crate::common::fs::Filesystem;
use crate::system::recycle::RecycleBin;
use catalog::{Catalog, CategoryKind};
use walker::{CancelToken, WalkOptions, WalkResult};

pub use catalog::{CategorySpec, RootOverlap, RootSpec};
pub use disk::{analyze, DiskItem};
pub use walker::{largest_files, walk, FileEntry};

/// What one category currently holds
#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
pub struct CategoryScan {
    pub size: u64,
    pub files: Vec<PathBuf>,
    #[serde(skip_serializing_if = "is_zero")]
    pub skipped: usize,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub cancelled: bool,
}

fn is_zero(n: &usize) -> bool {
    *n == 0
}

impl From<WalkResult> for CategoryScan {
    fn from(walk: WalkResult) -> Self {
        Self {
            size: walk.total_size,
            files: walk.files,
            skipped: walk.skipped,
            cancelled: walk.cancelled,
        }
    }
}

/// Category -> contents. Built fresh by every scan.
pub type ScanResult = BTreeMap<String, CategoryScan>;

/// Called once per category as soon as its scan finishes
pub type ScanProgress<'a> = &'a (dyn Fn(&str, &CategoryScan) + Sync);

/// Measures categories. Read-only; categories are scanned in parallel.
pub struct CategoryScanner<'a> {
    pub catalog: &'a Catalog,
    pub fs: &'a dyn Filesystem,
    pub recycle: &'a dyn RecycleBin,
    pub cancel: Option<CancelToken>,
}

impl<'a> CategoryScanner<'a> {
    pub fn new(catalog: &'a Catalog, fs: &'a dyn Filesystem, recycle: &'a dyn RecycleBin) -> Self {
        Self {
            catalog,
            fs,
            recycle,
            cancel: None,
        }
    }

    pub fn with_cancel(mut self, token: CancelToken) -> Self {
        self.cancel = Some(token);
        self
    }

    /// Scan every requested category. Never fails: an unknown category, a
    /// missing root or an unavailable recycle bin reports `{size: 0, files: []}`.
    pub fn scan(&self, categories: &[String], progress: Option<ScanProgress<'_>>) -> ScanResult {
        let mut unique: Vec<&String> = Vec::with_capacity(categories.len());
        for name in categories {
            if !unique.contains(&name) {
                unique.push(name);
            }
        }

        unique
            .par_iter()
            .map(|name| {
                let name = name.as_str();
                let scan = self.scan_one(name);
                if let Some(report) = progress {
                    report(name, &scan);
                }
                (name.to_string(), scan)
            })
            .collect()
    }

    /// Scan a single category
    pub fn scan_one(&self, name: &str) -> CategoryScan {
        let Some(spec) = self.catalog.get(name) else {
            tracing::debug!(category = %name, "unknown category");
            return CategoryScan::default();
        };

        let scan = match spec.kind {
            CategoryKind::Recycle => match self.recycle.size() {
                Ok(size) => CategoryScan {
                    size,
                    ..CategoryScan::default()
                },
                Err(e) => {
                    tracing::warn!(category = %name, error = %e, "recycle bin size unavailable");
                    CategoryScan::default()
                }
            },
            CategoryKind::Walk => {
                let mut opts = WalkOptions::new(spec.max_depth);
                opts.cancel = self.cancel.clone();
                let mut total = WalkResult::default();
                for root in spec.resolve_roots(self.fs) {
                    total.merge(walker::walk(self.fs, &root, &opts));
                }
                CategoryScan::from(total)
            }
        };

        tracing::info!(category = %name, bytes = scan.size, files = scan.files.len(), skipped = scan.skipped, "scanned");
        scan
    }
}

/// Sum of sizes across all categories of a scan
pub fn total_size(result: &ScanResult) -> u64 {
    result.values().map(|c| c.size).sum()
}
