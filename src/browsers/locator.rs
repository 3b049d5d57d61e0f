use serde::Serialize;
use std::path::PathBuf;

use super::catalog::{self, BrowserSpec};
use crate::common::fs::Filesystem;
use crate::common::locations::Locations;
use crate::scanner::walker::{self, WalkOptions};
use crate::system::process::{running_names, ProcessLister};

/// Rough bytes per cookie row in the cookie database
pub const COOKIE_RECORD_BYTES: u64 = 200;

/// Rough bytes per visit row in the history database
pub const HISTORY_RECORD_BYTES: u64 = 400;

/// Depth the cache directories are sized to, same as the browser categories
pub const CACHE_WALK_DEPTH: u32 = 3;

/// What Padma knows about one installed browser. Rebuilt on every discovery.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct BrowserRecord {
    pub name: String,
    pub display_name: String,
    pub process_name: String,
    pub profile: String,
    pub cache_paths: Vec<PathBuf>,
    pub cookies_path: Option<PathBuf>,
    pub history_path: Option<PathBuf>,
    pub is_installed: bool,
    pub is_running: bool,
    pub cache_size: u64,
    /// Estimated from the database file size, not counted
    pub cookie_count: u64,
    /// Estimated from the database file size, not counted
    pub history_count: u64,
}

/// Look up one browser. `None` when no profile can be identified.
pub fn locate(fs: &dyn Filesystem, loc: &Locations, spec: &BrowserSpec, running: &[String]) -> Option<BrowserRecord> {
    let profile = spec.default_profile(fs, loc)?;
    let cache_paths = spec.profile_cache_dirs(&profile, loc);
    let cookies_path = first_existing(fs, spec.cookie_candidates(&profile, loc));
    let history_path = first_existing(fs, spec.history_candidates(&profile, loc));

    let is_installed = fs.exists(&spec.data_root(loc).join(&profile))
        || cookies_path.is_some()
        || history_path.is_some()
        || cache_paths.iter().any(|p| fs.exists(p));

    Some(BrowserRecord {
        name: spec.name.to_string(),
        display_name: spec.display_name.to_string(),
        process_name: spec.process_name.to_string(),
        profile,
        cache_paths,
        cookies_path,
        history_path,
        is_installed,
        is_running: running.iter().any(|p| p.eq_ignore_ascii_case(spec.process_name)),
        cache_size: 0,
        cookie_count: 0,
        history_count: 0,
    })
}

/// Every installed browser from the catalog, in catalog order
pub fn discover(fs: &dyn Filesystem, loc: &Locations, processes: &dyn ProcessLister) -> Vec<BrowserRecord> {
    let running = running_names(processes);
    catalog::all()
        .iter()
        .filter_map(|spec| locate(fs, loc, spec, &running))
        .filter(|record| record.is_installed)
        .collect()
}

/// Fill in cache size and the estimated cookie/history counts
pub fn analyze(fs: &dyn Filesystem, record: &BrowserRecord) -> BrowserRecord {
    let opts = WalkOptions::new(CACHE_WALK_DEPTH);
    let cache_size = record
        .cache_paths
        .iter()
        .map(|p| walker::walk(fs, p, &opts).total_size)
        .sum();
    let file_len = |path: &Option<PathBuf>| {
        path.as_ref()
            .and_then(|p| fs.stat(p).ok())
            .filter(|m| m.is_file())
            .map(|m| m.len)
            .unwrap_or(0)
    };

    BrowserRecord {
        cache_size,
        cookie_count: file_len(&record.cookies_path) / COOKIE_RECORD_BYTES,
        history_count: file_len(&record.history_path) / HISTORY_RECORD_BYTES,
        ..record.clone()
    }
}

fn first_existing(fs: &dyn Filesystem, candidates: Vec<PathBuf>) -> Option<PathBuf> {
    candidates.into_iter().find(|p| fs.exists(p))
}
