use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use super::catalog;
use super::locator::{self, BrowserRecord};
use crate::cleaner::engine::ReclaimEngine;
use crate::common::config::DeletePolicy;
use crate::common::errors::PadmaError;
use crate::scanner::catalog::{CategoryKind, CategorySpec, RootSpec};
use crate::system::process::{running_names, ProcessLister};

/// Which kinds of browser data to remove
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BrowserCleanOptions {
    #[serde(default)]
    pub cache: bool,
    #[serde(default)]
    pub cookies: bool,
    #[serde(default)]
    pub history: bool,
}

#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct BrowserCleanResult {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub freed_space: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl BrowserCleanResult {
    fn refused(err: PadmaError) -> Self {
        Self {
            success: false,
            freed_space: None,
            error: Some(err.to_string()),
        }
    }
}

/// SQLite side files that go with a database
const SQLITE_COMPANIONS: &[&str] = &["-journal", "-wal", "-shm"];

/// Remove a browser's cache, cookies and/or history.
///
/// Refuses while the browser is running: its databases are held open and a
/// half-deleted profile is worse than none.
pub fn clean_browser(
    engine: &ReclaimEngine<'_>,
    processes: &dyn ProcessLister,
    name: &str,
    options: BrowserCleanOptions,
) -> BrowserCleanResult {
    let fs = engine.fs;
    let loc = engine.catalog.locations();

    let record = catalog::find(name)
        .and_then(|spec| locator::locate(fs, loc, spec, &running_names(processes)))
        .filter(|r| r.is_installed);
    let Some(record) = record else {
        return BrowserCleanResult::refused(PadmaError::BrowserNotFound { name: name.to_string() });
    };
    if record.is_running {
        return BrowserCleanResult::refused(PadmaError::BrowserRunning {
            display_name: record.display_name.clone(),
        });
    }

    let mut freed = 0u64;
    let mut failures = Vec::new();

    if options.cache {
        let outcome = engine.clean_spec(&cache_spec(&record));
        freed += outcome.freed_space;
        if let Some(err) = outcome.error {
            failures.push(err);
        }
    }
    if options.cookies {
        if let Some(path) = &record.cookies_path {
            freed += remove_database(engine, path);
        }
    }
    if options.history {
        if let Some(path) = &record.history_path {
            freed += remove_database(engine, path);
        }
    }

    tracing::info!(browser = %record.name, freed, failures = failures.len(), "browser cleaned");
    BrowserCleanResult {
        success: failures.is_empty(),
        freed_space: Some(freed),
        error: (!failures.is_empty()).then(|| failures.join("; ")),
    }
}

fn cache_spec(record: &BrowserRecord) -> CategorySpec {
    CategorySpec {
        name: format!("browser-{}", record.name),
        description: format!("{} cache", record.display_name),
        kind: CategoryKind::Walk,
        max_depth: locator::CACHE_WALK_DEPTH,
        roots: record.cache_paths.iter().cloned().map(RootSpec::Path).collect(),
        user_defined: false,
    }
}

/// Delete a database file and its SQLite side files; returns bytes removed.
/// A file that is locked or already gone is left alone and not reported.
fn remove_database(engine: &ReclaimEngine<'_>, db: &Path) -> u64 {
    let mut freed = 0;
    let mut paths = vec![db.to_path_buf()];
    for suffix in SQLITE_COMPANIONS {
        let mut side = db.as_os_str().to_owned();
        side.push(suffix);
        paths.push(PathBuf::from(side));
    }

    for path in paths {
        let Ok(meta) = engine.fs.stat(&path) else {
            continue;
        };
        let result = match engine.options.policy {
            DeletePolicy::Trash => engine.fs.move_to_trash(&path),
            DeletePolicy::Permanent => engine.fs.remove_file(&path),
        };
        match result {
            Ok(()) => freed += meta.len,
            Err(e) => {
                tracing::debug!(path = %path.display(), error = %e, "browser database left in place");
            }
        }
    }
    freed
}
