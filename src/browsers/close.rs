use serde::Serialize;
use std::time::{Duration, Instant};

use super::catalog;
use super::locator;
use crate::common::errors::PadmaError;
use crate::common::fs::Filesystem;
use crate::common::locations::Locations;
use crate::system::process::{running_names, ProcessLister};

/// How long to wait for killed browser processes to leave the process table
pub const CLOSE_WAIT: Duration = Duration::from_secs(2);

const POLL_INTERVAL: Duration = Duration::from_millis(100);

#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct BrowserCloseResult {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl BrowserCloseResult {
    fn closed() -> Self {
        Self {
            success: true,
            error: None,
        }
    }

    fn failed(error: String) -> Self {
        Self {
            success: false,
            error: Some(error),
        }
    }
}

/// Force-close an installed browser so its profile can be cleaned.
///
/// A browser that is not running counts as closed.
pub fn close_browser(
    fs: &dyn Filesystem,
    loc: &Locations,
    processes: &dyn ProcessLister,
    name: &str,
    wait: Duration,
) -> BrowserCloseResult {
    let running = running_names(processes);
    let record = catalog::find(name)
        .and_then(|spec| locator::locate(fs, loc, spec, &running))
        .filter(|r| r.is_installed);
    let Some(record) = record else {
        return BrowserCloseResult::failed(PadmaError::BrowserNotFound { name: name.to_string() }.to_string());
    };
    if !record.is_running {
        tracing::debug!(browser = %record.name, "already closed");
        return BrowserCloseResult::closed();
    }

    match processes.kill_named(&record.process_name) {
        Ok(killed) => tracing::info!(browser = %record.name, killed, "browser processes stopped"),
        Err(e) => {
            tracing::warn!(browser = %record.name, error = %e, "could not close browser");
            return BrowserCloseResult::failed(e.to_string());
        }
    }

    let deadline = Instant::now() + wait;
    loop {
        let still_running = running_names(processes)
            .iter()
            .any(|p| p.eq_ignore_ascii_case(&record.process_name));
        if !still_running {
            return BrowserCloseResult::closed();
        }
        if Instant::now() >= deadline {
            return BrowserCloseResult::failed(
                PadmaError::BrowserRunning {
                    display_name: record.display_name.clone(),
                }
                .to_string(),
            );
        }
        std::thread::sleep(POLL_INTERVAL);
    }
}
