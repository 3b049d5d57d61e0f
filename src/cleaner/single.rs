use serde::Serialize;
use std::path::Path;

use crate::common::config::{Config, DeletePolicy};
use crate::common::errors::PadmaError;
use crate::common::fs::{self, Filesystem};
use crate::common::safety;

/// Result of deleting one user-chosen path
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct DeleteOutcome {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl DeleteOutcome {
    fn ok() -> Self {
        Self {
            success: true,
            error: None,
        }
    }

    fn err(error: PadmaError) -> Self {
        Self {
            success: false,
            error: Some(error.to_string()),
        }
    }
}

/// Remove a single file or directory, e.g. one picked from the
/// largest-files list
pub fn delete_one(fs: &dyn Filesystem, config: &Config, path: &Path, policy: DeletePolicy) -> DeleteOutcome {
    match try_delete(fs, config, path, policy) {
        Ok(()) => {
            tracing::info!(path = %path.display(), ?policy, "deleted");
            DeleteOutcome::ok()
        }
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "delete failed");
            DeleteOutcome::err(e)
        }
    }
}

fn try_delete(fs: &dyn Filesystem, config: &Config, path: &Path, policy: DeletePolicy) -> Result<(), PadmaError> {
    if safety::is_protected(path) || config.is_excluded(path) {
        return Err(PadmaError::Protected {
            path: path.to_path_buf(),
        });
    }

    let meta = fs.stat(path).map_err(|e| PadmaError::from_io(path, e))?;

    let result = match policy {
        DeletePolicy::Trash => fs.move_to_trash(path),
        DeletePolicy::Permanent => fs::remove_entry(fs, path, &meta),
    };
    result.map_err(|e| PadmaError::from_io(path, e))
}
