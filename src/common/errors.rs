use std::path::PathBuf;
use thiserror::Error;

/// Typed errors for Padma operations.
/// `anyhow` carries context at the CLI and adapter level; these variants
/// are what operation boundaries report back to the caller.
#[derive(Debug, Error)]
pub enum PadmaError {
    /// File system operation failed
    #[error("I/O error at '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Permission denied accessing a path
    #[error("Permission denied: '{}'. {hint}", path.display())]
    PermissionDenied { path: PathBuf, hint: String },

    /// Path is on the never-delete list or excluded by config
    #[error("Refusing to delete protected path: '{}'", path.display())]
    Protected { path: PathBuf },

    /// Path does not exist
    #[error("Path does not exist: '{}'", path.display())]
    NotFound { path: PathBuf },

    /// Browser name is not in the catalog or not installed
    #[error("Browser not found")]
    BrowserNotFound { name: String },

    /// Browser must be closed before its data can be removed
    #[error("{display_name} is running. Please close it first.")]
    BrowserRunning { display_name: String },

    /// An external OS utility failed or is unavailable
    #[error("{tool} failed: {message}")]
    ExternalTool { tool: String, message: String },

    /// Feature has no implementation on this platform
    #[error("{feature} is not supported on this platform")]
    Unsupported { feature: String },

    /// Configuration file is invalid
    #[error("Config error in '{}': {message}", path.display())]
    Config { path: PathBuf, message: String },
}

impl PadmaError {
    /// Classify an I/O error for a path, turning permission failures into
    /// `PermissionDenied` with a hint
    pub fn from_io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        let path = path.into();
        match source.kind() {
            std::io::ErrorKind::PermissionDenied => {
                let hint = crate::common::permissions::permission_hint(&path);
                PadmaError::PermissionDenied { path, hint }
            }
            std::io::ErrorKind::NotFound => PadmaError::NotFound { path },
            _ => PadmaError::Io { path, source },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_browser_messages() {
        let err = PadmaError::BrowserRunning {
            display_name: "Google Chrome".into(),
        };
        assert_eq!(err.to_string(), "Google Chrome is running. Please close it first.");

        let err = PadmaError::BrowserNotFound { name: "netscape".into() };
        assert_eq!(err.to_string(), "Browser not found");
    }

    #[test]
    fn test_from_io_classifies_kind() {
        let denied = std::io::Error::from(std::io::ErrorKind::PermissionDenied);
        assert!(matches!(
            PadmaError::from_io("/x", denied),
            PadmaError::PermissionDenied { .. }
        ));

        let missing = std::io::Error::from(std::io::ErrorKind::NotFound);
        assert!(matches!(PadmaError::from_io("/x", missing), PadmaError::NotFound { .. }));

        let other = std::io::Error::other("boom");
        assert!(matches!(PadmaError::from_io("/x", other), PadmaError::Io { .. }));
    }
}
