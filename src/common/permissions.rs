use std::path::Path;

/// Directories that only an elevated (administrator) process may modify
#[cfg(windows)]
const ELEVATED_PATHS: &[&str] = &["\\windows\\", "\\program files", "\\programdata\\"];

#[cfg(not(windows))]
const ELEVATED_PATHS: &[&str] = &["/var/", "/usr/", "/etc/", "/private/", "/library/"];

/// Check if a path likely requires administrator rights to modify
pub fn requires_elevation(path: &Path) -> bool {
    let mut path_str = path.to_string_lossy().to_lowercase();
    path_str.push(std::path::MAIN_SEPARATOR);
    if cfg!(windows) {
        // drive letter varies, match after it
        ELEVATED_PATHS.iter().any(|p| path_str.contains(p))
    } else {
        ELEVATED_PATHS.iter().any(|p| path_str.starts_with(p))
    }
}

/// Get a helpful message for permission issues
pub fn permission_hint(path: &Path) -> String {
    if requires_elevation(path) {
        "This location is owned by the system. Run Padma as administrator to clean it.".to_string()
    } else {
        format!(
            "Check permissions for '{}'. The file may be open in another program.",
            path.display()
        )
    }
}
