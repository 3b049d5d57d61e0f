use std::path::{Path, PathBuf};

/// Paths that must NEVER be deleted or used as a clean root.
/// This is the safety net against a bad category definition.
#[cfg(windows)]
const PROTECTED_PATHS: &[&str] = &[
    "C:\\",
    "C:\\Windows",
    "C:\\Windows\\System32",
    "C:\\Windows\\SysWOW64",
    "C:\\Program Files",
    "C:\\Program Files (x86)",
    "C:\\ProgramData",
    "C:\\Users",
];

#[cfg(not(windows))]
const PROTECTED_PATHS: &[&str] = &[
    "/",
    "/bin",
    "/boot",
    "/dev",
    "/etc",
    "/home",
    "/lib",
    "/opt",
    "/proc",
    "/root",
    "/sbin",
    "/sys",
    "/usr",
    "/var",
    "/System",
    "/Applications",
    "/Library",
    "/Users",
    "/Volumes",
];

/// Paths under home that must never be deleted entirely
const PROTECTED_HOME_DIRS: &[&str] = &[
    "", // home dir itself
    "Desktop",
    "Documents",
    "Downloads",
    "Pictures",
    "Music",
    "Videos",
    "Movies",
    "AppData",
    "AppData/Local",
    "AppData/Roaming",
    "Library",
    ".config",
    ".local",
    ".ssh",
    ".gnupg",
];

/// Check if a path is protected and should NEVER be deleted
pub fn is_protected(path: &Path) -> bool {
    if PROTECTED_PATHS.iter().any(|p| same_path(path, Path::new(p))) {
        return true;
    }

    if let Some(home) = dirs::home_dir() {
        return is_protected_under(path, &home);
    }

    false
}

/// Check `path` against the protected subdirectories of a given home
pub fn is_protected_under(path: &Path, home: &Path) -> bool {
    PROTECTED_HOME_DIRS.iter().any(|dir| {
        let protected: PathBuf = if dir.is_empty() {
            home.to_path_buf()
        } else {
            dir.split('/').fold(home.to_path_buf(), |acc, part| acc.join(part))
        };
        same_path(path, &protected)
    })
}

/// Component-wise comparison, ignoring trailing separators; case-insensitive
/// on Windows
fn same_path(a: &Path, b: &Path) -> bool {
    if cfg!(windows) {
        let norm = |p: &Path| {
            p.components()
                .map(|c| c.as_os_str().to_string_lossy().to_lowercase())
                .collect::<Vec<_>>()
        };
        norm(a) == norm(b)
    } else {
        a.components().eq(b.components())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[cfg(not(windows))]
    #[test]
    fn test_root_is_protected() {
        assert!(is_protected(Path::new("/")));
        assert!(is_protected(Path::new("/usr/")));
        assert!(!is_protected(Path::new("/tmp/somefile")));
        assert!(!is_protected(Path::new("/var/tmp")));
    }

    #[cfg(windows)]
    #[test]
    fn test_windows_dirs_protected() {
        assert!(is_protected(Path::new("C:\\Windows")));
        assert!(is_protected(Path::new("c:\\windows\\")));
        assert!(!is_protected(Path::new("C:\\Windows\\Temp")));
        assert!(!is_protected(Path::new("C:\\Windows\\Prefetch")));
    }

    #[test]
    fn test_home_subdirs_protected() {
        let home = Path::new("/home/someone");
        assert!(is_protected_under(home, home));
        assert!(is_protected_under(&home.join("Documents"), home));
        assert!(is_protected_under(&home.join("AppData").join("Local"), home));
        assert!(is_protected_under(&home.join(".ssh"), home));
        assert!(!is_protected_under(&home.join("AppData/Local/Temp"), home));
        assert!(!is_protected_under(&home.join("Documents/report.pdf"), home));
    }
}
