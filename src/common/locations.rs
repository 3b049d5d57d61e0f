use std::path::{Path, PathBuf};

/// Well-known per-user and system directories that category roots and
/// browser profiles are resolved against.
///
/// Built from the environment in production; tests point every field into
/// a temporary directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Locations {
    /// The user's home directory
    pub home: PathBuf,
    /// Per-user local application data (`%LOCALAPPDATA%` on Windows)
    pub local_data: PathBuf,
    /// Per-user roaming/config data (`%APPDATA%` on Windows, `~/.config` elsewhere)
    pub config_data: PathBuf,
    /// Per-user cache directory (`%LOCALAPPDATA%` on Windows, `~/.cache` elsewhere)
    pub cache_data: PathBuf,
    /// The user's temp directory (`%TEMP%`)
    pub user_temp: PathBuf,
    /// Windows system root (`%SystemRoot%`), absent on other platforms
    pub system_root: Option<PathBuf>,
}

impl Locations {
    /// Resolve from the current process environment
    pub fn from_env() -> Self {
        let home = dirs::home_dir().unwrap_or_else(std::env::temp_dir);
        let local_data = dirs::data_local_dir().unwrap_or_else(|| home.join("AppData").join("Local"));
        let config_data = dirs::config_dir().unwrap_or_else(|| home.join(".config"));
        let cache_data = dirs::cache_dir().unwrap_or_else(|| local_data.clone());
        let user_temp = std::env::var_os("TEMP")
            .map(PathBuf::from)
            .unwrap_or_else(std::env::temp_dir);

        Self {
            home,
            local_data,
            config_data,
            cache_data,
            user_temp,
            system_root: system_root(),
        }
    }

    /// All locations rooted under one directory (for tests and sandboxes)
    pub fn rooted_at(base: &Path) -> Self {
        let home = base.join("home");
        Self {
            local_data: home.join("AppData").join("Local"),
            config_data: home.join("AppData").join("Roaming"),
            cache_data: home.join("AppData").join("Local"),
            user_temp: home.join("AppData").join("Local").join("Temp"),
            system_root: Some(base.join("Windows")),
            home,
        }
    }

    /// Expand `~`, `%VAR%` and `$VAR` in a user-supplied path
    pub fn expand(&self, raw: &str) -> PathBuf {
        let mut out = String::with_capacity(raw.len());
        let mut rest = raw;

        if let Some(stripped) = rest.strip_prefix('~') {
            out.push_str(&self.home.to_string_lossy());
            rest = stripped;
        }

        while let Some(c) = rest.chars().next() {
            match c {
                '%' => {
                    if let Some(end) = rest[1..].find('%') {
                        let name = &rest[1..=end];
                        match self.lookup(name) {
                            Some(value) => out.push_str(&value),
                            None => out.push_str(&rest[..end + 2]),
                        }
                        rest = &rest[end + 2..];
                        continue;
                    }
                }
                '$' => {
                    let name_len = rest[1..]
                        .find(|ch: char| !(ch.is_ascii_alphanumeric() || ch == '_'))
                        .unwrap_or(rest.len() - 1);
                    if name_len > 0 {
                        let name = &rest[1..=name_len];
                        match self.lookup(name) {
                            Some(value) => out.push_str(&value),
                            None => out.push_str(&rest[..=name_len]),
                        }
                        rest = &rest[name_len + 1..];
                        continue;
                    }
                }
                _ => {}
            }
            out.push(c);
            rest = &rest[c.len_utf8()..];
        }

        PathBuf::from(out)
    }

    /// Variables known to the locations table win over the process environment
    fn lookup(&self, name: &str) -> Option<String> {
        let known = match name.to_ascii_uppercase().as_str() {
            "HOME" | "USERPROFILE" => Some(&self.home),
            "LOCALAPPDATA" => Some(&self.local_data),
            "APPDATA" => Some(&self.config_data),
            "TEMP" | "TMP" => Some(&self.user_temp),
            "SYSTEMROOT" | "WINDIR" => self.system_root.as_ref(),
            _ => None,
        };
        known
            .map(|p| p.to_string_lossy().to_string())
            .or_else(|| std::env::var(name).ok())
    }
}

/// `%SystemRoot%` on Windows
#[cfg(windows)]
pub fn system_root() -> Option<PathBuf> {
    std::env::var_os("SystemRoot")
        .or_else(|| std::env::var_os("windir"))
        .map(PathBuf::from)
        .or_else(|| Some(PathBuf::from("C:\\Windows")))
}

#[cfg(not(windows))]
pub fn system_root() -> Option<PathBuf> {
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Locations {
        Locations::rooted_at(Path::new("/sandbox"))
    }

    #[test]
    fn test_expand_tilde() {
        let loc = sample();
        assert_eq!(loc.expand("~/Downloads"), PathBuf::from("/sandbox/home/Downloads"));
    }

    #[test]
    fn test_expand_windows_vars() {
        let loc = sample();
        assert_eq!(
            loc.expand("%LOCALAPPDATA%/CrashDumps"),
            loc.local_data.join("CrashDumps")
        );
        assert_eq!(loc.expand("%SystemRoot%/Temp"), PathBuf::from("/sandbox/Windows/Temp"));
    }

    #[test]
    fn test_expand_dollar_vars() {
        let loc = sample();
        assert_eq!(loc.expand("$TEMP/x"), loc.user_temp.join("x"));
    }

    #[test]
    fn test_unknown_vars_left_alone() {
        let loc = sample();
        assert_eq!(
            loc.expand("/a/%PADMA_NO_SUCH_VAR%/b"),
            PathBuf::from("/a/%PADMA_NO_SUCH_VAR%/b")
        );
        assert_eq!(
            loc.expand("/a/$PADMA_NO_SUCH_VAR/b"),
            PathBuf::from("/a/$PADMA_NO_SUCH_VAR/b")
        );
        assert_eq!(loc.expand("100%"), PathBuf::from("100%"));
    }
}
