use std::path::{Path, PathBuf};

use crate::common::fs::Filesystem;
use crate::common::locations::Locations;

/// Browser engine family; decides the profile layout on disk
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Engine {
    /// `User Data/Default` with `Cache`, `Code Cache`, `GPUCache`
    Chromium,
    /// Randomly named profile folders, cache in `<profile>/cache2`
    Gecko,
}

/// Which well-known location a browser path hangs off
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Base {
    Home,
    LocalData,
    ConfigData,
    CacheData,
}

impl Base {
    fn resolve(self, loc: &Locations) -> &Path {
        match self {
            Base::Home => &loc.home,
            Base::LocalData => &loc.local_data,
            Base::ConfigData => &loc.config_data,
            Base::CacheData => &loc.cache_data,
        }
    }
}

/// A browser Padma knows how to find and clean
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrowserSpec {
    pub name: &'static str,
    pub display_name: &'static str,
    /// Executable name matched case-insensitively against the process list
    pub process_name: &'static str,
    pub engine: Engine,
    data: (Base, &'static str),
    cache: (Base, &'static str),
}

/// Sub-directories of a Chromium profile that hold disposable cache
pub const CHROMIUM_CACHE_DIRS: &[&str] = &["Cache", "Code Cache", "GPUCache"];

/// Gecko per-profile cache directory
pub const GECKO_CACHE_DIR: &str = "cache2";

#[cfg(windows)]
const BROWSERS: &[BrowserSpec] = &[
    BrowserSpec {
        name: "chrome",
        display_name: "Google Chrome",
        process_name: "chrome.exe",
        engine: Engine::Chromium,
        data: (Base::LocalData, "Google/Chrome/User Data"),
        cache: (Base::LocalData, "Google/Chrome/User Data"),
    },
    BrowserSpec {
        name: "edge",
        display_name: "Microsoft Edge",
        process_name: "msedge.exe",
        engine: Engine::Chromium,
        data: (Base::LocalData, "Microsoft/Edge/User Data"),
        cache: (Base::LocalData, "Microsoft/Edge/User Data"),
    },
    BrowserSpec {
        name: "brave",
        display_name: "Brave",
        process_name: "brave.exe",
        engine: Engine::Chromium,
        data: (Base::LocalData, "BraveSoftware/Brave-Browser/User Data"),
        cache: (Base::LocalData, "BraveSoftware/Brave-Browser/User Data"),
    },
    BrowserSpec {
        name: "firefox",
        display_name: "Mozilla Firefox",
        process_name: "firefox.exe",
        engine: Engine::Gecko,
        data: (Base::ConfigData, "Mozilla/Firefox/Profiles"),
        cache: (Base::LocalData, "Mozilla/Firefox/Profiles"),
    },
];

#[cfg(target_os = "macos")]
const BROWSERS: &[BrowserSpec] = &[
    BrowserSpec {
        name: "chrome",
        display_name: "Google Chrome",
        process_name: "Google Chrome",
        engine: Engine::Chromium,
        data: (Base::ConfigData, "Google/Chrome"),
        cache: (Base::CacheData, "Google/Chrome"),
    },
    BrowserSpec {
        name: "edge",
        display_name: "Microsoft Edge",
        process_name: "Microsoft Edge",
        engine: Engine::Chromium,
        data: (Base::ConfigData, "Microsoft Edge"),
        cache: (Base::CacheData, "Microsoft Edge"),
    },
    BrowserSpec {
        name: "brave",
        display_name: "Brave",
        process_name: "Brave Browser",
        engine: Engine::Chromium,
        data: (Base::ConfigData, "BraveSoftware/Brave-Browser"),
        cache: (Base::CacheData, "BraveSoftware/Brave-Browser"),
    },
    BrowserSpec {
        name: "firefox",
        display_name: "Mozilla Firefox",
        process_name: "firefox",
        engine: Engine::Gecko,
        data: (Base::ConfigData, "Firefox/Profiles"),
        cache: (Base::CacheData, "Firefox/Profiles"),
    },
];

#[cfg(all(not(windows), not(target_os = "macos")))]
const BROWSERS: &[BrowserSpec] = &[
    BrowserSpec {
        name: "chrome",
        display_name: "Google Chrome",
        process_name: "chrome",
        engine: Engine::Chromium,
        data: (Base::ConfigData, "google-chrome"),
        cache: (Base::CacheData, "google-chrome"),
    },
    BrowserSpec {
        name: "edge",
        display_name: "Microsoft Edge",
        process_name: "msedge",
        engine: Engine::Chromium,
        data: (Base::ConfigData, "microsoft-edge"),
        cache: (Base::CacheData, "microsoft-edge"),
    },
    BrowserSpec {
        name: "brave",
        display_name: "Brave",
        process_name: "brave",
        engine: Engine::Chromium,
        data: (Base::ConfigData, "BraveSoftware/Brave-Browser"),
        cache: (Base::CacheData, "BraveSoftware/Brave-Browser"),
    },
    BrowserSpec {
        name: "firefox",
        display_name: "Mozilla Firefox",
        process_name: "firefox",
        engine: Engine::Gecko,
        data: (Base::Home, ".mozilla/firefox"),
        cache: (Base::CacheData, "mozilla/firefox"),
    },
];

/// Every browser in the catalog
pub fn all() -> &'static [BrowserSpec] {
    BROWSERS
}

/// Look up a browser by its short name, case-insensitively
pub fn find(name: &str) -> Option<&'static BrowserSpec> {
    BROWSERS.iter().find(|b| b.name.eq_ignore_ascii_case(name))
}

fn join_rel(base: &Path, rel: &str) -> PathBuf {
    rel.split('/').fold(base.to_path_buf(), |acc, part| acc.join(part))
}

impl BrowserSpec {
    /// Category identifier used by the scanner (`browser-<name>`)
    pub fn category(&self) -> String {
        format!("browser-{}", self.name)
    }

    /// Directory holding profile data (cookies, history)
    pub fn data_root(&self, loc: &Locations) -> PathBuf {
        join_rel(self.data.0.resolve(loc), self.data.1)
    }

    /// Directory holding per-profile cache folders
    pub fn cache_root(&self, loc: &Locations) -> PathBuf {
        join_rel(self.cache.0.resolve(loc), self.cache.1)
    }

    /// The profile a browser record describes: `Default` for Chromium, the
    /// release/default profile for Gecko
    pub fn default_profile(&self, fs: &dyn Filesystem, loc: &Locations) -> Option<String> {
        match self.engine {
            Engine::Chromium => Some("Default".to_string()),
            Engine::Gecko => {
                let names = profile_names(fs, &self.data_root(loc));
                select_gecko_profile(&names).map(str::to_string)
            }
        }
    }

    /// Cache directories of the default profile
    pub fn profile_cache_dirs(&self, profile: &str, loc: &Locations) -> Vec<PathBuf> {
        let root = self.cache_root(loc).join(profile);
        match self.engine {
            Engine::Chromium => CHROMIUM_CACHE_DIRS.iter().map(|d| root.join(d)).collect(),
            Engine::Gecko => vec![root.join(GECKO_CACHE_DIR)],
        }
    }

    /// Cookie database candidates, newest layout first
    pub fn cookie_candidates(&self, profile: &str, loc: &Locations) -> Vec<PathBuf> {
        let root = self.data_root(loc).join(profile);
        match self.engine {
            Engine::Chromium => vec![root.join("Network").join("Cookies"), root.join("Cookies")],
            Engine::Gecko => vec![root.join("cookies.sqlite")],
        }
    }

    pub fn history_candidates(&self, profile: &str, loc: &Locations) -> Vec<PathBuf> {
        let root = self.data_root(loc).join(profile);
        match self.engine {
            Engine::Chromium => vec![root.join("History")],
            Engine::Gecko => vec![root.join("places.sqlite")],
        }
    }
}

/// Names of the sub-directories of a profile parent
pub fn profile_names(fs: &dyn Filesystem, parent: &Path) -> Vec<String> {
    let Ok(children) = fs.read_dir(parent) else {
        return Vec::new();
    };
    let mut names: Vec<String> = children
        .into_iter()
        .filter(|p| fs.stat_root(p).map(|m| m.is_dir()).unwrap_or(false))
        .filter_map(|p| p.file_name().map(|n| n.to_string_lossy().to_string()))
        .collect();
    names.sort();
    names
}

/// Pick the profile Firefox actually uses: `*.default-release` wins over
/// `*.default`; other profiles are ignored.
pub fn select_gecko_profile(names: &[String]) -> Option<&str> {
    names
        .iter()
        .find(|n| n.ends_with("-release"))
        .or_else(|| names.iter().find(|n| n.contains(".default")))
        .map(String::as_str)
}
