use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::Result;
use tempfile::TempDir;

use padma::browsers::catalog;
use padma::browsers::BrowserCleanOptions;
use padma::common::fs::{EntryMeta, Filesystem, LocalFs};
use padma::common::locations::Locations;
use padma::system::ProcessLister;
use padma::Padma;

/// Process table that a kill really empties, unless the kill is refused
struct Procs {
    running: Mutex<Vec<String>>,
    refuse_kill: bool,
}

impl Procs {
    fn new(running: Vec<&str>) -> Self {
        Self {
            running: Mutex::new(running.into_iter().map(String::from).collect()),
            refuse_kill: false,
        }
    }
}

impl ProcessLister for Procs {
    fn process_names(&self) -> Result<Vec<String>> {
        Ok(self.running.lock().unwrap().clone())
    }

    fn kill_named(&self, name: &str) -> Result<usize> {
        if self.refuse_kill {
            anyhow::bail!("Access is denied");
        }
        let mut running = self.running.lock().unwrap();
        let before = running.len();
        running.retain(|p| !p.eq_ignore_ascii_case(name));
        Ok(before - running.len())
    }
}

/// Real disk, except the cookie database is held open
struct CookiesInUse;

impl Filesystem for CookiesInUse {
    fn read_dir(&self, path: &Path) -> io::Result<Vec<PathBuf>> {
        LocalFs.read_dir(path)
    }
    fn stat(&self, path: &Path) -> io::Result<EntryMeta> {
        LocalFs.stat(path)
    }
    fn remove_file(&self, path: &Path) -> io::Result<()> {
        if path.file_name().is_some_and(|n| n == "Cookies") {
            return Err(io::Error::from(io::ErrorKind::PermissionDenied));
        }
        LocalFs.remove_file(path)
    }
    fn remove_dir_all(&self, path: &Path) -> io::Result<()> {
        LocalFs.remove_dir_all(path)
    }
    fn move_to_trash(&self, path: &Path) -> io::Result<()> {
        self.remove_file(path)
    }
}

fn write(path: &Path, len: usize) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, vec![0u8; len]).unwrap();
}

/// Lay out a Chrome profile with cache, cookies and history
fn install_chrome(loc: &Locations) {
    let chrome = catalog::find("chrome").unwrap();
    for dir in chrome.profile_cache_dirs("Default", loc) {
        write(&dir.join("data_0"), 1_000);
        write(&dir.join("index").join("f_01"), 24);
    }
    write(&chrome.cookie_candidates("Default", loc)[0], 4_000);
    write(&chrome.history_candidates("Default", loc)[0], 8_000);
}

fn padma_at(tmp: &TempDir, running: Vec<&'static str>) -> Padma {
    Padma::builder()
        .locations(Locations::rooted_at(tmp.path()))
        .processes(Arc::new(Procs::new(running)))
        .build()
}

#[test]
fn test_discover_estimates_counts() {
    let tmp = TempDir::new().unwrap();
    let padma = padma_at(&tmp, Vec::new());
    install_chrome(padma.locations());

    let records = padma.discover_browsers();
    assert_eq!(records.len(), 1);
    let chrome = &records[0];
    assert_eq!(chrome.name, "chrome");
    assert!(!chrome.is_running);
    assert_eq!(chrome.cache_size, 3 * 1_024);
    assert_eq!(chrome.cookie_count, 20);
    assert_eq!(chrome.history_count, 20);
}

#[test]
fn test_running_browser_is_refused() {
    let tmp = TempDir::new().unwrap();
    let exe = catalog::find("chrome").unwrap().process_name;
    let padma = padma_at(&tmp, vec![exe]);
    install_chrome(padma.locations());

    let result = padma.clean_browser(
        "chrome",
        BrowserCleanOptions {
            cache: true,
            cookies: true,
            history: true,
        },
    );
    assert!(!result.success);
    assert!(result.error.unwrap().contains("is running"));

    let chrome = catalog::find("chrome").unwrap();
    assert!(chrome.history_candidates("Default", padma.locations())[0].exists());
}

#[test]
fn test_unknown_or_missing_browser() {
    let tmp = TempDir::new().unwrap();
    let padma = padma_at(&tmp, Vec::new());

    let result = padma.clean_browser("netscape", BrowserCleanOptions::default());
    assert!(!result.success);
    assert_eq!(result.error.as_deref(), Some("Browser not found"));

    let result = padma.clean_browser("firefox", BrowserCleanOptions::default());
    assert_eq!(result.error.as_deref(), Some("Browser not found"));
}

#[test]
fn test_cache_and_cookies_cleaned() {
    let tmp = TempDir::new().unwrap();
    let padma = padma_at(&tmp, Vec::new());
    install_chrome(padma.locations());
    let chrome = catalog::find("chrome").unwrap();
    let loc = padma.locations().clone();

    let result = padma.clean_browser(
        "chrome",
        BrowserCleanOptions {
            cache: true,
            cookies: true,
            history: false,
        },
    );
    assert!(result.success, "{:?}", result.error);
    assert_eq!(result.freed_space, Some(3 * 1_024 + 4_000));

    for dir in chrome.profile_cache_dirs("Default", &loc) {
        assert!(dir.is_dir());
        assert!(!dir.join("data_0").exists());
    }
    assert!(!chrome.cookie_candidates("Default", &loc)[0].exists());
    assert!(chrome.history_candidates("Default", &loc)[0].exists());

    let rescan = padma.scan(&["browser-chrome".to_string()]);
    assert_eq!(rescan["browser-chrome"].size, 0);
}

#[test]
fn test_locked_cookies_do_not_fail_clean() {
    let tmp = TempDir::new().unwrap();
    let padma = Padma::builder()
        .locations(Locations::rooted_at(tmp.path()))
        .processes(Arc::new(Procs::new(Vec::new())))
        .filesystem(Arc::new(CookiesInUse))
        .build();
    install_chrome(padma.locations());
    let chrome = catalog::find("chrome").unwrap();
    let loc = padma.locations().clone();

    let result = padma.clean_browser(
        "chrome",
        BrowserCleanOptions {
            cache: true,
            cookies: true,
            history: true,
        },
    );
    assert!(result.success);
    assert!(result.error.is_none());
    assert_eq!(result.freed_space, Some(3 * 1_024 + 8_000));
    assert!(chrome.cookie_candidates("Default", &loc)[0].exists());
    assert!(!chrome.history_candidates("Default", &loc)[0].exists());
}

// ─── Close browser ────────────────────────────────────────────────────────────

#[test]
fn test_close_running_browser_then_clean() {
    let tmp = TempDir::new().unwrap();
    let exe = catalog::find("chrome").unwrap().process_name;
    let padma = padma_at(&tmp, vec![exe, exe, "explorer.exe"]);
    install_chrome(padma.locations());

    let closed = padma.close_browser("chrome");
    assert!(closed.success);
    assert!(closed.error.is_none());

    let result = padma.clean_browser(
        "chrome",
        BrowserCleanOptions {
            cache: true,
            ..Default::default()
        },
    );
    assert!(result.success, "{:?}", result.error);
}

#[test]
fn test_close_already_closed_browser() {
    let tmp = TempDir::new().unwrap();
    let padma = padma_at(&tmp, Vec::new());
    install_chrome(padma.locations());

    let closed = padma.close_browser("chrome");
    assert!(closed.success);
}

#[test]
fn test_close_unknown_browser() {
    let tmp = TempDir::new().unwrap();
    let padma = padma_at(&tmp, Vec::new());

    let closed = padma.close_browser("netscape");
    assert!(!closed.success);
    assert_eq!(closed.error.as_deref(), Some("Browser not found"));
}

#[test]
fn test_close_refused_kill_reports_error() {
    let tmp = TempDir::new().unwrap();
    let loc = Locations::rooted_at(tmp.path());
    install_chrome(&loc);
    let exe = catalog::find("chrome").unwrap().process_name;
    let procs = Procs {
        refuse_kill: true,
        ..Procs::new(vec![exe])
    };

    let closed = padma::browsers::close_browser(&LocalFs, &loc, &procs, "chrome", Duration::ZERO);
    assert!(!closed.success);
    assert!(closed.error.unwrap().contains("Access is denied"));
}
