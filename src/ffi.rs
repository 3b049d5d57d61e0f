//! FFI bridge for the desktop shell
//!
//! The shell creates one `PadmaCore` handle at startup and passes it to every
//! call; the handle owns the boost cooldown, so throttling spans the whole
//! app session. Arguments and results are JSON strings. Every returned
//! string must be freed with `padma_free_string`.

use std::ffi::{CStr, CString};
use std::os::raw::c_char;
use std::path::Path;

use crate::api::Padma;
use crate::boost::BoostMode;
use crate::browsers::BrowserCleanOptions;
use crate::common::config::Config;

/// Opaque handle owned by the shell
pub struct PadmaCore {
    inner: Padma,
}

// ─── Helpers ─────────────────────────────────────────────────────────────────

/// Convert a Rust string to a C string pointer. Caller must free with `padma_free_string`.
fn to_c_string(s: &str) -> *mut c_char {
    CString::new(s).unwrap_or_default().into_raw()
}

/// Convert a JSON-serializable value to a C string pointer.
fn json_to_c<T: serde::Serialize>(val: &T) -> *mut c_char {
    match serde_json::to_string(val) {
        Ok(s) => to_c_string(&s),
        Err(e) => error_c(&e.to_string()),
    }
}

/// Return an error JSON as a C string.
fn error_c(msg: &str) -> *mut c_char {
    let val = serde_json::json!({"success": false, "error": msg});
    to_c_string(&val.to_string())
}

/// Borrow a C string argument; `None` for null or invalid UTF-8
fn arg<'a>(ptr: *const c_char) -> Option<&'a str> {
    if ptr.is_null() {
        return None;
    }
    unsafe { CStr::from_ptr(ptr) }.to_str().ok()
}

fn core<'a>(handle: *const PadmaCore) -> Option<&'a Padma> {
    unsafe { handle.as_ref() }.map(|c| &c.inner)
}

/// Parse a JSON array of category names
fn categories(ptr: *const c_char) -> Result<Vec<String>, String> {
    let json = arg(ptr).ok_or_else(|| "categories argument missing".to_string())?;
    serde_json::from_str(json).map_err(|e| format!("Invalid categories JSON: {}", e))
}

// ─── Lifecycle ───────────────────────────────────────────────────────────────

/// Create a core with the user's config. Falls back to defaults when the
/// config file cannot be read.
#[no_mangle]
pub extern "C" fn padma_core_new() -> *mut PadmaCore {
    let config = Config::load().unwrap_or_else(|e| {
        tracing::warn!(error = %e, "config unreadable, using defaults");
        Config::default()
    });
    Box::into_raw(Box::new(PadmaCore {
        inner: Padma::new(config),
    }))
}

/// Destroy a core created by `padma_core_new`.
#[no_mangle]
pub extern "C" fn padma_core_free(handle: *mut PadmaCore) {
    if !handle.is_null() {
        unsafe {
            drop(Box::from_raw(handle));
        }
    }
}

/// Free a string returned by any padma FFI function.
#[no_mangle]
pub extern "C" fn padma_free_string(ptr: *mut c_char) {
    if !ptr.is_null() {
        unsafe {
            let _ = CString::from_raw(ptr);
        }
    }
}

// ─── Scan / Clean ────────────────────────────────────────────────────────────

/// Scan categories. Argument: `["temp","browser-chrome"]`.
/// Returns `{category: {size, files}}`.
#[no_mangle]
pub extern "C" fn padma_scan(handle: *const PadmaCore, categories_json: *const c_char) -> *mut c_char {
    let Some(padma) = core(handle) else {
        return error_c("null handle");
    };
    match categories(categories_json) {
        Ok(cats) => json_to_c(&padma.scan(&cats)),
        Err(e) => error_c(&e),
    }
}

/// Clean categories. Returns `{category: {success, freedSpace}}`.
#[no_mangle]
pub extern "C" fn padma_clean(handle: *const PadmaCore, categories_json: *const c_char) -> *mut c_char {
    let Some(padma) = core(handle) else {
        return error_c("null handle");
    };
    match categories(categories_json) {
        Ok(cats) => json_to_c(&padma.clean(&cats)),
        Err(e) => error_c(&e),
    }
}

/// Delete one path with the configured single-delete policy.
/// Returns `{success, error?}`.
#[no_mangle]
pub extern "C" fn padma_delete_one(handle: *const PadmaCore, path: *const c_char) -> *mut c_char {
    let Some(padma) = core(handle) else {
        return error_c("null handle");
    };
    match arg(path) {
        Some(path) => json_to_c(&padma.delete_one(Path::new(path))),
        None => error_c("path argument missing"),
    }
}

// ─── Boost ───────────────────────────────────────────────────────────────────

/// Run a memory boost. `mode` is `"soft"` (default) or `"hard"`.
/// Returns `{success, freedMemory?, cooldownRemaining?, error?}`.
#[no_mangle]
pub extern "C" fn padma_try_boost(handle: *const PadmaCore, mode: *const c_char) -> *mut c_char {
    let Some(padma) = core(handle) else {
        return error_c("null handle");
    };
    let mode = match arg(mode) {
        Some("hard") => BoostMode::Hard,
        Some("soft") | None => BoostMode::Soft,
        Some(other) => return error_c(&format!("Unknown boost mode: {}", other)),
    };
    json_to_c(&padma.try_boost(mode))
}

/// Returns `{canBoost, remainingSeconds}`.
#[no_mangle]
pub extern "C" fn padma_boost_status(handle: *const PadmaCore) -> *mut c_char {
    match core(handle) {
        Some(padma) => json_to_c(&padma.boost_status()),
        None => error_c("null handle"),
    }
}

// ─── Browsers ────────────────────────────────────────────────────────────────

/// Installed browsers. Returns a JSON array of browser records.
#[no_mangle]
pub extern "C" fn padma_discover_browsers(handle: *const PadmaCore) -> *mut c_char {
    match core(handle) {
        Some(padma) => json_to_c(&padma.discover_browsers()),
        None => error_c("null handle"),
    }
}

/// Clean one browser. `options_json` is `{"cache":true,"cookies":false,"history":false}`.
/// Returns `{success, freedSpace?, error?}`.
#[no_mangle]
pub extern "C" fn padma_clean_browser(
    handle: *const PadmaCore,
    name: *const c_char,
    options_json: *const c_char,
) -> *mut c_char {
    let Some(padma) = core(handle) else {
        return error_c("null handle");
    };
    let Some(name) = arg(name) else {
        return error_c("browser name missing");
    };
    let options: BrowserCleanOptions = match arg(options_json).map(serde_json::from_str::<BrowserCleanOptions>) {
        Some(Ok(o)) => o,
        Some(Err(e)) => return error_c(&format!("Invalid options JSON: {}", e)),
        None => BrowserCleanOptions::default(),
    };
    json_to_c(&padma.clean_browser(name, options))
}

/// Force-close a running browser. Returns `{success, error?}`; a browser
/// that is not running counts as closed.
#[no_mangle]
pub extern "C" fn padma_close_browser(handle: *const PadmaCore, name: *const c_char) -> *mut c_char {
    let Some(padma) = core(handle) else {
        return error_c("null handle");
    };
    let Some(name) = arg(name) else {
        return error_c("browser name missing");
    };
    json_to_c(&padma.close_browser(name))
}

/// Library version string.
#[no_mangle]
pub extern "C" fn padma_version() -> *mut c_char {
    to_c_string(env!("CARGO_PKG_VERSION"))
}
