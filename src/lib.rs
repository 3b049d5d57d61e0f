//! # Padma
//!
//! Directory-scan-and-reclaim engine for a Windows cleanup utility.
//!
//! Padma measures how much space each cleanup category holds and removes
//! it best-effort:
//!
//! - **Categories**: user temp, prefetch, logs, per-browser caches, the recycle bin,
//!   plus any roots declared in `config.toml`
//! - **Bounded walks**: every category has a depth limit; symlinks are never followed
//! - **Best-effort cleaning**: locked or in-use entries are skipped, not fatal
//! - **Browsers**: cache, cookie and history removal, refused while the browser runs
//! - **Memory boost**: working-set trimming behind a five-minute cooldown
//! - **Two hosts**: the `padma` CLI and a JSON-over-C FFI for the desktop shell

pub mod api;
pub mod boost;
pub mod browsers;
pub mod cleaner;
pub mod cli;
pub mod common;
pub mod ffi;
pub mod scanner;
pub mod system;

pub use api::{Padma, PadmaBuilder};
