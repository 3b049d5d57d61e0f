pub mod catalog;
pub mod clean;
pub mod close;
pub mod locator;

pub use catalog::{BrowserSpec, Engine};
pub use clean::{clean_browser, BrowserCleanOptions, BrowserCleanResult};
pub use close::{close_browser, BrowserCloseResult, CLOSE_WAIT};
pub use locator::{analyze, discover, BrowserRecord};
