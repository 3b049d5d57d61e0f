pub mod config;
pub mod errors;
pub mod format;
pub mod fs;
pub mod locations;
pub mod permissions;
pub mod safety;

pub use config::Config;
pub use errors::PadmaError;
pub use fs::{EntryKind, EntryMeta, Filesystem, LocalFs};
pub use locations::Locations;
