//! Typed adapters over OS facilities. The core never shells out or parses
//! tool output directly; it talks to these traits, and tests mock them.

pub mod process;
pub mod recycle;

pub use process::{running_names, ProcessLister, SysinfoProcesses};
pub use recycle::{RecycleBin, TrashCanBin};
