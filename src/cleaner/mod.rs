pub mod engine;
pub mod single;

pub use engine::{CategoryClean, CleanOptions, CleanResult, ReclaimEngine};
pub use single::{delete_one, DeleteOutcome};
