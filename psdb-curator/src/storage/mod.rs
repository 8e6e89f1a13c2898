//! Upload storage: directory layout, pending/approved file operations,
//! journal execution and the background sweep

pub mod dirs;
pub mod file_store;
pub mod finalize;
pub mod sweep;

pub use dirs::UploadDirs;
pub use file_store::{FileStore, PendingFile, PromoteOutcome};
pub use finalize::{run_operations, FinalizeReport};
pub use sweep::{SweepReport, Sweeper};
