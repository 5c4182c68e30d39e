pub mod provider;
pub mod result;
pub mod runner;
pub mod status;

pub use provider::{CsvDirectoryProvider, MemoryProvider};
pub use result::{BatchResult, FailureReason};
pub use runner::BatchRunner;
pub use status::{BatchStatus, RunState, StatusSnapshot};
