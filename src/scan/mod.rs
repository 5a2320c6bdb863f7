// Scan core
// Concurrent walk-and-hash pipeline: registry, filter, walker, workers, collector, coordinator

pub mod collector;
pub mod config;
pub mod coordinator;
pub mod engine;
pub mod error;
pub mod file;
pub mod filter;
pub mod registry;
pub mod report;
pub mod walker;
pub mod worker;

// Re-export commonly used types for convenience
pub use config::{FileConfig, ScanConfig};
pub use coordinator::{CancelToken, Coordinator};
pub use engine::{scan, ScanEngine};
pub use error::{FailureKind, FileError, ScanError};
pub use file::{FileMeta, FileResult, Hashed, PendingFile};
pub use filter::PathFilter;
pub use registry::{Accumulator, Algorithm, Digest, DigestAccumulator, DigestRegistry};
pub use report::{
    ConsoleReporter, FileRecord, NullReporter, Reporter, ScanFailure, ScanReport, ScanStats,
    ScanStatus,
};
pub use walker::{walk_root, WalkEvent, WalkSummary};
pub use worker::Worker;
