// Library module for sweep
// Re-exports modules for use by the binary and integration tests

pub mod cli;
pub mod scan;

pub use scan::{scan, ScanConfig, ScanEngine, ScanError, ScanReport};
