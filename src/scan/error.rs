// Centralized error handling for the scan pipeline
// Fatal errors stop a scan before it starts; per-file failures are recovered and reported

use serde::Serialize;
use std::fmt;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that prevent a scan from starting or from finishing cleanly
#[derive(Debug, Error)]
pub enum ScanError {
    /// The configured algorithm is not in the registry
    #[error("Unsupported hash algorithm: {algorithm}\nSuggestion: Use --list to see available algorithms")]
    UnsupportedAlgorithm { algorithm: String },

    /// A configuration value is out of range
    #[error("Invalid configuration: {message}\nSuggestion: Run with --help to see usage information")]
    InvalidConfig { message: String },

    /// The TOML config file could not be read or parsed
    #[error("Failed to load config file {}: {reason}\nSuggestion: Check that the file exists and is valid TOML", .path.display())]
    ConfigFile { path: PathBuf, reason: String },

    /// The pipeline drained but some discovered files were never accounted for
    #[error("Scan finished with {in_flight} file(s) still in flight")]
    Incomplete { in_flight: usize },
}

impl ScanError {
    pub fn invalid_config(message: impl Into<String>) -> Self {
        ScanError::InvalidConfig {
            message: message.into(),
        }
    }
}

/// Kinds of recoverable, per-item failures
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// The file was discovered but could not be opened
    OpenFailed,
    /// The file was opened but reading it failed part way
    ReadFailed,
    /// A directory entry could not be inspected during traversal
    Unreadable,
    /// A configured root does not exist
    TraversalRootMissing,
}

impl FailureKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FailureKind::OpenFailed => "open failed",
            FailureKind::ReadFailed => "read failed",
            FailureKind::Unreadable => "unreadable",
            FailureKind::TraversalRootMissing => "root missing",
        }
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A per-item failure together with the I/O error that caused it
#[derive(Debug, Error)]
#[error("{kind}: {source}")]
pub struct FileError {
    pub kind: FailureKind,
    pub source: io::Error,
}

impl FileError {
    pub fn new(kind: FailureKind, source: io::Error) -> Self {
        Self { kind, source }
    }
}

// Tests moved to tests/scan/error_tests.rs
