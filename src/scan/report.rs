// Scan results and reporting
// Result types returned to callers, plus the observable side effects of a scan

use super::error::{FailureKind, FileError};
use super::registry::Digest;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// One successfully hashed file
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileRecord {
    pub path: PathBuf,
    pub digest: Digest,
    pub size: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub modified: Option<DateTime<Utc>>,
}

/// One reported failure
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScanFailure {
    pub path: PathBuf,
    pub kind: FailureKind,
    pub message: String,
}

impl ScanFailure {
    pub fn new(path: PathBuf, error: &FileError) -> Self {
        Self {
            path,
            kind: error.kind,
            message: error.source.to_string(),
        }
    }
}

/// How the scan ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ScanStatus {
    Completed,
    Cancelled,
}

/// Statistics collected during a scan
#[derive(Debug, Clone, Default, Serialize)]
pub struct ScanStats {
    pub files_hashed: usize,
    pub files_failed: usize,
    pub files_abandoned: u64,
    pub bytes_hashed: u64,
    #[serde(serialize_with = "serialize_duration")]
    pub duration: Duration,
}

// Helper function to serialize Duration as seconds
fn serialize_duration<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    serializer.serialize_f64(duration.as_secs_f64())
}

/// Everything a scan produced
///
/// `records` and `failures` are in collection order, which is not stable
/// across runs. Compare them as sets.
#[derive(Debug, Serialize)]
pub struct ScanReport {
    pub status: ScanStatus,
    pub stats: ScanStats,
    pub records: Vec<FileRecord>,
    pub failures: Vec<ScanFailure>,
}

impl ScanReport {
    /// True if the scan completed without any reported failure
    pub fn is_clean(&self) -> bool {
        self.status == ScanStatus::Completed && self.failures.is_empty()
    }

    /// Path -> hex digest, for order-independent comparison
    pub fn digests(&self) -> BTreeMap<PathBuf, String> {
        self.records
            .iter()
            .map(|record| (record.path.clone(), record.digest.to_hex()))
            .collect()
    }
}

/// Observer for scan progress
///
/// Called from the thread that invoked the scan: `scanning` before each
/// root's walk starts, `hashed`/`failed` from the collector.
pub trait Reporter {
    fn scanning(&mut self, _root: &Path) {}
    fn hashed(&mut self, _record: &FileRecord) {}
    fn failed(&mut self, _failure: &ScanFailure) {}
}

/// Reporter that ignores everything
#[derive(Debug, Default, Clone, Copy)]
pub struct NullReporter;

impl Reporter for NullReporter {}

/// Reporter that prints the classic console lines
///
/// * `scanning: <root>` per root
/// * `<hex digest>  <name>` per hashed file
/// * `error: <path>: <kind>: <reason>` per failure, on the error stream
pub struct ConsoleReporter<O: Write, E: Write> {
    out: O,
    err: E,
    full_paths: bool,
    records: bool,
}

impl ConsoleReporter<io::Stdout, io::Stderr> {
    /// Console reporter on the process's stdout/stderr
    pub fn stdio() -> Self {
        Self::new(io::stdout(), io::stderr())
    }
}

impl<O: Write, E: Write> ConsoleReporter<O, E> {
    pub fn new(out: O, err: E) -> Self {
        Self {
            out,
            err,
            full_paths: false,
            records: true,
        }
    }

    /// Print full paths instead of base names
    pub fn with_full_paths(mut self, full_paths: bool) -> Self {
        self.full_paths = full_paths;
        self
    }

    /// Enable or disable the per-file and per-root lines on the output stream
    pub fn with_records(mut self, records: bool) -> Self {
        self.records = records;
        self
    }

    pub fn into_inner(self) -> (O, E) {
        (self.out, self.err)
    }

    fn display_name(&self, path: &Path) -> String {
        if self.full_paths {
            return path.display().to_string();
        }
        match path.file_name() {
            Some(name) => name.to_string_lossy().into_owned(),
            None => path.display().to_string(),
        }
    }
}

impl<O: Write, E: Write> Reporter for ConsoleReporter<O, E> {
    fn scanning(&mut self, root: &Path) {
        if self.records {
            let _ = writeln!(self.out, "scanning: {}", root.display());
        }
    }

    fn hashed(&mut self, record: &FileRecord) {
        if self.records {
            let name = self.display_name(&record.path);
            let _ = writeln!(self.out, "{}  {}", record.digest, name);
        }
    }

    fn failed(&mut self, failure: &ScanFailure) {
        let _ = writeln!(
            self.err,
            "error: {}: {}: {}",
            failure.path.display(),
            failure.kind,
            failure.message
        );
    }
}

// Tests moved to tests/scan/report_tests.rs
