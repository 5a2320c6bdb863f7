// File descriptors flowing through the pipeline
// Walker output, worker output, and the tagged result the collector consumes

use super::error::{FailureKind, FileError};
use super::registry::Digest;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fs::Metadata;
use std::io;
use std::path::{Path, PathBuf};

/// Metadata captured when the walker discovers an entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileMeta {
    pub size: u64,
    pub mode: u32,
    pub modified: Option<DateTime<Utc>>,
    pub is_dir: bool,
}

impl FileMeta {
    pub fn from_metadata(metadata: &Metadata) -> Self {
        Self {
            size: metadata.len(),
            mode: file_mode(metadata),
            modified: metadata.modified().ok().map(DateTime::<Utc>::from),
            is_dir: metadata.is_dir(),
        }
    }
}

#[cfg(unix)]
fn file_mode(metadata: &Metadata) -> u32 {
    use std::os::unix::fs::PermissionsExt;
    metadata.permissions().mode()
}

#[cfg(not(unix))]
fn file_mode(metadata: &Metadata) -> u32 {
    if metadata.permissions().readonly() {
        0o444
    } else {
        0o644
    }
}

/// A discovered file waiting to be hashed
#[derive(Debug, Clone)]
pub struct PendingFile {
    pub path: PathBuf,
    pub meta: Option<FileMeta>,
}

impl PendingFile {
    pub fn new(path: PathBuf, meta: FileMeta) -> Self {
        Self {
            path,
            meta: Some(meta),
        }
    }

    /// A descriptor for a path that could not be stat'ed
    pub fn unstatted(path: PathBuf) -> Self {
        Self { path, meta: None }
    }
}

/// A successfully hashed file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Hashed {
    pub digest: Digest,
    /// Bytes actually streamed through the accumulator
    pub bytes: u64,
}

/// A descriptor after exactly one worker (or the walker) settled it
///
/// Digest and error are mutually exclusive by construction.
#[derive(Debug)]
pub struct FileResult {
    pub file: PendingFile,
    pub outcome: Result<Hashed, FileError>,
}

impl FileResult {
    pub fn hashed(file: PendingFile, hashed: Hashed) -> Self {
        Self {
            file,
            outcome: Ok(hashed),
        }
    }

    pub fn failed(file: PendingFile, kind: FailureKind, source: io::Error) -> Self {
        Self {
            file,
            outcome: Err(FileError::new(kind, source)),
        }
    }

    pub fn path(&self) -> &Path {
        &self.file.path
    }
}
