// Scan configuration
// Immutable per-scan settings plus the optional TOML file layer

use super::error::ScanError;
use super::worker::DEFAULT_BUFFER_SIZE;
use serde::Deserialize;
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

/// Algorithm used when none is configured
pub const DEFAULT_ALGORITHM: &str = "sha1";

/// Prefixes the CLI ignores when `--ignore` is not given
pub const DEFAULT_IGNORED: [&str; 3] = ["/sys", "/dev", "/proc"];

/// Root the CLI scans when `--include` is not given
pub const DEFAULT_ROOT: &str = ".";

/// Capacity of the work and result queues
pub const DEFAULT_QUEUE_DEPTH: usize = 1024;

/// Settings for one scan
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanConfig {
    /// Roots to walk; each gets its own walker
    pub roots: BTreeSet<PathBuf>,
    /// Path prefixes to skip
    pub ignored_prefixes: BTreeSet<String>,
    /// Registry name of the digest algorithm
    pub algorithm: String,
    /// Hashing pool size
    pub workers: usize,
    /// Bounded capacity of the work and result queues
    pub queue_depth: usize,
    /// Per-worker read buffer size in bytes
    pub buffer_size: usize,
    /// Root to use when `roots` is empty; without it an empty `roots` scans nothing
    pub default_root: Option<PathBuf>,
}

impl ScanConfig {
    /// Configuration with no roots, no ignored prefixes, and one worker per CPU
    pub fn new(algorithm: impl Into<String>) -> Self {
        Self {
            roots: BTreeSet::new(),
            ignored_prefixes: BTreeSet::new(),
            algorithm: algorithm.into(),
            workers: num_cpus::get().max(1),
            queue_depth: DEFAULT_QUEUE_DEPTH,
            buffer_size: DEFAULT_BUFFER_SIZE,
            default_root: None,
        }
    }

    pub fn with_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.roots.insert(root.into());
        self
    }

    pub fn with_roots<I, P>(mut self, roots: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        self.roots.extend(roots.into_iter().map(Into::into));
        self
    }

    pub fn with_ignored(mut self, prefix: impl Into<String>) -> Self {
        self.ignored_prefixes.insert(prefix.into());
        self
    }

    pub fn with_ignored_prefixes<I, S>(mut self, prefixes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.ignored_prefixes
            .extend(prefixes.into_iter().map(Into::into));
        self
    }

    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }

    pub fn with_queue_depth(mut self, queue_depth: usize) -> Self {
        self.queue_depth = queue_depth;
        self
    }

    pub fn with_buffer_size(mut self, buffer_size: usize) -> Self {
        self.buffer_size = buffer_size;
        self
    }

    /// Opt into scanning `root` when no roots are configured
    pub fn with_default_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.default_root = Some(root.into());
        self
    }

    /// Roots the scan will actually walk
    pub fn effective_roots(&self) -> Vec<PathBuf> {
        if self.roots.is_empty() {
            return self.default_root.iter().cloned().collect();
        }
        self.roots.iter().cloned().collect()
    }

    /// Reject values the pipeline cannot run with
    pub fn validate(&self) -> Result<(), ScanError> {
        if self.workers == 0 {
            return Err(ScanError::invalid_config("worker count must be at least 1"));
        }
        if self.buffer_size == 0 {
            return Err(ScanError::invalid_config("buffer size must be at least 1 byte"));
        }
        Ok(())
    }
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self::new(DEFAULT_ALGORITHM)
    }
}

/// Settings read from a TOML config file
///
/// ```toml
/// include = ["/etc", "/usr/bin"]
/// ignore = ["/etc/ssl"]
/// hash = "sha256"
/// jobs = 8
/// queue_depth = 4096
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    pub include: Option<Vec<String>>,
    pub ignore: Option<Vec<String>>,
    pub hash: Option<String>,
    pub jobs: Option<usize>,
    pub queue_depth: Option<usize>,
}

impl FileConfig {
    /// Read and parse a config file
    pub fn load(path: &Path) -> Result<Self, ScanError> {
        let text = fs::read_to_string(path).map_err(|e| ScanError::ConfigFile {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        Self::parse(&text).map_err(|e| ScanError::ConfigFile {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }

    pub fn parse(text: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(text)
    }
}

// Tests moved to tests/scan/config_tests.rs
