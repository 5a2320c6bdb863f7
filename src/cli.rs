// Command-line interface
// Flag definitions and layering of flags, config file and defaults into a ScanConfig

use crate::scan::config::{DEFAULT_ALGORITHM, DEFAULT_IGNORED, DEFAULT_QUEUE_DEPTH, DEFAULT_ROOT};
use crate::scan::{FileConfig, ScanConfig, ScanError, ScanReport, ScanStatus};
use clap::Parser;
use std::path::PathBuf;

/// Exit status when the scan was interrupted
pub const EXIT_CANCELLED: u8 = 130;

/// Exit status for `--strict` runs that reported failures
pub const EXIT_FAILURES: u8 = 1;

#[derive(Debug, Parser)]
#[command(
    name = "sweep",
    version,
    about = "Recursively hash every file under one or more roots"
)]
pub struct Cli {
    /// Comma separated list of files/directories to include [default: .]
    #[arg(long, value_delimiter = ',')]
    pub include: Option<Vec<String>>,

    /// Comma separated list of path prefixes to ignore [default: /sys,/dev,/proc]
    #[arg(long, value_delimiter = ',')]
    pub ignore: Option<Vec<String>>,

    /// Which hash to use for analysis [default: sha1]
    #[arg(long)]
    pub hash: Option<String>,

    /// Number of hashing workers [default: number of CPUs]
    #[arg(short = 'j', long)]
    pub jobs: Option<usize>,

    /// Capacity of the work and result queues
    #[arg(long)]
    pub queue_depth: Option<usize>,

    /// TOML file with include/ignore/hash/jobs/queue_depth settings
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Print full paths instead of file names
    #[arg(long)]
    pub full_paths: bool,

    /// Print the final report as JSON instead of one line per file
    #[arg(long)]
    pub json: bool,

    /// List available hash algorithms and exit
    #[arg(long)]
    pub list: bool,

    /// Exit with a non-zero status if any file could not be hashed
    #[arg(long)]
    pub strict: bool,

    /// Enable debug logging
    #[arg(short, long)]
    pub verbose: bool,
}

impl Cli {
    /// Load the config file named by `--config`, if any
    pub fn load_file_config(&self) -> Result<FileConfig, ScanError> {
        match &self.config {
            Some(path) => FileConfig::load(path),
            None => Ok(FileConfig::default()),
        }
    }

    /// Merge flags over file settings over built-in defaults
    pub fn to_scan_config(&self, file: FileConfig) -> ScanConfig {
        let include = self
            .include
            .clone()
            .or(file.include)
            .unwrap_or_else(|| vec![DEFAULT_ROOT.to_string()]);
        let ignore = self
            .ignore
            .clone()
            .or(file.ignore)
            .unwrap_or_else(|| DEFAULT_IGNORED.iter().map(|s| s.to_string()).collect());
        let hash = self
            .hash
            .clone()
            .or(file.hash)
            .unwrap_or_else(|| DEFAULT_ALGORITHM.to_string());

        let mut config = ScanConfig::new(hash)
            .with_roots(clean_list(include))
            .with_ignored_prefixes(clean_list(ignore))
            .with_queue_depth(self.queue_depth.or(file.queue_depth).unwrap_or(DEFAULT_QUEUE_DEPTH));
        if let Some(jobs) = self.jobs.or(file.jobs) {
            config = config.with_workers(jobs);
        }
        config
    }
}

/// Trim list items and drop empty ones (`--ignore ""` means ignore nothing)
fn clean_list(items: Vec<String>) -> Vec<String> {
    items
        .into_iter()
        .map(|item| item.trim().to_string())
        .filter(|item| !item.is_empty())
        .collect()
}

/// Process exit status for a finished scan
///
/// Failures alone do not change the status unless `strict` is set.
pub fn exit_code(report: &ScanReport, strict: bool) -> u8 {
    if report.status == ScanStatus::Cancelled {
        return EXIT_CANCELLED;
    }
    if strict && !report.failures.is_empty() {
        return EXIT_FAILURES;
    }
    0
}
