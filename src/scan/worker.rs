// Hashing workers
// Each worker owns one accumulator and one read buffer for the lifetime of the pool

use super::coordinator::Coordinator;
use super::error::{FailureKind, FileError};
use super::file::{FileResult, Hashed, PendingFile};
use super::registry::Accumulator;
use crossbeam_channel::{Receiver, Sender};
use std::fs::File;
use std::io::{self, Read};
use std::path::Path;
use tracing::{debug, trace};

/// Default read buffer size (1MB)
pub const DEFAULT_BUFFER_SIZE: usize = 1024 * 1024;

/// Per-worker counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WorkerStats {
    pub hashed: u64,
    pub failed: u64,
    pub abandoned: u64,
}

/// One member of the hashing pool
pub struct Worker {
    id: usize,
    accumulator: Box<dyn Accumulator>,
    buffer: Vec<u8>,
}

impl Worker {
    /// Create a worker that will own `accumulator` for its whole life
    pub fn new(id: usize, accumulator: Box<dyn Accumulator>, buffer_size: usize) -> Self {
        Self {
            id,
            accumulator,
            buffer: vec![0u8; buffer_size.max(1)],
        }
    }

    /// Hash one file
    ///
    /// The accumulator is back in its initial state when this returns,
    /// whether the file hashed or failed part way.
    pub fn hash_file(&mut self, path: &Path) -> Result<Hashed, FileError> {
        let mut file =
            File::open(path).map_err(|e| FileError::new(FailureKind::OpenFailed, e))?;

        match self.stream(&mut file) {
            Ok(bytes) => Ok(Hashed {
                digest: self.accumulator.finalize_reset(),
                bytes,
            }),
            Err(e) => {
                self.accumulator.reset();
                Err(FileError::new(FailureKind::ReadFailed, e))
            }
        }
    }

    fn stream(&mut self, file: &mut File) -> io::Result<u64> {
        let mut total = 0u64;
        loop {
            match file.read(&mut self.buffer) {
                Ok(0) => return Ok(total),
                Ok(n) => {
                    self.accumulator.update(&self.buffer[..n]);
                    total += n as u64;
                }
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
        }
    }

    /// Worker loop: runs until the work queue is closed and drained
    ///
    /// After cancellation the worker keeps draining the queue, so walkers
    /// blocked on a full queue can observe the cancel, but abandons each
    /// file without opening it.
    pub fn run(
        mut self,
        work: Receiver<PendingFile>,
        results: Sender<FileResult>,
        coordinator: &Coordinator,
    ) -> WorkerStats {
        let mut stats = WorkerStats::default();

        for file in work.iter() {
            if coordinator.is_cancelled() {
                coordinator.abandon();
                stats.abandoned += 1;
                continue;
            }

            let outcome = self.hash_file(&file.path);
            match &outcome {
                Ok(hashed) => {
                    trace!(
                        worker = self.id,
                        path = %file.path.display(),
                        digest = %hashed.digest,
                        "hashed"
                    );
                    stats.hashed += 1;
                }
                Err(err) => {
                    debug!(
                        worker = self.id,
                        path = %file.path.display(),
                        error = %err,
                        "hash failed"
                    );
                    stats.failed += 1;
                }
            }

            if results.send(FileResult { file, outcome }).is_err() {
                // Collector is gone; keep draining so walkers are not left blocked
                coordinator.abandon();
                stats.abandoned += 1;
            }
        }

        debug!(
            worker = self.id,
            hashed = stats.hashed,
            failed = stats.failed,
            abandoned = stats.abandoned,
            "worker exiting"
        );
        stats
    }
}

// Tests moved to tests/scan/worker_tests.rs
