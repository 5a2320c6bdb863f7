// Result collector
// Single consumer of the result queue and the only writer of the result lists

use super::coordinator::Coordinator;
use super::file::FileResult;
use super::report::{FileRecord, Reporter, ScanFailure};
use crossbeam_channel::Receiver;
use tracing::debug;

/// What the collector gathered by the time the result queue closed
#[derive(Debug, Default)]
pub struct Collected {
    pub records: Vec<FileRecord>,
    pub failures: Vec<ScanFailure>,
    pub bytes_hashed: u64,
}

pub struct Collector<'a, R: Reporter + ?Sized> {
    reporter: &'a mut R,
    coordinator: &'a Coordinator,
    collected: Collected,
}

impl<'a, R: Reporter + ?Sized> Collector<'a, R> {
    pub fn new(reporter: &'a mut R, coordinator: &'a Coordinator) -> Self {
        Self {
            reporter,
            coordinator,
            collected: Collected::default(),
        }
    }

    /// Consume results until the queue is closed and empty
    pub fn drain(mut self, results: Receiver<FileResult>) -> Collected {
        for result in results.iter() {
            self.accept(result);
        }
        self.collected
    }

    /// Handle one result and mark it complete
    pub fn accept(&mut self, result: FileResult) {
        let FileResult { file, outcome } = result;
        match outcome {
            Ok(hashed) => {
                let record = FileRecord {
                    path: file.path,
                    digest: hashed.digest,
                    size: hashed.bytes,
                    modified: file.meta.and_then(|meta| meta.modified),
                };
                self.collected.bytes_hashed += record.size;
                self.reporter.hashed(&record);
                self.collected.records.push(record);
            }
            Err(error) => {
                debug!(
                    path = %file.path.display(),
                    kind = %error.kind,
                    error = %error.source,
                    "file not hashed"
                );
                let failure = ScanFailure::new(file.path, &error);
                self.reporter.failed(&failure);
                self.collected.failures.push(failure);
            }
        }
        self.coordinator.complete();
    }
}
