// Scan engine
// Wires walkers, the worker pool and the collector together and waits for the pipeline to drain

use super::collector::Collector;
use super::config::ScanConfig;
use super::coordinator::{CancelToken, Coordinator};
use super::error::ScanError;
use super::file::{FileResult, PendingFile};
use super::filter::PathFilter;
use super::registry::DigestRegistry;
use super::report::{FileRecord, NullReporter, Reporter, ScanReport, ScanStats, ScanStatus};
use super::walker::{walk_root, WalkEvent};
use super::worker::Worker;
use crossbeam_channel::{bounded, Sender};
use std::ops::ControlFlow;
use std::thread;
use std::time::Instant;
use tracing::{debug, info};

/// Engine for scanning roots and hashing every file found
pub struct ScanEngine {
    registry: DigestRegistry,
}

impl ScanEngine {
    /// Create an engine over the given algorithm registry
    pub fn new(registry: DigestRegistry) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &DigestRegistry {
        &self.registry
    }

    /// Run one scan to completion (or cancellation)
    ///
    /// Configuration is validated and the algorithm resolved before any
    /// traversal starts. Per-file failures are reported through `reporter`
    /// and collected in the returned report; they never fail the scan.
    ///
    /// Pipeline shutdown order:
    /// 1. each walker thread drops its work sender when its root is done,
    ///    so the work queue closes once every walker has finished;
    /// 2. workers exit when the work queue is closed and drained, dropping
    ///    their result senders;
    /// 3. the result queue closes once all workers and walkers are gone and
    ///    the collector (this thread) returns after draining it;
    /// 4. the thread scope joins and the coordinator checks that nothing
    ///    is still in flight.
    ///
    /// # Arguments
    /// * `config` - Roots, ignored prefixes, algorithm and pool sizing
    /// * `reporter` - Receives per-root and per-file events
    /// * `cancel` - Raising it stops the walk and returns a partial report
    pub fn scan(
        &self,
        config: &ScanConfig,
        reporter: &mut dyn Reporter,
        cancel: &CancelToken,
    ) -> Result<ScanReport, ScanError> {
        let start_time = Instant::now();

        config.validate()?;
        let algorithm = self.registry.resolve(&config.algorithm)?;
        let filter = PathFilter::new(config.ignored_prefixes.iter().cloned())?;
        let roots = config.effective_roots();

        info!(
            algorithm = algorithm.name(),
            workers = config.workers,
            roots = roots.len(),
            "starting scan"
        );

        let coordinator = Coordinator::new(cancel.clone());
        let (work_tx, work_rx) = bounded::<PendingFile>(config.queue_depth);
        let (result_tx, result_rx) = bounded::<FileResult>(config.queue_depth);

        let collected = thread::scope(|scope| {
            for id in 0..config.workers {
                let worker = Worker::new(id, algorithm.accumulator(), config.buffer_size);
                let work_rx = work_rx.clone();
                let result_tx = result_tx.clone();
                let coordinator = &coordinator;
                scope.spawn(move || worker.run(work_rx, result_tx, coordinator));
            }

            for root in &roots {
                reporter.scanning(root);
                let work_tx = work_tx.clone();
                let result_tx = result_tx.clone();
                let filter = &filter;
                let coordinator = &coordinator;
                scope.spawn(move || {
                    let summary = walk_root(root, filter, coordinator.cancel_token(), |event| {
                        match event {
                            WalkEvent::File(file) => submit(coordinator, &work_tx, file),
                            WalkEvent::Failed(failure) => submit(coordinator, &result_tx, failure),
                        }
                    });
                    debug!(
                        root = %root.display(),
                        files = summary.files,
                        failures = summary.failures,
                        cancelled = summary.cancelled,
                        "walk finished"
                    );
                });
            }

            // Only the spawned threads may hold queue endpoints from here on,
            // otherwise the queues would never close
            drop(work_tx);
            drop(work_rx);
            drop(result_tx);

            Collector::new(reporter, &coordinator).drain(result_rx)
        });

        let completion = coordinator.finish()?;
        let status = if cancel.is_cancelled() {
            ScanStatus::Cancelled
        } else {
            ScanStatus::Completed
        };

        let stats = ScanStats {
            files_hashed: collected.records.len(),
            files_failed: collected.failures.len(),
            files_abandoned: completion.abandoned,
            bytes_hashed: collected.bytes_hashed,
            duration: start_time.elapsed(),
        };

        info!(
            hashed = stats.files_hashed,
            failed = stats.files_failed,
            abandoned = stats.files_abandoned,
            bytes = stats.bytes_hashed,
            elapsed_ms = stats.duration.as_millis() as u64,
            cancelled = status == ScanStatus::Cancelled,
            "scan finished"
        );

        Ok(ScanReport {
            status,
            stats,
            records: collected.records,
            failures: collected.failures,
        })
    }
}

impl Default for ScanEngine {
    fn default() -> Self {
        Self::new(DigestRegistry::builtin())
    }
}

/// Register a unit with the coordinator, then make it visible on a queue
fn submit<T>(coordinator: &Coordinator, queue: &Sender<T>, item: T) -> ControlFlow<()> {
    coordinator.register();
    if queue.send(item).is_err() {
        coordinator.withdraw();
        return ControlFlow::Break(());
    }
    ControlFlow::Continue(())
}

/// Scan with the built-in algorithms and no reporting
///
/// Returns the successfully hashed files; failures are only logged.
pub fn scan(config: &ScanConfig) -> Result<Vec<FileRecord>, ScanError> {
    ScanEngine::default()
        .scan(config, &mut NullReporter, &CancelToken::new())
        .map(|report| report.records)
}

// Tests moved to tests/scan/engine_tests.rs
