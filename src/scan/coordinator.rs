// Completion coordinator
// In-flight accounting and cancellation shared by walkers, workers and the collector
//
// Queue closure is structural: walkers own the only work-queue senders, and
// workers plus walkers own the only result-queue senders, so each queue closes
// exactly when its producers are done. The counter here tracks every file from
// the moment it is registered (before it becomes visible on a queue) until the
// collector has handled it, and must read zero once the pipeline has joined.

use super::error::ScanError;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;

/// Cloneable cancellation signal
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ask walkers to stop emitting and workers to stop after their current file
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Counts recorded by the coordinator over one scan
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CompletionSummary {
    pub registered: u64,
    pub completed: u64,
    pub abandoned: u64,
}

/// Tracks in-flight work for one scan
#[derive(Debug, Default)]
pub struct Coordinator {
    in_flight: AtomicUsize,
    registered: AtomicU64,
    completed: AtomicU64,
    abandoned: AtomicU64,
    cancel: CancelToken,
}

impl Coordinator {
    pub fn new(cancel: CancelToken) -> Self {
        Self {
            cancel,
            ..Self::default()
        }
    }

    /// Record a new unit of work. Must happen before the unit is sent on any queue.
    pub fn register(&self) {
        self.in_flight.fetch_add(1, Ordering::AcqRel);
        self.registered.fetch_add(1, Ordering::Relaxed);
    }

    /// Undo a registration whose send failed
    pub fn withdraw(&self) {
        self.release();
        self.registered.fetch_sub(1, Ordering::Relaxed);
    }

    /// The collector has handled a result
    pub fn complete(&self) {
        self.release();
        self.completed.fetch_add(1, Ordering::Relaxed);
    }

    /// A worker dropped a unit without hashing it (cancellation, or the
    /// collector went away)
    pub fn abandon(&self) {
        self.release();
        self.abandoned.fetch_add(1, Ordering::Relaxed);
    }

    fn release(&self) {
        let previous = self.in_flight.fetch_sub(1, Ordering::AcqRel);
        debug_assert!(previous > 0, "released more work than was registered");
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::Acquire)
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    pub fn cancel_token(&self) -> &CancelToken {
        &self.cancel
    }

    /// Check the drain invariant once every pipeline thread has joined
    pub fn finish(&self) -> Result<CompletionSummary, ScanError> {
        let in_flight = self.in_flight();
        if in_flight != 0 {
            return Err(ScanError::Incomplete { in_flight });
        }
        Ok(CompletionSummary {
            registered: self.registered.load(Ordering::Relaxed),
            completed: self.completed.load(Ordering::Relaxed),
            abandoned: self.abandoned.load(Ordering::Relaxed),
        })
    }
}
