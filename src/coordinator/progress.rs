//! Completion progress reporting.

use std::sync::atomic::{AtomicUsize, Ordering};

/// Observes per-area completion.
///
/// Called by the coordinator's writer after each area's rows have been
/// handed to the sinks, so `completed` counts fully written areas.
pub trait ProgressObserver: Send + Sync {
    /// One more area has been written; `completed` of `total` are done.
    fn on_area_done(&self, completed: usize, total: usize);
}

/// A [`ProgressObserver`] that just remembers the latest count.
#[derive(Debug, Default)]
pub struct CountingProgress {
    completed: AtomicUsize,
    total: AtomicUsize,
}

impl CountingProgress {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of areas reported complete so far.
    pub fn completed(&self) -> usize {
        self.completed.load(Ordering::Relaxed)
    }

    /// Total number of areas, as last reported.
    pub fn total(&self) -> usize {
        self.total.load(Ordering::Relaxed)
    }
}

impl ProgressObserver for CountingProgress {
    fn on_area_done(&self, completed: usize, total: usize) {
        self.completed.store(completed, Ordering::Relaxed);
        self.total.store(total, Ordering::Relaxed);
    }
}
