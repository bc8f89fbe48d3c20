use std::sync::atomic::{AtomicU64, Ordering};

/// Atomic counters backing [`PoolMetrics`], one set per worker queue.
#[derive(Default)]
pub(crate) struct Metrics {
    submitted: AtomicU64,
    rejected: AtomicU64,
    executed: AtomicU64,
    stolen: AtomicU64,
}

impl Metrics {
    pub(crate) fn record_submitted(&self) {
        self.submitted.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_rejected(&self) {
        self.rejected.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_executed(&self) {
        self.executed.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_stolen(&self) {
        self.stolen.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn snapshot(&self) -> PoolMetrics {
        PoolMetrics {
            tasks_submitted: self.submitted.load(Ordering::Relaxed),
            tasks_rejected: self.rejected.load(Ordering::Relaxed),
            tasks_executed: self.executed.load(Ordering::Relaxed),
            tasks_stolen: self.stolen.load(Ordering::Relaxed),
        }
    }
}

/// A point-in-time snapshot of a pool's task counters.
///
/// This is the crate's zero-overhead-when-unread observability surface: no
/// logging is emitted from the dispatch loop, but callers that want
/// visibility can poll this at any time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PoolMetrics {
    /// Tasks successfully admitted onto a worker's queue.
    pub tasks_submitted: u64,
    /// Tasks rejected because the chosen worker's queue was full.
    pub tasks_rejected: u64,
    /// Tasks actually invoked by a worker.
    pub tasks_executed: u64,
    /// Tasks popped via a steal rather than a local pop.
    pub tasks_stolen: u64,
}

impl PoolMetrics {
    pub(crate) fn merge(self, other: PoolMetrics) -> PoolMetrics {
        PoolMetrics {
            tasks_submitted: self.tasks_submitted + other.tasks_submitted,
            tasks_rejected: self.tasks_rejected + other.tasks_rejected,
            tasks_executed: self.tasks_executed + other.tasks_executed,
            tasks_stolen: self.tasks_stolen + other.tasks_stolen,
        }
    }
}
