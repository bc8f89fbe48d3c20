//! A single worker: one queue, one thread, one designated steal donor.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crate::metrics::Metrics;
use crate::ring::RingQueue;
use crate::task::InlineCallable;

pub(crate) type Task = InlineCallable<128>;
type Callback = Arc<dyn Fn(usize) + Send + Sync>;

/// Owns one ring queue, one OS thread, and the atomic flag that tells that
/// thread to stop. Lifecycle: constructed running; `stop()` is single-use.
pub(crate) struct Worker {
    queue: Arc<RingQueue<Task>>,
    metrics: Arc<Metrics>,
    running: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl Worker {
    /// Spawns the worker thread. `donor` is the sibling queue this worker
    /// steals from on a local miss; for a single-worker pool it is this
    /// worker's own queue, making steal a safe no-op on empty.
    pub(crate) fn spawn(
        id: usize,
        queue: Arc<RingQueue<Task>>,
        metrics: Arc<Metrics>,
        donor: Arc<RingQueue<Task>>,
        donor_metrics: Arc<Metrics>,
        on_start: Callback,
        on_stop: Callback,
        idle_backoff: Duration,
    ) -> std::io::Result<Self> {
        let running = Arc::new(AtomicBool::new(true));
        let running_in_thread = Arc::clone(&running);
        let queue_in_thread = Arc::clone(&queue);
        let metrics_in_thread = Arc::clone(&metrics);

        let handle = thread::Builder::new()
            .name(format!("ringpool-worker-{id}"))
            .spawn(move || {
                dispatch_loop(
                    id,
                    queue_in_thread,
                    metrics_in_thread,
                    donor,
                    donor_metrics,
                    running_in_thread,
                    on_start,
                    on_stop,
                    idle_backoff,
                )
            })?;

        Ok(Self {
            queue,
            metrics,
            running,
            handle: Some(handle),
        })
    }

    /// Attempts to push a task directly onto this worker's own queue.
    pub(crate) fn post(&self, task: Task) -> bool {
        if self.queue.push(task) {
            self.metrics.record_submitted();
            true
        } else {
            self.metrics.record_rejected();
            false
        }
    }

    pub(crate) fn queue(&self) -> &Arc<RingQueue<Task>> {
        &self.queue
    }

    pub(crate) fn metrics(&self) -> &Arc<Metrics> {
        &self.metrics
    }

    /// Signals the dispatch loop to exit without waiting for it. Safe to
    /// call more than once.
    pub(crate) fn signal_stop(&self) {
        self.running.store(false, Ordering::Relaxed);
    }

    /// Waits for the thread to exit. Single-use; a second call is a no-op
    /// (the handle is already `None`).
    pub(crate) fn join(&mut self) {
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }

    /// Signals and joins in one call, for callers that don't need the
    /// two-phase "signal everyone, then join everyone" shutdown the pool
    /// uses to bound total teardown latency.
    pub(crate) fn stop(&mut self) {
        self.signal_stop();
        self.join();
    }
}

#[allow(clippy::too_many_arguments)]
fn dispatch_loop(
    id: usize,
    queue: Arc<RingQueue<Task>>,
    metrics: Arc<Metrics>,
    donor: Arc<RingQueue<Task>>,
    donor_metrics: Arc<Metrics>,
    running: Arc<AtomicBool>,
    on_start: Callback,
    on_stop: Callback,
    idle_backoff: Duration,
) {
    let _ = catch_unwind(AssertUnwindSafe(|| on_start(id)));

    while running.load(Ordering::Relaxed) {
        if let Some(task) = queue.pop() {
            metrics.record_executed();
            let _ = catch_unwind(AssertUnwindSafe(|| {
                let _ = task.invoke(id);
            }));
        } else if let Some(task) = donor.pop() {
            donor_metrics.record_stolen();
            donor_metrics.record_executed();
            let _ = catch_unwind(AssertUnwindSafe(|| {
                let _ = task.invoke(id);
            }));
        } else {
            thread::sleep(idle_backoff);
        }
    }

    let _ = catch_unwind(AssertUnwindSafe(|| on_stop(id)));
}
