//! The pool: owns a ring of [`Worker`]s, routes submissions round-robin,
//! and tears everything down on drop.

use std::any::Any;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use crate::config::ThreadPoolOptions;
use crate::error::{FutureError, PoolError};
use crate::future::{self, PoolFuture};
use crate::metrics::{Metrics, PoolMetrics};
use crate::ring::RingQueue;
use crate::worker::{Task, Worker};

/// A fixed-size worker pool. Each worker owns a bounded MPMC queue and
/// steals from exactly one sibling (`(id + 1) % threads_count`) when its
/// own queue is empty. Construction starts every worker thread; dropping
/// the pool stops and joins all of them.
pub struct Pool {
    workers: Vec<Worker>,
    next: AtomicUsize,
}

impl Pool {
    /// Builds a pool from `options`, starting every worker thread before
    /// returning. If any worker fails to start, the workers already
    /// started are stopped and joined before the error is returned.
    pub fn new(options: ThreadPoolOptions) -> Result<Self, PoolError> {
        let n = options.threads_count;
        let queues: Vec<Arc<RingQueue<Task>>> = (0..n)
            .map(|_| Arc::new(RingQueue::new(options.queue_size)))
            .collect();
        let metrics: Vec<Arc<Metrics>> = (0..n).map(|_| Arc::new(Metrics::default())).collect();

        let mut workers = Vec::with_capacity(n);
        for id in 0..n {
            let donor_id = (id + 1) % n;
            let spawned = Worker::spawn(
                id,
                Arc::clone(&queues[id]),
                Arc::clone(&metrics[id]),
                Arc::clone(&queues[donor_id]),
                Arc::clone(&metrics[donor_id]),
                Arc::clone(&options.on_start),
                Arc::clone(&options.on_stop),
                options.idle_backoff,
            );
            match spawned {
                Ok(worker) => workers.push(worker),
                Err(io_err) => {
                    for mut worker in workers {
                        worker.stop();
                    }
                    return Err(PoolError::ThreadStartFailure(io_err));
                }
            }
        }

        Ok(Self {
            workers,
            next: AtomicUsize::new(0),
        })
    }

    /// Number of workers this pool was constructed with.
    pub fn threads_count(&self) -> usize {
        self.workers.len()
    }

    /// Aggregate submitted/rejected/executed/stolen counters across every
    /// worker's queue.
    pub fn metrics(&self) -> PoolMetrics {
        self.workers
            .iter()
            .map(|w| w.metrics().snapshot())
            .fold(PoolMetrics::default(), PoolMetrics::merge)
    }

    fn next_worker(&self) -> usize {
        self.next.fetch_add(1, Ordering::Relaxed) % self.workers.len()
    }

    /// Submits a nullary task. Returns `false` iff the chosen worker's
    /// queue was full; no retry is attempted on another worker.
    pub fn post<F>(&self, f: F) -> bool
    where
        F: FnOnce() + Send + 'static,
    {
        let id = self.next_worker();
        self.workers[id].post(Task::from_nullary(f))
    }

    /// Submits a task that receives the id of the worker that ends up
    /// running it.
    pub fn post_with_id<F>(&self, f: F) -> bool
    where
        F: FnOnce(usize) + Send + 'static,
    {
        let id = self.next_worker();
        self.workers[id].post(Task::new(f))
    }

    /// Submits a callable and returns a future over its result. Admission
    /// is decided before the task (and the promise it closes over) is
    /// constructed, so a full queue is reported as `QueueFull` rather than
    /// `BrokenPromise`.
    pub fn process<F, R>(&self, f: F) -> PoolFuture<R>
    where
        F: FnOnce() -> R + Send + 'static,
        R: Send + 'static,
    {
        let id = self.next_worker();
        let worker = &self.workers[id];
        let Some(reservation) = worker.queue().try_reserve() else {
            worker.metrics().record_rejected();
            return future::failed(FutureError::QueueFull);
        };

        let (promise, result) = future::channel();
        let task = Task::from_nullary(move || match catch_unwind(AssertUnwindSafe(f)) {
            Ok(value) => promise.complete(Ok(value)),
            Err(payload) => promise.complete(Err(FutureError::TaskFailure(panic_message(
                &*payload,
            )))),
        });
        reservation.commit(task);
        worker.metrics().record_submitted();
        result
    }

    /// Like [`Pool::process`], but the callable receives the id of the
    /// worker that runs it.
    pub fn process_with_id<F, R>(&self, f: F) -> PoolFuture<R>
    where
        F: FnOnce(usize) -> R + Send + 'static,
        R: Send + 'static,
    {
        let id = self.next_worker();
        let worker = &self.workers[id];
        let Some(reservation) = worker.queue().try_reserve() else {
            worker.metrics().record_rejected();
            return future::failed(FutureError::QueueFull);
        };

        let (promise, result) = future::channel();
        let task = Task::new(move |worker_id| match catch_unwind(AssertUnwindSafe(move || {
            f(worker_id)
        })) {
            Ok(value) => promise.complete(Ok(value)),
            Err(payload) => promise.complete(Err(FutureError::TaskFailure(panic_message(
                &*payload,
            )))),
        });
        reservation.commit(task);
        worker.metrics().record_submitted();
        result
    }
}

/// Best-effort extraction of a human-readable message from a caught panic
/// payload; `std::panic`'s default hook only guarantees `&str` or `String`.
fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "task panicked with a non-string payload".to_string()
    }
}

impl Drop for Pool {
    /// Signals every worker to stop before joining any of them, so total
    /// teardown latency is bounded by the slowest single worker's idle
    /// back-off rather than the sum across all workers.
    fn drop(&mut self) {
        for worker in &mut self.workers {
            worker.signal_stop();
        }
        for worker in &mut self.workers {
            worker.join();
        }
    }
}
