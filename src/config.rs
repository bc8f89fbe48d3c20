use std::sync::Arc;
use std::time::Duration;

use crate::pool::Pool;
use crate::PoolError;

type Callback = Arc<dyn Fn(usize) + Send + Sync>;

fn noop_callback() -> Callback {
    Arc::new(|_id: usize| {})
}

/// Construction options for a [`Pool`].
///
/// Mirrors the ring library's `Config` in spirit (a plain struct with a
/// sensible `Default`), but exposed as a builder since `on_start`/`on_stop`
/// are not `const`-constructible values.
#[derive(Clone)]
pub struct ThreadPoolOptions {
    pub(crate) threads_count: usize,
    pub(crate) queue_size: usize,
    pub(crate) on_start: Callback,
    pub(crate) on_stop: Callback,
    pub(crate) idle_backoff: Duration,
}

impl ThreadPoolOptions {
    /// Starts from [`ThreadPoolOptions::default`].
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the number of workers. Clamped to a minimum of 1.
    pub fn threads_count(mut self, n: usize) -> Self {
        self.threads_count = n.max(1);
        self
    }

    /// Sets each worker's queue capacity (rounded up to a power of two ≥ 2
    /// by the ring queue).
    pub fn queue_size(mut self, n: usize) -> Self {
        self.queue_size = n;
        self
    }

    /// Registers a callback invoked exactly once on each worker thread
    /// before it begins popping tasks.
    pub fn on_start<F: Fn(usize) + Send + Sync + 'static>(mut self, f: F) -> Self {
        self.on_start = Arc::new(f);
        self
    }

    /// Registers a callback invoked exactly once on each worker thread
    /// after its dispatch loop exits.
    pub fn on_stop<F: Fn(usize) + Send + Sync + 'static>(mut self, f: F) -> Self {
        self.on_stop = Arc::new(f);
        self
    }

    /// Sets the fixed sleep duration a worker backs off for when both its
    /// own queue and its donor's queue are empty. Default: 1 ms.
    pub fn idle_backoff(mut self, d: Duration) -> Self {
        self.idle_backoff = d;
        self
    }

    /// Builds the pool, starting all worker threads.
    pub fn build(self) -> Result<Pool, PoolError> {
        Pool::new(self)
    }
}

impl Default for ThreadPoolOptions {
    fn default() -> Self {
        let threads_count = std::thread::available_parallelism()
            .map(std::num::NonZeroUsize::get)
            .unwrap_or(1);
        Self {
            threads_count,
            queue_size: 1024,
            on_start: noop_callback(),
            on_stop: noop_callback(),
            idle_backoff: Duration::from_millis(1),
        }
    }
}
