//! ringpool-rs — a fixed-size worker pool for short, non-blocking tasks.
//!
//! A single logical queue is sharded into one bounded lock-free MPMC ring
//! per worker. Producers push onto a worker chosen round-robin and never
//! block; each worker pops from its own queue first and falls back to
//! stealing from exactly one designated sibling before idling.
//!
//! # Key properties
//!
//! - Lock-free submission: `post`/`process` never block, only ever fail
//!   with a full queue.
//! - No heap allocation per task: callables are moved into fixed inline
//!   storage (see [`task`]).
//! - Single-donor stealing instead of a full work-stealing deque: each
//!   worker steals only from `(id + 1) % threads_count`.
//! - Worker threads survive task panics; `process`/`process_with_id`
//!   surface them through the returned future instead.
//!
//! # Example
//!
//! ```
//! use ringpool_rs::ThreadPoolOptions;
//!
//! let pool = ThreadPoolOptions::new()
//!     .threads_count(4)
//!     .queue_size(1024)
//!     .build()
//!     .unwrap();
//!
//! // Fire-and-forget.
//! pool.post(|| println!("ran on some worker"));
//!
//! // Await a result.
//! let future = pool.process(|| 2 + 2);
//! assert_eq!(future.get().unwrap(), 4);
//! ```

mod backoff;
mod config;
mod error;
mod future;
mod invariants;
mod metrics;
mod pool;
mod reservation;
mod ring;
mod task;
mod worker;

pub use config::ThreadPoolOptions;
pub use error::{FutureError, PoolError, TaskError};
pub use future::PoolFuture;
pub use metrics::PoolMetrics;
pub use pool::Pool;
