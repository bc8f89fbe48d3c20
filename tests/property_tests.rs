//! Property-based tests for `Pool`'s externally observable contract.
//!
//! The ring queue's own quantified invariants (bounded count, no element
//! observed by two dequeues, monotonic cursors) are exercised directly
//! against `RingQueue` in `src/ring.rs`'s unit tests, since that type is
//! crate-private. These tests instead cover the Pool-level scenarios that
//! are only reachable through the public `Pool` API.

use proptest::prelude::*;
use ringpool_rs::{FutureError, ThreadPoolOptions};
use std::sync::Arc;
use std::time::Duration;

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// `process(|| v).get() == Ok(v)` for any comparable value the
    /// callable returns.
    #[test]
    fn process_round_trips_arbitrary_values(v in any::<i64>()) {
        let pool = ThreadPoolOptions::new().threads_count(2).build().unwrap();
        let result = pool.process(move || v).get();
        prop_assert_eq!(result, Ok(v));
    }

    /// A panic raised inside `process(f)` is retrievable exactly once via
    /// the returned future, carrying the panic's message.
    #[test]
    fn process_panic_is_retrievable_with_its_message(msg in "[a-zA-Z0-9 ]{1,40}") {
        let pool = ThreadPoolOptions::new().threads_count(2).build().unwrap();
        let m = msg.clone();
        let future: ringpool_rs::PoolFuture<()> = pool.process(move || panic!("{m}"));
        match future.get() {
            Err(FutureError::TaskFailure(observed)) => prop_assert!(observed.contains(msg.as_str())),
            other => prop_assert!(false, "expected TaskFailure, got {:?}", other),
        }
    }

    /// `queue_size` is always rounded up to a usable capacity: for any
    /// requested size in a small range, a pool built with it accepts at
    /// least one task immediately after construction.
    #[test]
    fn any_requested_queue_size_yields_a_working_pool(requested in 1usize..64) {
        let pool = ThreadPoolOptions::new()
            .threads_count(1)
            .queue_size(requested)
            .build()
            .unwrap();
        prop_assert!(pool.post(|| {}));
    }

    /// For any sequence of immediately-resolving `process` calls fired at
    /// a multi-worker pool, every one of them eventually resolves (none
    /// are lost), and the sum of returned values matches what was sent.
    #[test]
    fn a_batch_of_process_calls_all_resolve(values in prop::collection::vec(any::<i32>(), 0..32)) {
        let pool = ThreadPoolOptions::new()
            .threads_count(4)
            .queue_size(256)
            .build()
            .unwrap();

        let futures: Vec<_> = values
            .iter()
            .copied()
            .map(|v| pool.process(move || v))
            .collect();

        let mut observed = Vec::with_capacity(futures.len());
        for f in futures {
            let got = f
                .get_timeout(Duration::from_secs(2))
                .expect("every submission should resolve within 2s");
            observed.push(got.expect("pure callable should not fail"));
        }
        prop_assert_eq!(observed, values);
    }
}

/// threads_count = 1 is a boundary case (self-steal donor); confirm it
/// behaves like any other pool under a moderate burst of submissions.
#[test]
fn single_worker_pool_handles_a_burst() {
    let pool = Arc::new(
        ThreadPoolOptions::new()
            .threads_count(1)
            .queue_size(128)
            .build()
            .unwrap(),
    );
    let futures: Vec<_> = (0..64).map(|i| pool.process(move || i * 2)).collect();
    for (i, f) in futures.into_iter().enumerate() {
        assert_eq!(f.get(), Ok(i as i32 * 2));
    }
}
