//! The future/promise adapter: turns a returning callable into a void task
//! plus a single-assignment value sink the caller can block on.

use std::sync::{Arc, Condvar, Mutex};
use std::time::Duration;

use crate::error::FutureError;

enum State<R> {
    Pending,
    Ready(Result<R, FutureError>),
}

struct Shared<R> {
    state: Mutex<State<R>>,
    condvar: Condvar,
}

impl<R> Shared<R> {
    fn pending() -> Arc<Self> {
        Arc::new(Self {
            state: Mutex::new(State::Pending),
            condvar: Condvar::new(),
        })
    }

    /// Sets the result if still pending; a no-op once already settled
    /// (satisfiable exactly once).
    fn settle(&self, result: Result<R, FutureError>) {
        let mut guard = self.state.lock().unwrap_or_else(|p| p.into_inner());
        if matches!(*guard, State::Pending) {
            *guard = State::Ready(result);
            self.condvar.notify_all();
        }
    }
}

/// The task-side half of the adapter: moved into the Task's closure. If
/// dropped before `complete` runs (the Task was destroyed unexecuted), the
/// sink is settled with `BrokenPromise`.
pub(crate) struct Promise<R> {
    shared: Arc<Shared<R>>,
}

impl<R> Promise<R> {
    fn new(shared: Arc<Shared<R>>) -> Self {
        Self { shared }
    }

    pub(crate) fn complete(self, result: Result<R, FutureError>) {
        self.shared.settle(result);
    }
}

impl<R> Drop for Promise<R> {
    fn drop(&mut self) {
        self.shared.settle(Err(FutureError::BrokenPromise));
    }
}

/// The caller-side handle returned by `Pool::process`/`process_with_id`.
pub struct PoolFuture<R> {
    shared: Arc<Shared<R>>,
}

impl<R> PoolFuture<R> {
    fn new(shared: Arc<Shared<R>>) -> Self {
        Self { shared }
    }

    /// Blocks until the sink is settled and returns the result, consuming
    /// the future (it is read exactly once).
    pub fn get(self) -> Result<R, FutureError> {
        let mut guard = self.shared.state.lock().unwrap_or_else(|p| p.into_inner());
        loop {
            match &*guard {
                State::Ready(_) => break,
                State::Pending => {
                    guard = self
                        .shared
                        .condvar
                        .wait(guard)
                        .unwrap_or_else(|p| p.into_inner());
                }
            }
        }
        take_ready(&mut guard)
    }

    /// Blocks up to `timeout`, returning `None` if the sink is still
    /// pending when the deadline elapses.
    pub fn get_timeout(self, timeout: Duration) -> Option<Result<R, FutureError>> {
        let mut guard = self.shared.state.lock().unwrap_or_else(|p| p.into_inner());
        let mut remaining = timeout;
        loop {
            match &*guard {
                State::Ready(_) => return Some(take_ready(&mut guard)),
                State::Pending => {
                    let (next_guard, wait_result) = self
                        .shared
                        .condvar
                        .wait_timeout(guard, remaining)
                        .unwrap_or_else(|p| p.into_inner());
                    guard = next_guard;
                    if wait_result.timed_out() && matches!(*guard, State::Pending) {
                        return None;
                    }
                    remaining = remaining.saturating_sub(Duration::from_millis(1));
                }
            }
        }
    }
}

fn take_ready<R>(guard: &mut State<R>) -> Result<R, FutureError> {
    match std::mem::replace(guard, State::Ready(Err(FutureError::BrokenPromise))) {
        State::Ready(result) => result,
        State::Pending => unreachable!("take_ready called while still pending"),
    }
}

/// Builds a connected `(Promise, PoolFuture)` pair.
pub(crate) fn channel<R>() -> (Promise<R>, PoolFuture<R>) {
    let shared = Shared::pending();
    (
        Promise::new(Arc::clone(&shared)),
        PoolFuture::new(shared),
    )
}

/// Builds a `PoolFuture` alone, for the admission-failure path where no
/// `Promise` (and thus no task closure) is ever constructed.
pub(crate) fn failed<R>(err: FutureError) -> PoolFuture<R> {
    let shared = Shared::pending();
    shared.settle(Err(err));
    PoolFuture::new(shared)
}
