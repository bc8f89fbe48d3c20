use thiserror::Error;

/// Error raised by a [`crate::worker::Task`] operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TaskError {
    /// Invocation was attempted on a Task holding no callable.
    #[error("invocation attempted on an empty task")]
    EmptyCallable,
}

/// Error raised while constructing a [`crate::Pool`].
#[derive(Debug, Error)]
pub enum PoolError {
    /// The OS refused to spawn a worker thread.
    #[error("failed to start worker thread: {0}")]
    ThreadStartFailure(#[from] std::io::Error),
}

/// Error delivered through a [`crate::PoolFuture`]'s sink.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FutureError {
    /// The task could not be admitted onto any worker's queue.
    #[error("submission queue was full")]
    QueueFull,
    /// The task panicked during invocation.
    #[error("task failed: {0}")]
    TaskFailure(String),
    /// The task was destroyed (e.g. pool torn down) before it ran.
    #[error("broken promise: task was dropped before it ran")]
    BrokenPromise,
}
