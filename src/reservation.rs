use crate::ring::RingQueue;

/// A slot claimed via [`RingQueue::try_reserve`], not yet visible to
/// consumers.
///
/// Adapted from the ring library's zero-copy `Reservation` (which splits a
/// single-producer `reserve()`/`commit()` pair around a writable slice).
/// Here the queue is genuinely multi-producer, so the slot is claimed via
/// CAS on `enqueue_pos` *before* the reservation is handed back; committing
/// only writes the value and publishes the slot's sequence number. This
/// lets a caller decide a task was admitted before constructing the task
/// itself, which the future adapter relies on to distinguish `QueueFull`
/// from `BrokenPromise` (see `crate::future`).
///
/// A `Reservation` must be committed. It is only ever constructed
/// internally, immediately followed by a commit, so there is no public way
/// to abandon one.
pub(crate) struct Reservation<'a, T> {
    queue: &'a RingQueue<T>,
    slot_index: usize,
    pos: usize,
}

impl<'a, T> Reservation<'a, T> {
    pub(crate) fn new(queue: &'a RingQueue<T>, slot_index: usize, pos: usize) -> Self {
        Self {
            queue,
            slot_index,
            pos,
        }
    }

    pub(crate) fn commit(self, value: T) {
        self.queue.commit_reserved(self.slot_index, self.pos, value);
    }
}
