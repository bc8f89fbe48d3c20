//! Bounded, lock-free, multi-producer/multi-consumer ring queue.
//!
//! =============================================================================
//! MEMORY ORDERING & SYNCHRONIZATION STRATEGY
//! =============================================================================
//!
//! This is the classic Vyukov bounded MPMC queue: each slot carries its own
//! sequence counter instead of relying on a single pair of cursors to also
//! encode slot ownership. That is what lets multiple producers (and
//! multiple consumers) race on the same ring without a lock.
//!
//! Slot `i` starts with `sequence == i`. A producer claims a slot by reading
//! the slot at `enqueue_pos & mask`, checking `sequence - pos == 0`, and
//! winning a CAS on `enqueue_pos` from `pos` to `pos + 1`. It then writes the
//! value and publishes it with `sequence.store(pos + 1, Release)`. A
//! consumer claims a slot symmetrically, checking `sequence - (pos + 1) ==
//! 0`, winning a CAS on `dequeue_pos`, reading the value, and republishing
//! the slot for the next lap with `sequence.store(pos + capacity, Release)`.
//!
//! The acquire load of `sequence` before a CAS attempt synchronizes with the
//! release store that last wrote it, so by the time a producer or consumer
//! wins its CAS, the slot's previous occupant (value bytes, prior sequence)
//! is fully visible. No two successful dequeues can observe the same
//! sequence value, because advancing `dequeue_pos` is itself a CAS.
//!
//! `enqueue_pos` and `dequeue_pos` live on their own cache lines
//! (`CacheAligned`) so producers and consumers hammering on different
//! cursors don't false-share.

use std::cell::UnsafeCell;
use std::mem::MaybeUninit;
use std::ptr;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::backoff::Backoff;
use crate::invariants::{
    debug_assert_bounded_count, debug_assert_monotonic, debug_assert_slot_sequence,
};
use crate::reservation::Reservation;

#[repr(align(128))]
struct CacheAligned<T> {
    value: T,
}

impl<T> CacheAligned<T> {
    const fn new(value: T) -> Self {
        Self { value }
    }
}

impl<T> std::ops::Deref for CacheAligned<T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        &self.value
    }
}

struct Slot<T> {
    sequence: AtomicUsize,
    value: UnsafeCell<MaybeUninit<T>>,
}

/// A bounded MPMC queue of capacity `C`, rounded up to a power of two ≥ 2.
pub(crate) struct RingQueue<T> {
    mask: usize,
    buffer: Box<[Slot<T>]>,
    enqueue_pos: CacheAligned<AtomicUsize>,
    dequeue_pos: CacheAligned<AtomicUsize>,
}

unsafe impl<T: Send> Send for RingQueue<T> {}
unsafe impl<T: Send> Sync for RingQueue<T> {}

impl<T> RingQueue<T> {
    /// Creates a queue whose capacity is `requested.max(2)` rounded up to
    /// the next power of two.
    pub(crate) fn new(requested: usize) -> Self {
        let capacity = requested.max(2).next_power_of_two();
        let mut buffer = Vec::with_capacity(capacity);
        for i in 0..capacity {
            buffer.push(Slot {
                sequence: AtomicUsize::new(i),
                value: UnsafeCell::new(MaybeUninit::uninit()),
            });
        }
        Self {
            mask: capacity - 1,
            buffer: buffer.into_boxed_slice(),
            enqueue_pos: CacheAligned::new(AtomicUsize::new(0)),
            dequeue_pos: CacheAligned::new(AtomicUsize::new(0)),
        }
    }

    pub(crate) fn capacity(&self) -> usize {
        self.mask + 1
    }

    /// Approximate resident count; exact only absent concurrent producers
    /// and consumers (the cursors are read independently, non-atomically
    /// paired).
    pub(crate) fn len(&self) -> usize {
        let tail = self.enqueue_pos.load(Ordering::Relaxed);
        let head = self.dequeue_pos.load(Ordering::Relaxed);
        tail.wrapping_sub(head).min(self.capacity())
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub(crate) fn is_full(&self) -> bool {
        self.len() >= self.capacity()
    }

    /// Attempts to claim a slot without writing a value into it yet.
    /// Returns `None` if the queue was observed full.
    pub(crate) fn try_reserve(&self) -> Option<Reservation<'_, T>> {
        let (slot_index, pos) = self.claim_enqueue_slot()?;
        Some(Reservation::new(self, slot_index, pos))
    }

    /// Writes `value` into a slot already claimed by `try_reserve` and
    /// publishes it. Called only by `Reservation::commit`.
    pub(crate) fn commit_reserved(&self, slot_index: usize, pos: usize, value: T) {
        let slot = &self.buffer[slot_index];
        debug_assert_slot_sequence!(pos, slot.sequence.load(Ordering::Relaxed));
        unsafe { (*slot.value.get()).write(value) };
        let new_seq = pos.wrapping_add(1);
        debug_assert_monotonic!("enqueue sequence", pos, new_seq);
        slot.sequence.store(new_seq, Ordering::Release);
    }

    fn claim_enqueue_slot(&self) -> Option<(usize, usize)> {
        let mut backoff = Backoff::new();
        let mut pos = self.enqueue_pos.load(Ordering::Relaxed);
        loop {
            let slot_index = pos & self.mask;
            let slot = &self.buffer[slot_index];
            let seq = slot.sequence.load(Ordering::Acquire);
            let diff = (seq as isize) - (pos as isize);
            match diff.cmp(&0) {
                std::cmp::Ordering::Equal => {
                    match self.enqueue_pos.compare_exchange_weak(
                        pos,
                        pos.wrapping_add(1),
                        Ordering::Relaxed,
                        Ordering::Relaxed,
                    ) {
                        Ok(_) => {
                            debug_assert_bounded_count!(self.len(), self.capacity());
                            return Some((slot_index, pos));
                        }
                        Err(current) => {
                            pos = current;
                            backoff.spin();
                        }
                    }
                }
                std::cmp::Ordering::Less => return None,
                std::cmp::Ordering::Greater => {
                    pos = self.enqueue_pos.load(Ordering::Relaxed);
                    backoff.spin();
                }
            }
        }
    }

    /// Pushes `value` onto the queue. Returns `false` without blocking if
    /// the queue is full.
    pub(crate) fn push(&self, value: T) -> bool {
        match self.claim_enqueue_slot() {
            None => false,
            Some((slot_index, pos)) => {
                self.commit_reserved(slot_index, pos, value);
                true
            }
        }
    }

    /// Pops the oldest value. Returns `None` without blocking if the queue
    /// is empty.
    pub(crate) fn pop(&self) -> Option<T> {
        let mut backoff = Backoff::new();
        let mut pos = self.dequeue_pos.load(Ordering::Relaxed);
        loop {
            let slot_index = pos & self.mask;
            let slot = &self.buffer[slot_index];
            let seq = slot.sequence.load(Ordering::Acquire);
            let diff = (seq as isize) - (pos as isize + 1);
            match diff.cmp(&0) {
                std::cmp::Ordering::Equal => {
                    match self.dequeue_pos.compare_exchange_weak(
                        pos,
                        pos.wrapping_add(1),
                        Ordering::Relaxed,
                        Ordering::Relaxed,
                    ) {
                        Ok(_) => {
                            debug_assert_slot_sequence!(
                                pos.wrapping_add(1),
                                slot.sequence.load(Ordering::Relaxed)
                            );
                            let value = unsafe { (*slot.value.get()).assume_init_read() };
                            let new_seq = pos.wrapping_add(self.mask).wrapping_add(1);
                            slot.sequence.store(new_seq, Ordering::Release);
                            return Some(value);
                        }
                        Err(current) => {
                            pos = current;
                            backoff.spin();
                        }
                    }
                }
                std::cmp::Ordering::Less => return None,
                std::cmp::Ordering::Greater => {
                    pos = self.dequeue_pos.load(Ordering::Relaxed);
                    backoff.spin();
                }
            }
        }
    }
}

impl<T> Drop for RingQueue<T> {
    fn drop(&mut self) {
        // No concurrent producers/consumers are assumed at drop time (the
        // pool joins every worker thread before dropping its queues), so
        // plain loads suffice.
        let head = *self.dequeue_pos.get_mut();
        let tail = *self.enqueue_pos.get_mut();
        let mut pos = head;
        while pos != tail {
            let slot_index = pos & self.mask;
            let slot = &mut self.buffer[slot_index];
            if *slot.sequence.get_mut() == pos.wrapping_add(1) {
                unsafe { ptr::drop_in_place((*slot.value.get()).as_mut_ptr()) };
            }
            pos = pos.wrapping_add(1);
        }
    }
}
