//! Debug-only assertion macros for ring queue invariants.
//!
//! Active only under `#[cfg(debug_assertions)]`, so there is zero overhead
//! in release builds. Used by [`crate::ring::RingQueue`].

/// Assert that the number of resident elements never exceeds capacity.
macro_rules! debug_assert_bounded_count {
    ($count:expr, $capacity:expr) => {
        debug_assert!(
            $count <= $capacity,
            "resident count {} exceeds capacity {}",
            $count,
            $capacity
        )
    };
}

/// Assert that a cursor only moves forward between two observations
/// (accounting for wraparound via a generous slack bound).
macro_rules! debug_assert_monotonic {
    ($name:literal, $old:expr, $new:expr) => {
        debug_assert!(
            $new >= $old || $old.wrapping_sub($new) > (1usize << 32),
            "{} moved backwards from {} to {}",
            $name,
            $old,
            $new
        )
    };
}

/// Assert that a slot's sequence number matches what a reader/writer expects
/// immediately before it touches the slot's payload.
macro_rules! debug_assert_slot_sequence {
    ($expected:expr, $actual:expr) => {
        debug_assert_eq!(
            $expected, $actual,
            "slot sequence mismatch: expected {}, observed {}",
            $expected, $actual
        )
    };
}

pub(crate) use debug_assert_bounded_count;
pub(crate) use debug_assert_monotonic;
pub(crate) use debug_assert_slot_sequence;
