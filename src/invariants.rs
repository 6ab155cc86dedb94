//! Debug assertion macros for channel-core invariants.
//!
//! These are only active in debug builds (`#[cfg(debug_assertions)]`), so
//! there is zero overhead in release builds. Ported from the ring-buffer
//! crate this one is grounded on, retargeted at the slot-sequenced core
//! instead of a single-producer ring.

/// INV-LEN-01: length never exceeds capacity.
///
/// Used in: `Channel::len` after computing a snapshot length.
macro_rules! debug_assert_bounded_count {
    ($count:expr, $capacity:expr) => {
        debug_assert!(
            $count <= $capacity,
            "INV-LEN-01 violated: length {} exceeds capacity {}",
            $count,
            $capacity
        )
    };
}

/// INV-SLOT-01: a slot index computed from a cursor is always within bounds.
///
/// Used in: producer/consumer acquire-slot, right after decoding a cursor.
macro_rules! debug_assert_index_in_bounds {
    ($index:expr, $capacity:expr) => {
        debug_assert!(
            ($index as usize) < $capacity,
            "INV-SLOT-01 violated: index {} out of bounds for capacity {}",
            $index,
            $capacity
        )
    };
}

/// INV-MONO-01: within a single lap, a cursor's index only ever moves
/// forward. A lap change is exempt (the index resets to 0 by design).
///
/// Used in: producer/consumer acquire-slot, right after a cursor CAS
/// succeeds.
macro_rules! debug_assert_monotonic {
    ($old_lap:expr, $old_index:expr, $new_lap:expr, $new_index:expr) => {
        debug_assert!(
            $new_lap != $old_lap || $new_index > $old_index,
            "INV-MONO-01 violated: cursor moved backwards within a lap ({}, {}) -> ({}, {})",
            $old_lap,
            $old_index,
            $new_lap,
            $new_index
        )
    };
}

pub(crate) use debug_assert_bounded_count;
pub(crate) use debug_assert_index_in_bounds;
pub(crate) use debug_assert_monotonic;
