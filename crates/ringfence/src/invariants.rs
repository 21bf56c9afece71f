//! Debug assertion macros for the cursor invariants.
//!
//! Only active in debug builds (`debug_assert!`), so release builds pay
//! nothing. Cursors are `u32` and wrap; every comparison goes through
//! `wrapping_sub` so the checks stay valid across 2^32.

// =============================================================================
// Bounded Count
// =============================================================================

/// Assert that the occupied count does not exceed capacity.
///
/// **Invariant**: `0 ≤ write.wrapping_sub(read) ≤ capacity`
///
/// Used in: `put` after advancing the write cursor
macro_rules! debug_assert_bounded_count {
    ($write:expr, $read:expr, $capacity:expr) => {
        debug_assert!(
            $write.wrapping_sub($read) <= $capacity,
            "bounded count violated: write {} read {} exceeds capacity {}",
            $write,
            $read,
            $capacity
        )
    };
}

/// Assert that the read cursor does not advance past the write cursor.
///
/// **Invariant**: `new_read.wrapping_sub(old_read) ≤ write.wrapping_sub(old_read)`
///
/// Used in: `get` before publishing the new read cursor
macro_rules! debug_assert_read_not_past_write {
    ($old_read:expr, $new_read:expr, $write:expr) => {
        debug_assert!(
            $new_read.wrapping_sub($old_read) <= $write.wrapping_sub($old_read),
            "read cursor {} advanced past write cursor {}",
            $new_read,
            $write
        )
    };
}

/// Assert that a physical slot range stays inside storage.
///
/// Used in: the two-segment copies of `put` / `get`
macro_rules! debug_assert_in_bounds {
    ($index:expr, $len:expr, $capacity:expr) => {
        debug_assert!(
            $index as usize + $len as usize <= $capacity as usize,
            "slot range {}..{} out of bounds for capacity {}",
            $index,
            $index as usize + $len as usize,
            $capacity
        )
    };
}

pub(crate) use debug_assert_bounded_count;
pub(crate) use debug_assert_in_bounds;
pub(crate) use debug_assert_read_not_past_write;
