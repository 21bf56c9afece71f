//! Power-of-two capacity sizing.
//!
//! Ring indices are computed as `cursor & (capacity - 1)`, which is only a
//! valid modulo when the capacity is a power of two. Since the cursors are
//! `u32`, any power of two up to [`MAX_CAPACITY`] divides 2^32 and masking
//! stays correct across cursor wrap-around.

/// Largest capacity a ring can hold (2^31, the largest power of two in `u32`).
pub const MAX_CAPACITY: u32 = 1 << 31;

/// Rounds `n` up to the nearest power of two.
///
/// `0` and `1` both yield `1`. Values above [`MAX_CAPACITY`] have no
/// power-of-two successor in `u32`; the bit smear wraps and returns `0`,
/// which callers treat as "no usable capacity".
#[inline]
pub const fn round_up_to_power_of_two(n: u32) -> u32 {
    if n <= 1 {
        return 1;
    }
    let mut v = n - 1;
    v |= v >> 1;
    v |= v >> 2;
    v |= v >> 4;
    v |= v >> 8;
    v |= v >> 16;
    v.wrapping_add(1)
}

/// Rounds `n` down to the nearest power of two. `0` yields `0`.
#[inline]
pub const fn round_down_to_power_of_two(n: u32) -> u32 {
    let mut v = n;
    v |= v >> 1;
    v |= v >> 2;
    v |= v >> 4;
    v |= v >> 8;
    v |= v >> 16;
    // v is now 2^k - 1 with k = bit length of n; (v >> 1) + 1 == 2^(k-1)
    if v == 0 {
        0
    } else {
        (v >> 1) + 1
    }
}

/// Effective ring capacity for a requested size.
///
/// Powers of two (and `0`) are kept as-is, anything else is rounded up.
/// Returns `None` when the rounded size does not fit in `u32`.
#[inline]
pub(crate) const fn effective_capacity(requested: u32) -> Option<u32> {
    if requested == 0 || requested.is_power_of_two() {
        return Some(requested);
    }
    match round_up_to_power_of_two(requested) {
        0 => None,
        cap => Some(cap),
    }
}
