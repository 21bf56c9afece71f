//! Error types for ring construction and the back-off transfer helpers.
//!
//! The non-blocking `put` / `get` primitives never fail: they report a
//! partial count instead.

use thiserror::Error;

/// Errors returned by fallible ring operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum RingError {
    /// The requested capacity rounds up past the largest `u32` power of two.
    #[error("requested capacity {requested} exceeds the maximum ring capacity")]
    CapacityOverflow {
        /// The capacity that was asked for.
        requested: u32,
    },

    /// The ring has no storage (capacity 0).
    #[error("ring has no storage")]
    Null,

    /// The back-off budget ran out before the whole slice was transferred.
    #[error("transfer stalled after {transferred} of {requested} elements")]
    Stalled {
        /// Elements that did move before giving up.
        transferred: usize,
        /// Elements the caller asked to move.
        requested: usize,
    },
}

impl RingError {
    /// Returns `true` if retrying the operation later can succeed.
    #[inline]
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::Stalled { .. })
    }
}
