//! Multi-producer single-consumer ring.
//!
//! [`MpscRing`] wraps an [`SpscRing`] and serializes producers with a mutex.
//! The consumer side is the plain lock-free [`Consumer`]; producers and the
//! consumer still meet only through the fenced cursor protocol.

use crate::metrics::MetricsSnapshot;
use crate::ring::{Consumer, SpscRing};
use crate::{Config, RingError};
use parking_lot::Mutex;

/// Ring with any number of producer threads and one consumer thread.
#[derive(Debug)]
pub struct MpscRing<T> {
    ring: SpscRing<T>,
    producer_lock: Mutex<()>,
}

impl<T: Copy> MpscRing<T> {
    /// Creates a ring holding `size` elements, rounded up to a power of two.
    pub fn new(size: u32) -> Self {
        Self::from_ring(SpscRing::new(size))
    }

    /// Creates a ring, failing if `size` rounds past the maximum capacity.
    pub fn try_new(size: u32) -> Result<Self, RingError> {
        SpscRing::try_new(size).map(Self::from_ring)
    }

    /// Creates a ring from a [`Config`].
    pub fn with_config(config: Config) -> Self {
        Self::from_ring(SpscRing::with_config(config))
    }

    /// Creates a ring from a [`Config`], failing on capacity overflow.
    pub fn try_with_config(config: Config) -> Result<Self, RingError> {
        SpscRing::try_with_config(config).map(Self::from_ring)
    }

    fn from_ring(ring: SpscRing<T>) -> Self {
        Self {
            ring,
            producer_lock: Mutex::new(()),
        }
    }

    /// Resizes and empties the ring; `size == 0` makes it null.
    pub fn reset(&mut self, size: u32) {
        self.ring.reset(size);
    }

    /// Resizes and empties the ring, failing on capacity overflow.
    pub fn try_reset(&mut self, size: u32) -> Result<(), RingError> {
        self.ring.try_reset(size)
    }

    /// Splits into a shareable producer handle and the single consumer.
    pub fn split(&mut self) -> (MpscProducer<'_, T>, Consumer<'_, T>) {
        let this: &Self = self;
        (MpscProducer { inner: this }, Consumer::new(&this.ring))
    }

    /// Returns true if the ring has no storage (capacity 0).
    #[inline]
    pub fn is_null(&self) -> bool {
        self.ring.is_null()
    }

    /// Returns the ring buffer capacity.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.ring.capacity()
    }

    /// Returns the current number of elements in the ring.
    #[inline]
    pub fn len(&self) -> usize {
        self.ring.len()
    }

    /// Returns true if the ring is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.ring.is_empty()
    }

    /// Returns true if the ring is full.
    #[inline]
    pub fn is_full(&self) -> bool {
        self.ring.is_full()
    }

    /// Get a snapshot of metrics if enabled.
    pub fn metrics(&self) -> MetricsSnapshot {
        self.ring.metrics()
    }
}

impl<T: Copy> Default for MpscRing<T> {
    /// A null ring; size it with [`reset`](MpscRing::reset).
    fn default() -> Self {
        Self::from_ring(SpscRing::default())
    }
}

/// Producer handle of an [`MpscRing`].
///
/// Cheap to copy and safe to share: every `put` takes the producer lock.
#[derive(Debug)]
pub struct MpscProducer<'a, T> {
    inner: &'a MpscRing<T>,
}

impl<T> Clone for MpscProducer<'_, T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for MpscProducer<'_, T> {}

impl<T: Copy> MpscProducer<'_, T> {
    /// Copies as many leading elements of `src` as fit into the ring.
    ///
    /// Never waits for space, only for other producers currently inside `put`.
    pub fn put(&self, src: &[T]) -> usize {
        let _guard = self.inner.producer_lock.lock();
        // SAFETY: the producer lock makes this the only producer.
        unsafe { self.inner.ring.put(src) }
    }

    /// Puts all of `src` with backoff while full.
    ///
    /// Holds the producer lock for the whole transfer, so `src` appears
    /// contiguously in the stream.
    pub fn put_with_backoff(&self, src: &[T]) -> Result<(), RingError> {
        let _guard = self.inner.producer_lock.lock();
        // SAFETY: the producer lock makes this the only producer.
        unsafe { self.inner.ring.put_with_backoff(src) }
    }

    /// Returns the ring buffer capacity.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.inner.capacity()
    }

    /// Returns true if the ring has no storage.
    #[inline]
    pub fn is_null(&self) -> bool {
        self.inner.is_null()
    }
}
