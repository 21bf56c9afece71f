//! Multi-producer multi-consumer ring.
//!
//! [`MpmcRing`] wraps an [`SpscRing`] with two independent mutexes: one
//! serializes producers, the other serializes consumers. The locks never
//! order a producer against a consumer; that relationship stays on the
//! fenced cursor protocol of the core ring.

use crate::metrics::MetricsSnapshot;
use crate::ring::SpscRing;
use crate::{Config, RingError};
use parking_lot::Mutex;

/// Ring with any number of producer and consumer threads.
///
/// Every method takes `&self`; share it by reference, `Arc`, or scoped
/// threads.
#[derive(Debug)]
pub struct MpmcRing<T> {
    ring: SpscRing<T>,
    producer_lock: Mutex<()>,
    consumer_lock: Mutex<()>,
}

impl<T: Copy> MpmcRing<T> {
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
            consumer_lock: Mutex::new(()),
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

    // ---------------------------------------------------------------------
    // PRODUCER API
    // ---------------------------------------------------------------------

    /// Copies as many leading elements of `src` as fit into the ring.
    ///
    /// Never waits for space, only for other producers currently inside `put`.
    pub fn put(&self, src: &[T]) -> usize {
        let _guard = self.producer_lock.lock();
        // SAFETY: the producer lock makes this the only producer.
        unsafe { self.ring.put(src) }
    }

    /// Puts all of `src` with backoff while full, holding the producer lock
    /// throughout so `src` lands contiguously.
    pub fn put_with_backoff(&self, src: &[T]) -> Result<(), RingError> {
        let _guard = self.producer_lock.lock();
        // SAFETY: the producer lock makes this the only producer.
        unsafe { self.ring.put_with_backoff(src) }
    }

    // ---------------------------------------------------------------------
    // CONSUMER API
    // ---------------------------------------------------------------------

    /// Moves up to `dst.len()` elements from the ring into `dst`.
    ///
    /// Never waits for data, only for other consumers currently inside `get`.
    pub fn get(&self, dst: &mut [T]) -> usize {
        let _guard = self.consumer_lock.lock();
        // SAFETY: the consumer lock makes this the only consumer.
        unsafe { self.ring.get(dst) }
    }

    /// Fills all of `dst` with backoff while empty, holding the consumer lock
    /// throughout so `dst` receives a contiguous run of the stream.
    pub fn get_with_backoff(&self, dst: &mut [T]) -> Result<(), RingError> {
        let _guard = self.consumer_lock.lock();
        // SAFETY: the consumer lock makes this the only consumer.
        unsafe { self.ring.get_with_backoff(dst) }
    }

    /// Returns the next element without removing it, or `None` if empty.
    ///
    /// Another consumer may take the element before this caller's next `get`.
    pub fn peek(&self) -> Option<T> {
        let _guard = self.consumer_lock.lock();
        // SAFETY: the consumer lock makes this the only consumer.
        unsafe { self.ring.peek() }
    }

    // ---------------------------------------------------------------------
    // STATUS
    // ---------------------------------------------------------------------

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

impl<T: Copy> Default for MpmcRing<T> {
    /// A null ring; size it with [`reset`](MpmcRing::reset).
    fn default() -> Self {
        Self::from_ring(SpscRing::default())
    }
}
