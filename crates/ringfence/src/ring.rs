use crate::backoff;
use crate::capacity::effective_capacity;
use crate::invariants::{
    debug_assert_bounded_count, debug_assert_in_bounds, debug_assert_read_not_past_write,
};
use crate::metrics::{Metrics, MetricsSnapshot};
use crate::trace::{debug, warn};
use crate::{Config, RingError};
use crossbeam_utils::CachePadded;
use std::cell::UnsafeCell;
use std::fmt;
use std::mem::MaybeUninit;
use std::ptr;
use std::sync::atomic::{fence, AtomicU32, Ordering};

// =============================================================================
// MEMORY ORDERING & SYNCHRONIZATION STRATEGY
// =============================================================================
//
// Two u32 cursors, each with exactly one writer:
// - `write_cursor`: total elements ever put, only the producer stores it
// - `read_cursor`:  total elements ever got, only the consumer stores it
//
// `write - read` (wrapping) is the occupied count and is always in
// [0, capacity]. The slot of a cursor is `cursor & (capacity - 1)`; since the
// capacity is a power of two it divides 2^32 and masking survives wrap-around.
//
// Both cursors are loaded and stored Relaxed. Ordering comes from fences:
//
// **Producer (put):**
// 1. Load both cursors Relaxed, compute free space
// 2. fence(Acquire) - pairs with the consumer's release fence, so the
//    consumer has finished reading any slot we are about to overwrite
// 3. Copy into storage (up to two segments on wrap)
// 4. fence(Release) - the copies happen-before the cursor store below
// 5. Store `write_cursor` Relaxed
//
// **Consumer (get / peek):**
// 1. Load both cursors Relaxed, compute available elements
// 2. fence(Acquire) - pairs with the producer's release fence, so the
//    copied elements are visible
// 3. Copy out of storage (up to two segments on wrap)
// 4. fence(Release) - the reads happen-before the cursor store below
// 5. Store `read_cursor` Relaxed (peek skips 4 and 5)
//
// A fence/fence pair synchronizes whenever the Relaxed load after the
// acquire fence's side observes the Relaxed store made after the release
// fence's side.
//
// ## Single-Writer Invariants
//
// Only one thread may act as producer and one as consumer. The public API
// enforces this: `Producer::put` and `Consumer::get` take `&mut self`, the
// handles are not `Clone`, and `split` borrows the ring mutably so a second
// pair cannot exist. The mutex-wrapped rings in `mpsc` / `mpmc` uphold it
// with locks instead and call the `unsafe` primitives directly.
//
// =============================================================================

/// Lock-free single-producer single-consumer ring buffer.
///
/// The core building block: fixed power-of-two storage of `T: Copy`
/// elements plus two independently advanced cursors. Use [`split`] to get
/// the [`Producer`] and [`Consumer`] handles that drive it.
///
/// [`split`]: SpscRing::split
pub struct SpscRing<T> {
    /// Write cursor (stored by producer, read by consumer)
    write_cursor: CachePadded<AtomicU32>,
    /// Read cursor (stored by consumer, read by producer)
    read_cursor: CachePadded<AtomicU32>,

    /// Power of two, or 0 for a null ring
    capacity: u32,
    config: Config,
    metrics: Metrics,

    /// `UnsafeCell<MaybeUninit<T>>` has the layout of `T`; slots in
    /// `[read, write)` are initialized.
    storage: Box<[UnsafeCell<MaybeUninit<T>>]>,
}

// Safety: the cursor protocol hands each slot to at most one side at a time,
// and elements only move between threads by value, so `T: Send` suffices.
unsafe impl<T: Send> Send for SpscRing<T> {}
unsafe impl<T: Send> Sync for SpscRing<T> {}

impl<T: Copy> SpscRing<T> {
    /// Creates a ring holding `size` elements, rounded up to a power of two.
    ///
    /// A `size` of 0, or one that rounds past [`MAX_CAPACITY`], yields a null
    /// ring (see [`is_null`](Self::is_null)). Use [`try_new`](Self::try_new)
    /// to get an error for the latter instead.
    ///
    /// [`MAX_CAPACITY`]: crate::MAX_CAPACITY
    pub fn new(size: u32) -> Self {
        Self::with_config(Config::new(size, false))
    }

    /// Creates a ring, failing if `size` rounds past the maximum capacity.
    pub fn try_new(size: u32) -> Result<Self, RingError> {
        Self::try_with_config(Config::new(size, false))
    }

    /// Creates a ring from a [`Config`]; overflowing capacities yield a null ring.
    pub fn with_config(config: Config) -> Self {
        let mut ring = Self::null(config);
        ring.reset(config.capacity);
        ring
    }

    /// Creates a ring from a [`Config`], failing on capacity overflow.
    pub fn try_with_config(config: Config) -> Result<Self, RingError> {
        let mut ring = Self::null(config);
        ring.try_reset(config.capacity)?;
        Ok(ring)
    }

    fn null(config: Config) -> Self {
        Self {
            write_cursor: CachePadded::new(AtomicU32::new(0)),
            read_cursor: CachePadded::new(AtomicU32::new(0)),
            capacity: 0,
            config: config.with_capacity(0),
            metrics: Metrics::new(),
            storage: Box::new([]),
        }
    }

    // ---------------------------------------------------------------------
    // LIFECYCLE
    // ---------------------------------------------------------------------

    /// Resizes the ring to `size` elements (rounded up) and empties it.
    ///
    /// `size == 0` releases storage and makes the ring null. A size that
    /// rounds past the maximum capacity also leaves the ring null.
    ///
    /// Taking `&mut self` guarantees no `put` / `get` is in flight.
    pub fn reset(&mut self, size: u32) {
        if let Err(err) = self.try_reset(size) {
            warn!(requested = size, error = %err, "ring capacity overflow, ring is now null");
            self.resize(0);
        }
    }

    /// Resizes the ring like [`reset`](Self::reset), but leaves it untouched
    /// and returns an error if `size` rounds past the maximum capacity.
    pub fn try_reset(&mut self, size: u32) -> Result<(), RingError> {
        let capacity =
            effective_capacity(size).ok_or(RingError::CapacityOverflow { requested: size })?;
        self.resize(capacity);
        self.config.capacity = size;
        if capacity != size {
            debug!(requested = size, capacity, "ring capacity rounded up");
        }
        Ok(())
    }

    fn resize(&mut self, capacity: u32) {
        if capacity != self.capacity {
            self.storage = (0..capacity)
                .map(|_| UnsafeCell::new(MaybeUninit::uninit()))
                .collect();
            self.capacity = capacity;
        }
        self.config.capacity = capacity;
        *self.write_cursor.get_mut() = 0;
        *self.read_cursor.get_mut() = 0;
        self.metrics = Metrics::new();
        debug!(capacity, "ring reset");
    }

    /// Splits the ring into its producer and consumer handles.
    ///
    /// The handles borrow the ring mutably, so at most one pair exists and
    /// `reset` is impossible while either is alive.
    pub fn split(&mut self) -> (Producer<'_, T>, Consumer<'_, T>) {
        let ring: &Self = self;
        (Producer { ring }, Consumer { ring })
    }

    // ---------------------------------------------------------------------
    // STATUS
    // ---------------------------------------------------------------------

    /// Returns true if the ring has no storage (capacity 0).
    #[inline]
    pub fn is_null(&self) -> bool {
        self.capacity == 0
    }

    /// Returns the ring buffer capacity.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity as usize
    }

    /// Returns the current number of elements in the ring.
    ///
    /// A relaxed snapshot; advisory only while other threads operate.
    #[inline]
    pub fn len(&self) -> usize {
        let write = self.write_cursor.load(Ordering::Relaxed);
        let read = self.read_cursor.load(Ordering::Relaxed);
        write.wrapping_sub(read) as usize
    }

    /// Returns true if the ring is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.write_cursor.load(Ordering::Relaxed) == self.read_cursor.load(Ordering::Relaxed)
    }

    /// Returns true if the ring is full. A null ring is always full.
    #[inline]
    pub fn is_full(&self) -> bool {
        self.len() >= self.capacity()
    }

    /// Returns the configuration the ring was last sized with.
    #[inline]
    pub fn config(&self) -> Config {
        self.config
    }

    /// Get a snapshot of metrics if enabled.
    pub fn metrics(&self) -> MetricsSnapshot {
        if self.config.enable_metrics {
            self.metrics.snapshot()
        } else {
            MetricsSnapshot::default()
        }
    }

    // ---------------------------------------------------------------------
    // RAW PRIMITIVES
    // ---------------------------------------------------------------------

    /// Pointer to slot `index`, derived from the whole storage slice so a
    /// multi-element copy stays in bounds of one allocation.
    #[inline]
    fn slot(&self, index: u32) -> *mut T {
        UnsafeCell::raw_get(self.storage.as_ptr().wrapping_add(index as usize)).cast::<T>()
    }

    /// Copies as many leading elements of `src` as fit; returns the count.
    ///
    /// # Safety
    ///
    /// No other thread may be inside `put` on this ring for the duration of
    /// the call.
    pub(crate) unsafe fn put(&self, src: &[T]) -> usize {
        let capacity = self.capacity;
        let write = self.write_cursor.load(Ordering::Relaxed);
        let read = self.read_cursor.load(Ordering::Relaxed);

        let free = capacity.wrapping_sub(write.wrapping_sub(read));
        let accepted = clamp_len(src.len()).min(free);
        if accepted == 0 {
            if self.config.enable_metrics {
                self.metrics.record_put(0);
            }
            return 0;
        }

        // Consumer must be done with the slots we are about to reuse.
        fence(Ordering::Acquire);

        let index = write & (capacity - 1);
        let first = accepted.min(capacity - index);
        debug_assert_in_bounds!(index, first, capacity);

        // SAFETY: [index, index + first) and [0, accepted - first) are in
        // bounds and lie in the free region [write, read + capacity), which
        // the consumer does not touch until `write_cursor` moves past it.
        // `src` has at least `accepted` elements and cannot alias storage.
        unsafe {
            ptr::copy_nonoverlapping(src.as_ptr(), self.slot(index), first as usize);
            ptr::copy_nonoverlapping(
                src.as_ptr().add(first as usize),
                self.slot(0),
                (accepted - first) as usize,
            );
        }

        // Publish the copies before the cursor.
        fence(Ordering::Release);

        let new_write = write.wrapping_add(accepted);
        debug_assert_bounded_count!(new_write, read, capacity);
        self.write_cursor.store(new_write, Ordering::Relaxed);

        if self.config.enable_metrics {
            self.metrics.record_put(accepted);
        }
        accepted as usize
    }

    /// Moves up to `dst.len()` elements out of the ring; returns the count.
    ///
    /// # Safety
    ///
    /// No other thread may be inside `get` or `peek` on this ring for the
    /// duration of the call.
    pub(crate) unsafe fn get(&self, dst: &mut [T]) -> usize {
        let capacity = self.capacity;
        let write = self.write_cursor.load(Ordering::Relaxed);
        let read = self.read_cursor.load(Ordering::Relaxed);

        let available = write.wrapping_sub(read);
        let taken = clamp_len(dst.len()).min(available);
        if taken == 0 {
            if self.config.enable_metrics {
                self.metrics.record_get(0);
            }
            return 0;
        }

        // See everything the producer published up to `write`.
        fence(Ordering::Acquire);

        let index = read & (capacity - 1);
        let first = taken.min(capacity - index);
        debug_assert_in_bounds!(index, first, capacity);

        // SAFETY: both segments are in bounds and lie in [read, write),
        // which the producer initialized and will not overwrite until
        // `read_cursor` moves past it. `dst` holds at least `taken` elements.
        unsafe {
            ptr::copy_nonoverlapping(self.slot(index), dst.as_mut_ptr(), first as usize);
            ptr::copy_nonoverlapping(
                self.slot(0),
                dst.as_mut_ptr().add(first as usize),
                (taken - first) as usize,
            );
        }

        // Finish reading the slots before handing them back.
        fence(Ordering::Release);

        let new_read = read.wrapping_add(taken);
        debug_assert_read_not_past_write!(read, new_read, write);
        self.read_cursor.store(new_read, Ordering::Relaxed);

        if self.config.enable_metrics {
            self.metrics.record_get(taken);
        }
        taken as usize
    }

    /// Copies the next element without consuming it.
    ///
    /// # Safety
    ///
    /// Same as [`get`](Self::get): no concurrent consumer-side call.
    pub(crate) unsafe fn peek(&self) -> Option<T> {
        let write = self.write_cursor.load(Ordering::Relaxed);
        let read = self.read_cursor.load(Ordering::Relaxed);
        if write == read {
            return None;
        }

        fence(Ordering::Acquire);

        let index = read & (self.capacity - 1);
        // SAFETY: `read != write`, so slot `index` is initialized and owned
        // by the consumer side until `read_cursor` advances.
        Some(unsafe { ptr::read(self.slot(index)) })
    }

    /// Retries `put` with backoff until all of `src` is in the ring.
    ///
    /// # Safety
    ///
    /// Same as [`put`](Self::put), for the whole duration of the call.
    pub(crate) unsafe fn put_with_backoff(&self, src: &[T]) -> Result<(), RingError> {
        if src.is_empty() {
            return Ok(());
        }
        if self.is_null() {
            return Err(RingError::Null);
        }
        // SAFETY: forwarded from the caller.
        let moved = backoff::drive(src.len(), |done| unsafe { self.put(&src[done..]) });
        self.finish_transfer("put", moved, src.len())
    }

    /// Retries `get` with backoff until `dst` is full.
    ///
    /// # Safety
    ///
    /// Same as [`get`](Self::get), for the whole duration of the call.
    pub(crate) unsafe fn get_with_backoff(&self, dst: &mut [T]) -> Result<(), RingError> {
        if dst.is_empty() {
            return Ok(());
        }
        if self.is_null() {
            return Err(RingError::Null);
        }
        let requested = dst.len();
        // SAFETY: forwarded from the caller.
        let moved = backoff::drive(requested, |done| unsafe { self.get(&mut dst[done..]) });
        self.finish_transfer("get", moved, requested)
    }

    #[allow(clippy::unused_self)]
    fn finish_transfer(
        &self,
        side: &'static str,
        transferred: usize,
        requested: usize,
    ) -> Result<(), RingError> {
        if transferred == requested {
            return Ok(());
        }
        debug!(side, transferred, requested, capacity = self.capacity, "transfer stalled");
        Err(RingError::Stalled {
            transferred,
            requested,
        })
    }

    /// Moves both cursors to `cursor` (ring stays empty).
    #[cfg(test)]
    pub(crate) fn start_at(&mut self, cursor: u32) {
        *self.write_cursor.get_mut() = cursor;
        *self.read_cursor.get_mut() = cursor;
    }
}

/// Requests longer than `u32::MAX` are served in part.
#[inline]
fn clamp_len(len: usize) -> u32 {
    u32::try_from(len).unwrap_or(u32::MAX)
}

impl<T: Copy> Default for SpscRing<T> {
    /// A null ring; size it with [`reset`](SpscRing::reset).
    fn default() -> Self {
        Self::null(Config::default())
    }
}

impl<T> fmt::Debug for SpscRing<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SpscRing")
            .field("capacity", &self.capacity)
            .field("write_cursor", &self.write_cursor.load(Ordering::Relaxed))
            .field("read_cursor", &self.read_cursor.load(Ordering::Relaxed))
            .finish_non_exhaustive()
    }
}

// ---------------------------------------------------------------------
// HANDLES
// ---------------------------------------------------------------------

/// Producer half of a split [`SpscRing`].
///
/// Not `Clone`: exactly one producer exists per ring.
#[derive(Debug)]
pub struct Producer<'a, T> {
    ring: &'a SpscRing<T>,
}

impl<T: Copy> Producer<'_, T> {
    /// Copies as many leading elements of `src` as fit into the ring.
    ///
    /// Never blocks. Returns the number accepted, which may be anything from
    /// 0 (full or null ring) to `src.len()`. Callers that must deliver all of
    /// `src` retry with the remainder.
    #[inline]
    pub fn put(&mut self, src: &[T]) -> usize {
        // SAFETY: `&mut self` on the only producer handle.
        unsafe { self.ring.put(src) }
    }

    /// Puts all of `src`, spinning then yielding while the ring is full.
    ///
    /// Gives up with [`RingError::Stalled`] when the consumer makes no room
    /// for a full backoff cycle; the elements already accepted stay in the
    /// ring.
    pub fn put_with_backoff(&mut self, src: &[T]) -> Result<(), RingError> {
        // SAFETY: `&mut self` on the only producer handle.
        unsafe { self.ring.put_with_backoff(src) }
    }

    /// Returns the free slots as seen by the producer.
    #[inline]
    pub fn free_space(&self) -> usize {
        self.ring.capacity() - self.ring.len()
    }

    /// Returns the ring buffer capacity.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.ring.capacity()
    }

    /// Returns true if the ring has no storage.
    #[inline]
    pub fn is_null(&self) -> bool {
        self.ring.is_null()
    }
}

/// Consumer half of a split [`SpscRing`].
///
/// Not `Clone`: exactly one consumer exists per ring.
#[derive(Debug)]
pub struct Consumer<'a, T> {
    ring: &'a SpscRing<T>,
}

impl<'a, T: Copy> Consumer<'a, T> {
    /// Wraps a ring whose consumer side the caller owns exclusively.
    pub(crate) fn new(ring: &'a SpscRing<T>) -> Self {
        Self { ring }
    }

    /// Moves up to `dst.len()` elements from the ring into `dst`.
    ///
    /// Never blocks. Returns the number removed (0 when empty or null);
    /// only `dst[..n]` is written.
    #[inline]
    pub fn get(&mut self, dst: &mut [T]) -> usize {
        // SAFETY: `&mut self` on the only consumer handle.
        unsafe { self.ring.get(dst) }
    }

    /// Fills all of `dst`, spinning then yielding while the ring is empty.
    pub fn get_with_backoff(&mut self, dst: &mut [T]) -> Result<(), RingError> {
        // SAFETY: `&mut self` on the only consumer handle.
        unsafe { self.ring.get_with_backoff(dst) }
    }

    /// Returns the next element without removing it, or `None` if empty.
    #[inline]
    pub fn peek(&self) -> Option<T> {
        // SAFETY: `get` needs `&mut self`, so it cannot overlap with this;
        // concurrent peeks only read.
        unsafe { self.ring.peek() }
    }

    /// Returns the number of elements ready to be read.
    #[inline]
    pub fn len(&self) -> usize {
        self.ring.len()
    }

    /// Returns true if nothing is ready to be read.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.ring.is_empty()
    }

    /// Returns true if the ring has no storage.
    #[inline]
    pub fn is_null(&self) -> bool {
        self.ring.is_null()
    }
}
