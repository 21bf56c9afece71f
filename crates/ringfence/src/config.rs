use crate::capacity::{effective_capacity, round_down_to_power_of_two, MAX_CAPACITY};
use std::mem;

/// Configuration for `SpscRing`, `MpscRing` and `MpmcRing`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Config {
    /// Requested slot count (rounded up to a power of two; 0 = null ring)
    pub capacity: u32,
    /// Enable metrics collection (slight overhead)
    pub enable_metrics: bool,
}

impl Config {
    /// Creates a new configuration with custom settings.
    pub const fn new(capacity: u32, enable_metrics: bool) -> Self {
        Self {
            capacity,
            enable_metrics,
        }
    }

    /// Largest power-of-two capacity whose storage of `T` fits in `bytes`.
    ///
    /// Yields a null configuration (capacity 0) if not even one element fits.
    /// Zero-sized types get [`MAX_CAPACITY`].
    pub fn for_byte_budget<T>(bytes: usize) -> Self {
        let slots = match mem::size_of::<T>() {
            0 => MAX_CAPACITY,
            size => u32::try_from(bytes / size).unwrap_or(u32::MAX),
        };
        Self::new(round_down_to_power_of_two(slots), false)
    }

    /// Sets the requested capacity.
    pub const fn with_capacity(mut self, capacity: u32) -> Self {
        self.capacity = capacity;
        self
    }

    /// Enables or disables metrics.
    pub const fn with_metrics(mut self, enable_metrics: bool) -> Self {
        self.enable_metrics = enable_metrics;
        self
    }

    /// Returns the effective (power-of-two) capacity of the ring buffer.
    ///
    /// Returns 0 when the request is 0 or rounds past [`MAX_CAPACITY`].
    #[inline]
    pub const fn capacity(&self) -> u32 {
        match effective_capacity(self.capacity) {
            Some(cap) => cap,
            None => 0,
        }
    }

    /// Returns the mask for index wrapping (0 for a null configuration).
    #[inline]
    pub const fn mask(&self) -> u32 {
        self.capacity().saturating_sub(1)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            capacity: 4096,
            enable_metrics: false,
        }
    }
}

/// Low latency configuration (256 slots, fits in L1 cache for small `T`)
pub const LOW_LATENCY_CONFIG: Config = Config::new(256, false);

/// High throughput configuration (64K slots)
pub const HIGH_THROUGHPUT_CONFIG: Config = Config::new(1 << 16, false);
