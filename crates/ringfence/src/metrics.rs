use std::sync::atomic::{AtomicU64, Ordering};

/// Optional metrics for monitoring ring traffic.
///
/// Counters are updated with relaxed atomics and only when
/// `Config::enable_metrics` is set.
#[derive(Debug, Default)]
pub(crate) struct Metrics {
    elements_put: AtomicU64,
    elements_got: AtomicU64,
    put_calls: AtomicU64,
    get_calls: AtomicU64,
    put_rejected: AtomicU64,
    get_rejected: AtomicU64,
}

impl Metrics {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Records one `put` call that accepted `n` elements.
    #[inline]
    pub(crate) fn record_put(&self, n: u32) {
        self.put_calls.fetch_add(1, Ordering::Relaxed);
        if n == 0 {
            self.put_rejected.fetch_add(1, Ordering::Relaxed);
        } else {
            self.elements_put.fetch_add(u64::from(n), Ordering::Relaxed);
        }
    }

    /// Records one `get` call that removed `n` elements.
    #[inline]
    pub(crate) fn record_get(&self, n: u32) {
        self.get_calls.fetch_add(1, Ordering::Relaxed);
        if n == 0 {
            self.get_rejected.fetch_add(1, Ordering::Relaxed);
        } else {
            self.elements_got.fetch_add(u64::from(n), Ordering::Relaxed);
        }
    }

    pub(crate) fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            elements_put: self.elements_put.load(Ordering::Relaxed),
            elements_got: self.elements_got.load(Ordering::Relaxed),
            put_calls: self.put_calls.load(Ordering::Relaxed),
            get_calls: self.get_calls.load(Ordering::Relaxed),
            put_rejected: self.put_rejected.load(Ordering::Relaxed),
            get_rejected: self.get_rejected.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time copy of a ring's counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    /// Elements accepted by `put`.
    pub elements_put: u64,
    /// Elements removed by `get`.
    pub elements_got: u64,
    /// Number of `put` calls.
    pub put_calls: u64,
    /// Number of `get` calls.
    pub get_calls: u64,
    /// `put` calls that accepted nothing (full or null ring).
    pub put_rejected: u64,
    /// `get` calls that removed nothing (empty or null ring).
    pub get_rejected: u64,
}
