//! ringfence - Fence-Synchronized Lock-Free Ring Buffers
//!
//! A fixed-capacity ring buffer for streaming `Copy` elements between
//! threads. The core [`SpscRing`] has one producer and one consumer that
//! never take a lock: each side advances its own `u32` cursor and
//! acquire/release fences order the element copies against the cursor
//! stores.
//!
//! Two layered variants relax the single-producer/single-consumer rule by
//! adding mutual exclusion around the core, never by changing it:
//!
//! - [`MpscRing`]: a mutex serializes producers, one lock-free consumer
//! - [`MpmcRing`]: one mutex for producers, another for consumers
//!
//! # Key Features
//!
//! - Power-of-two capacity, bitmask indexing, wrap-split two-segment copies
//! - Non-blocking `put` / `get` returning partial counts
//! - Non-destructive `peek`
//! - Bounded backoff helpers (`put_with_backoff` / `get_with_backoff`)
//! - Optional metrics and `tracing` logging
//!
//! # Example
//!
//! ```
//! use ringfence::SpscRing;
//! use std::thread;
//!
//! let mut ring = SpscRing::<u8>::new(10); // rounded up to 16
//! let (mut tx, mut rx) = ring.split();
//!
//! thread::scope(|s| {
//!     s.spawn(move || {
//!         let msg = b"hello, ring";
//!         let mut sent = 0;
//!         while sent < msg.len() {
//!             sent += tx.put(&msg[sent..]);
//!         }
//!     });
//!
//!     let mut out = [0u8; 11];
//!     let mut got = 0;
//!     while got < out.len() {
//!         got += rx.get(&mut out[got..]);
//!     }
//!     assert_eq!(&out, b"hello, ring");
//! });
//! ```

mod backoff;
mod capacity;
mod config;
mod error;
mod invariants;
mod metrics;
mod mpmc;
mod mpsc;
mod ring;
mod trace;

pub use backoff::Backoff;
pub use capacity::{round_down_to_power_of_two, round_up_to_power_of_two, MAX_CAPACITY};
pub use config::{Config, HIGH_THROUGHPUT_CONFIG, LOW_LATENCY_CONFIG};
pub use error::RingError;
pub use metrics::MetricsSnapshot;
pub use mpmc::MpmcRing;
pub use mpsc::{MpscProducer, MpscRing};
pub use ring::{Consumer, Producer, SpscRing};
pub use trace::init_tracing;
