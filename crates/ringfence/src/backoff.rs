use std::hint;
use std::thread;

/// Adaptive backoff strategy (Crossbeam-style).
///
/// Progressively increases wait time: spin with PAUSE → yield to OS → give up.
/// Used by the `*_with_backoff` transfer helpers; the ring primitives
/// themselves never wait.
#[derive(Debug)]
pub struct Backoff {
    step: u32,
}

impl Backoff {
    const SPIN_LIMIT: u32 = 6; // 2^6 = 64 spins max before yielding
    const YIELD_LIMIT: u32 = 10; // Then give up

    /// Creates a new backoff instance.
    #[inline]
    pub fn new() -> Self {
        Self { step: 0 }
    }

    /// Light spin with PAUSE hints.
    #[inline]
    pub fn spin(&mut self) {
        let spins = 1 << self.step.min(Self::SPIN_LIMIT);
        for _ in 0..spins {
            hint::spin_loop();
        }
        if self.step <= Self::SPIN_LIMIT {
            self.step += 1;
        }
    }

    /// Heavier backoff: spin then yield.
    #[inline]
    pub fn snooze(&mut self) {
        if self.step <= Self::SPIN_LIMIT {
            self.spin();
        } else {
            thread::yield_now();
            if self.step <= Self::YIELD_LIMIT {
                self.step += 1;
            }
        }
    }

    /// Check if we've exhausted patience.
    #[inline]
    pub fn is_completed(&self) -> bool {
        self.step > Self::YIELD_LIMIT
    }

    /// Reset for next wait cycle.
    #[inline]
    pub fn reset(&mut self) {
        self.step = 0;
    }
}

impl Default for Backoff {
    fn default() -> Self {
        Self::new()
    }
}

/// Drives a non-blocking transfer until `requested` elements have moved.
///
/// `attempt` receives the number already transferred and returns how many
/// more it moved this time. Progress resets the backoff; a completed backoff
/// without progress ends the loop. Returns the total transferred.
pub(crate) fn drive<F>(requested: usize, mut attempt: F) -> usize
where
    F: FnMut(usize) -> usize,
{
    let mut backoff = Backoff::new();
    let mut done = 0;
    while done < requested {
        let n = attempt(done);
        if n > 0 {
            done += n;
            backoff.reset();
            continue;
        }
        if backoff.is_completed() {
            break;
        }
        backoff.snooze();
    }
    done
}
