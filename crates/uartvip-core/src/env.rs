//! Environment abstraction for deterministic testing.
//!
//! Decouples endpoint logic from the simulator's notion of time and from the
//! source of randomness. The harness provides a virtual nanosecond clock with
//! a seeded RNG, so the same seed replays the same sampling jitter and idle
//! delays.

use std::{future::Future, time::Duration};

/// Abstract environment providing simulated time, delays and randomness.
///
/// # Invariants
///
/// Implementations MUST guarantee:
///
/// - `now()` never goes backwards
/// - `sleep(d)` resumes the caller exactly `d` after the current `now()`;
///   frame alignment depends on it
/// - Given the same seed, `random_bytes()` produces the same sequence
pub trait Environment: Clone + Send + Sync + 'static {
    /// Simulated time elapsed since the start of the run.
    ///
    /// # Invariants
    ///
    /// - Subsequent calls must return times >= previous calls.
    fn now(&self) -> Duration;

    /// Suspends the calling task for `duration` of simulated time.
    ///
    /// Only the calling task yields; other tasks keep running.
    fn sleep(&self, duration: Duration) -> impl Future<Output = ()> + Send;

    /// Fills the provided buffer with random bytes.
    fn random_bytes(&self, buffer: &mut [u8]);

    /// Generates a random `u64`.
    fn random_u64(&self) -> u64 {
        let mut bytes = [0u8; 8];
        self.random_bytes(&mut bytes);
        u64::from_be_bytes(bytes)
    }

    /// Uniform random value in `low..=high`.
    ///
    /// Uses rejection sampling so every value is equally likely.
    fn random_range(&self, low: u64, high: u64) -> u64 {
        debug_assert!(low <= high, "empty range {low}..={high}");

        let Some(span) = (high - low).checked_add(1) else {
            return self.random_u64();
        };
        // Largest multiple of `span` that fits; values at or above it are biased.
        let limit = u64::MAX - u64::MAX % span;
        loop {
            let value = self.random_u64();
            if value < limit {
                return low + value % span;
            }
        }
    }
}
