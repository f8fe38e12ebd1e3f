//! Bit-timing sampler.
//!
//! Takes one sample per bit slot at a randomized instant inside the slot, to
//! emulate a receiver whose clock is not aligned with the transmitter's. The
//! design under test must stay decodable for any legal sampling instant.
//!
//! Every [`BitSampler::sample`] call consumes exactly one bit period, no
//! matter where the sample was taken, so consecutive calls stay aligned to
//! the slot grid set by the start edge.

use std::time::Duration;

use crate::{Environment, Line};

/// Where inside a slot the sample is taken.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SampleMode {
    /// Uniformly random offset in `[1, bit_period - 1]` nanoseconds
    Jittered,
    /// Fixed offset of `bit_period / 2`, the most margin from both edges.
    /// Used for the start slot.
    Center,
}

/// Split of one bit period around the sampling instant.
///
/// # Invariants
///
/// - `offset + remainder == bit_period`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SamplePlan {
    /// Wait before sampling
    pub offset: Duration,
    /// Wait after sampling, up to the end of the slot
    pub remainder: Duration,
}

impl SamplePlan {
    /// Plan sampling `offset_ns` into a slot of `bit_period_ns`.
    ///
    /// Returns `None` unless `1 <= offset_ns <= bit_period_ns - 1`.
    pub fn at_offset(bit_period_ns: u64, offset_ns: u64) -> Option<Self> {
        if offset_ns == 0 || offset_ns >= bit_period_ns {
            return None;
        }
        Some(Self {
            offset: Duration::from_nanos(offset_ns),
            remainder: Duration::from_nanos(bit_period_ns - offset_ns),
        })
    }

    /// Sample at the middle of the slot.
    pub fn center(bit_period_ns: u64) -> Self {
        let offset = bit_period_ns / 2;
        Self {
            offset: Duration::from_nanos(offset),
            remainder: Duration::from_nanos(bit_period_ns - offset),
        }
    }

    /// Sample at a random offset drawn from `env`.
    ///
    /// Periods too short to jitter fall back to [`SamplePlan::center`].
    pub fn jittered<E: Environment>(bit_period_ns: u64, env: &E) -> Self {
        if bit_period_ns < 2 {
            return Self::center(bit_period_ns);
        }
        let offset_ns = env.random_range(1, bit_period_ns - 1);
        Self {
            offset: Duration::from_nanos(offset_ns),
            remainder: Duration::from_nanos(bit_period_ns - offset_ns),
        }
    }

    /// Total time the plan consumes.
    pub fn total(&self) -> Duration {
        self.offset + self.remainder
    }
}

/// Samples one line once per bit slot.
#[derive(Debug, Clone)]
pub struct BitSampler<E, L> {
    env: E,
    line: L,
    bit_period_ns: u64,
}

impl<E: Environment, L: Line> BitSampler<E, L> {
    /// Sampler for `line` with the given bit period.
    pub fn new(env: E, line: L, bit_period: Duration) -> Self {
        let bit_period_ns = u64::try_from(bit_period.as_nanos()).unwrap_or(u64::MAX);
        Self { env, line, bit_period_ns }
    }

    /// Line being sampled.
    pub fn line(&self) -> &L {
        &self.line
    }

    /// Bit period in nanoseconds.
    pub fn bit_period_ns(&self) -> u64 {
        self.bit_period_ns
    }

    /// Plan the next sample.
    pub fn plan(&self, mode: SampleMode) -> SamplePlan {
        match mode {
            SampleMode::Center => SamplePlan::center(self.bit_period_ns),
            SampleMode::Jittered => SamplePlan::jittered(self.bit_period_ns, &self.env),
        }
    }

    /// Sample the current slot and wait out the rest of it.
    ///
    /// Returns after exactly one bit period.
    pub async fn sample(&self, mode: SampleMode) -> bool {
        let plan = self.plan(mode);
        debug_assert_eq!(plan.total(), Duration::from_nanos(self.bit_period_ns));

        self.env.sleep(plan.offset).await;
        let level = self.line.level();
        tracing::trace!(offset_ns = plan.offset.as_nanos() as u64, level, "sampled slot");
        self.env.sleep(plan.remainder).await;

        level
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    };

    use super::*;

    /// Environment whose random bytes come from a counter.
    #[derive(Clone, Default)]
    struct CountingEnv {
        counter: Arc<AtomicU64>,
    }

    impl Environment for CountingEnv {
        fn now(&self) -> Duration {
            Duration::ZERO
        }

        fn sleep(&self, _duration: Duration) -> impl std::future::Future<Output = ()> + Send {
            std::future::ready(())
        }

        fn random_bytes(&self, buffer: &mut [u8]) {
            let value = self.counter.fetch_add(1, Ordering::Relaxed).to_be_bytes();
            for (dst, src) in buffer.iter_mut().zip(value.iter().cycle()) {
                *dst = *src;
            }
        }
    }

    #[test]
    fn center_plan_splits_period() {
        let plan = SamplePlan::center(104_166);
        assert_eq!(plan.offset, Duration::from_nanos(52_083));
        assert_eq!(plan.total(), Duration::from_nanos(104_166));

        let odd = SamplePlan::center(7);
        assert_eq!(odd.offset, Duration::from_nanos(3));
        assert_eq!(odd.remainder, Duration::from_nanos(4));
    }

    #[test]
    fn offsets_on_slot_edges_are_rejected() {
        assert_eq!(SamplePlan::at_offset(100, 0), None);
        assert_eq!(SamplePlan::at_offset(100, 100), None);
        assert!(SamplePlan::at_offset(100, 1).is_some());
        assert!(SamplePlan::at_offset(100, 99).is_some());
    }

    #[test]
    fn jittered_offsets_stay_inside_slot() {
        let env = CountingEnv::default();
        for _ in 0..64 {
            let plan = SamplePlan::jittered(10, &env);
            let offset = plan.offset.as_nanos();
            assert!((1..=9).contains(&offset), "offset {offset} outside slot");
            assert_eq!(plan.total(), Duration::from_nanos(10));
        }
    }

    #[test]
    fn two_nanosecond_period_has_one_legal_offset() {
        let env = CountingEnv::default();
        let plan = SamplePlan::jittered(2, &env);
        assert_eq!(plan.offset, Duration::from_nanos(1));
        assert_eq!(plan.remainder, Duration::from_nanos(1));
    }
}
