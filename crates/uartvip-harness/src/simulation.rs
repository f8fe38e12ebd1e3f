//! Discrete-event simulation driver.
//!
//! Runs tasks on a single-threaded executor over a virtual clock. A run
//! proceeds in rounds: poll everything that is ready until nothing is, then
//! advance the clock to the next timer. If nothing is ready and no timer is
//! pending, every task is waiting on an event that can no longer happen and
//! the run fails with [`SimError::Deadlock`].

#![allow(clippy::disallowed_types, reason = "Synchronous locking operations only")]

use std::{
    future::Future,
    pin::pin,
    sync::{
        Arc, Mutex,
        atomic::{AtomicBool, Ordering},
    },
    task::{Context, Poll},
    time::Duration,
};

use futures::{
    executor::LocalPool,
    future::RemoteHandle,
    task::{ArcWake, LocalSpawnExt, waker},
};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use thiserror::Error;
use tracing::trace;

use crate::{SimDut, SimEnv, SimLine, clock::SimClock};

/// Errors that end a simulation run.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SimError {
    /// Every task is blocked and no timer is pending
    #[error("simulation deadlocked at {at:?}: all tasks blocked with no pending timer")]
    Deadlock {
        /// Simulated time when the run stalled
        at: Duration,
    },

    /// The clock passed the configured limit
    #[error("simulation exceeded its time limit of {limit:?}")]
    TimeLimit {
        /// Configured limit
        limit: Duration,
    },

    /// Executor refused a task
    #[error("failed to spawn task: {0}")]
    Spawn(String),
}

/// Records whether the main future was woken.
struct WakeFlag(AtomicBool);

impl ArcWake for WakeFlag {
    fn wake_by_ref(arc_self: &Arc<Self>) {
        arc_self.0.store(true, Ordering::Release);
    }
}

/// Virtual clock, seeded RNG and task executor for one run.
pub struct Simulation {
    pool: LocalPool,
    clock: SimClock,
    rng: Arc<Mutex<ChaCha8Rng>>,
    seed: u64,
    time_limit: Option<Duration>,
}

impl Default for Simulation {
    fn default() -> Self {
        Self::new()
    }
}

impl Simulation {
    /// Simulation seeded with 0.
    pub fn new() -> Self {
        Self::with_seed(0)
    }

    /// Simulation with an explicit RNG seed.
    pub fn with_seed(seed: u64) -> Self {
        Self {
            pool: LocalPool::new(),
            clock: SimClock::default(),
            rng: Arc::new(Mutex::new(ChaCha8Rng::seed_from_u64(seed))),
            seed,
            time_limit: None,
        }
    }

    /// Fail runs whose clock passes `limit`.
    #[must_use]
    pub fn with_time_limit(mut self, limit: Duration) -> Self {
        self.time_limit = Some(limit);
        self
    }

    /// RNG seed of this run.
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Current simulated time.
    pub fn now(&self) -> Duration {
        self.clock.now()
    }

    /// Environment over this simulation's clock and RNG.
    ///
    /// Every environment from the same simulation shares one RNG stream.
    pub fn env(&self) -> SimEnv {
        SimEnv::new(self.clock.clone(), Arc::clone(&self.rng))
    }

    /// New wire, idle high.
    pub fn line(&self, name: &str) -> SimLine {
        SimLine::new(name, self.clock.clone(), true)
    }

    /// Empty pin map on this simulation's clock.
    pub fn dut(&self) -> SimDut {
        SimDut::new(self.clock.clone())
    }

    /// Run `future` as a background task.
    ///
    /// Dropping the returned handle cancels the task; call
    /// [`RemoteHandle::forget`] to detach it.
    pub fn spawn<F>(&self, future: F) -> Result<RemoteHandle<F::Output>, SimError>
    where
        F: Future + 'static,
        F::Output: 'static,
    {
        self.pool.spawner().spawn_local_with_handle(future).map_err(|e| SimError::Spawn(e.to_string()))
    }

    /// Drive the simulation until `future` completes.
    ///
    /// Background tasks run alongside it. Tasks still pending when `future`
    /// completes stay suspended and resume on the next call.
    ///
    /// # Errors
    ///
    /// - `SimError::Deadlock` if `future` can never complete
    /// - `SimError::TimeLimit` if the clock passes the configured limit
    pub fn run_until<F: Future>(&mut self, future: F) -> Result<F::Output, SimError> {
        let mut future = pin!(future);
        let flag = Arc::new(WakeFlag(AtomicBool::new(true)));
        let main_waker = waker(Arc::clone(&flag));
        let mut cx = Context::from_waker(&main_waker);

        loop {
            if flag.0.swap(false, Ordering::AcqRel)
                && let Poll::Ready(output) = future.as_mut().poll(&mut cx)
            {
                return Ok(output);
            }

            self.pool.run_until_stalled();
            if flag.0.load(Ordering::Acquire) {
                continue;
            }

            let Some(now) = self.clock.advance() else {
                return Err(SimError::Deadlock { at: self.clock.now() });
            };
            if let Some(limit) = self.time_limit
                && now > limit
            {
                return Err(SimError::TimeLimit { limit });
            }
            trace!(now_ns = now.as_nanos() as u64, "clock advanced");
        }
    }

    /// Let the simulation run for `duration` of simulated time.
    pub fn run_for(&mut self, duration: Duration) -> Result<(), SimError> {
        let sleep = self.clock.sleep(duration);
        self.run_until(sleep)
    }
}
