//! Simulated wire with edge wakeups and waveform capture.
//!
//! A [`SimLine`] holds a single level. Writes that change the level are
//! recorded as [`Transition`]s against the simulation clock, and a falling
//! transition wakes every task waiting in [`Line::falling_edge`].

#![allow(clippy::disallowed_types, reason = "Synchronous locking operations only")]

use std::{
    fmt,
    future::Future,
    pin::Pin,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
    task::{Context, Poll, Waker},
    time::Duration,
};

use serde::Serialize;
use uartvip_core::Line;

use crate::clock::SimClock;

/// One level change on a line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Transition {
    /// Simulated time of the change
    #[serde(rename = "at_ns", serialize_with = "serialize_nanos")]
    pub at: Duration,
    /// Level after the change
    pub level: bool,
}

fn serialize_nanos<S: serde::Serializer>(at: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_u128(at.as_nanos())
}

struct LineState {
    level: bool,
    initial: bool,
    last_fall: Option<Duration>,
    waiters: Vec<Waker>,
    transitions: Vec<Transition>,
}

/// Shared handle to one simulated wire.
///
/// Clones refer to the same wire.
#[derive(Clone)]
pub struct SimLine {
    name: Arc<str>,
    clock: SimClock,
    state: Arc<Mutex<LineState>>,
}

impl fmt::Debug for SimLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SimLine").field("name", &self.name).field("level", &self.level()).finish()
    }
}

impl SimLine {
    pub(crate) fn new(name: &str, clock: SimClock, initial: bool) -> Self {
        Self {
            name: Arc::from(name),
            clock,
            state: Arc::new(Mutex::new(LineState {
                level: initial,
                initial,
                last_fall: None,
                waiters: Vec::new(),
                transitions: Vec::new(),
            })),
        }
    }

    fn state(&self) -> MutexGuard<'_, LineState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Name given at creation.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Everything driven onto the line so far.
    pub fn waveform(&self) -> Waveform {
        let state = self.state();
        Waveform { initial: state.initial, transitions: state.transitions.clone() }
    }

    /// Whether both handles refer to the same wire.
    pub fn same_wire(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.state, &other.state)
    }
}

impl Line for SimLine {
    fn drive(&self, level: bool) {
        let now = self.clock.now();
        let waiters = {
            let mut state = self.state();
            if state.level == level {
                return;
            }
            state.level = level;
            state.transitions.push(Transition { at: now, level });
            if level {
                return;
            }
            state.last_fall = Some(now);
            std::mem::take(&mut state.waiters)
        };

        tracing::trace!(line = %self.name, at_ns = now.as_nanos() as u64, "falling edge");
        for waker in waiters {
            waker.wake();
        }
    }

    fn level(&self) -> bool {
        self.state().level
    }

    fn falling_edge(&self) -> impl Future<Output = ()> + Send {
        FallingEdge { line: self.clone(), since: self.clock.now() }
    }
}

/// Future returned by [`SimLine`]'s [`Line::falling_edge`].
///
/// Ready once the line has fallen at or after the instant it was created,
/// so a fall earlier in that same instant also completes it.
pub struct FallingEdge {
    line: SimLine,
    since: Duration,
}

impl Future for FallingEdge {
    type Output = ();

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<()> {
        let mut state = self.line.state();
        if state.last_fall.is_some_and(|at| at >= self.since) {
            return Poll::Ready(());
        }
        if !state.waiters.iter().any(|w| w.will_wake(cx.waker())) {
            state.waiters.push(cx.waker().clone());
        }
        Poll::Pending
    }
}

/// Recorded history of one line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Waveform {
    initial: bool,
    transitions: Vec<Transition>,
}

impl Waveform {
    /// Level before the first transition.
    pub fn initial(&self) -> bool {
        self.initial
    }

    /// Level changes in time order.
    pub fn transitions(&self) -> &[Transition] {
        &self.transitions
    }

    /// Level at time `at`.
    ///
    /// A change at exactly `at` is included; of several changes at the same
    /// instant the last one wins.
    pub fn level_at(&self, at: Duration) -> bool {
        self.transitions
            .iter()
            .take_while(|t| t.at <= at)
            .last()
            .map_or(self.initial, |t| t.level)
    }

    /// Times of every high-to-low change.
    pub fn falling_edges(&self) -> Vec<Duration> {
        self.transitions.iter().filter(|t| !t.level).map(|t| t.at).collect()
    }

    /// Level at the middle of `count` consecutive slots of `period`,
    /// the first one starting at `start`.
    pub fn slots(&self, start: Duration, period: Duration, count: usize) -> Vec<bool> {
        (0..count)
            .map(|i| {
                let slot_start = start + period * u32::try_from(i).unwrap_or(u32::MAX);
                self.level_at(slot_start + period / 2)
            })
            .collect()
    }
}
