//! Virtual clock and timer queue.
//!
//! Time only moves when the executor calls [`SimClock::advance`], which jumps
//! straight to the earliest deadline and wakes every timer due at that
//! instant.

#![allow(clippy::disallowed_types, reason = "Synchronous locking operations only")]

use std::{
    cmp::{Ordering, Reverse},
    collections::BinaryHeap,
    future::Future,
    pin::Pin,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
    task::{Context, Poll, Waker},
    time::Duration,
};

/// Shared handle to the simulation clock.
#[derive(Clone, Default)]
pub(crate) struct SimClock {
    inner: Arc<Mutex<ClockState>>,
}

#[derive(Default)]
struct ClockState {
    now: Duration,
    timers: BinaryHeap<Reverse<Timer>>,
    next_seq: u64,
}

/// Pending wakeup. Ordered by deadline, then registration order.
struct Timer {
    deadline: Duration,
    seq: u64,
    waker: Waker,
}

impl PartialEq for Timer {
    fn eq(&self, other: &Self) -> bool {
        self.deadline == other.deadline && self.seq == other.seq
    }
}

impl Eq for Timer {}

impl PartialOrd for Timer {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Timer {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.deadline, self.seq).cmp(&(other.deadline, other.seq))
    }
}

impl SimClock {
    fn state(&self) -> MutexGuard<'_, ClockState> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Current simulated time.
    pub(crate) fn now(&self) -> Duration {
        self.state().now
    }

    /// Future completing `duration` after the current time.
    pub(crate) fn sleep(&self, duration: Duration) -> Sleep {
        Sleep { clock: self.clone(), deadline: self.now() + duration }
    }

    fn register(&self, deadline: Duration, waker: Waker) {
        let mut state = self.state();
        let seq = state.next_seq;
        state.next_seq += 1;
        state.timers.push(Reverse(Timer { deadline, seq, waker }));
    }

    /// Jump to the earliest deadline and wake every timer due by then.
    ///
    /// Returns the new time, or `None` if no timer is pending.
    pub(crate) fn advance(&self) -> Option<Duration> {
        let mut due = Vec::new();
        let now = {
            let mut state = self.state();
            let Reverse(first) = state.timers.pop()?;
            let now = state.now.max(first.deadline);
            state.now = now;
            due.push(first.waker);

            while state.timers.peek().is_some_and(|Reverse(timer)| timer.deadline <= now) {
                if let Some(Reverse(timer)) = state.timers.pop() {
                    due.push(timer.waker);
                }
            }
            now
        };

        for waker in due {
            waker.wake();
        }
        Some(now)
    }

    /// Number of registered timers, including stale ones.
    #[cfg(test)]
    pub(crate) fn pending_timers(&self) -> usize {
        self.state().timers.len()
    }
}

/// Future returned by [`SimClock::sleep`].
pub struct Sleep {
    clock: SimClock,
    deadline: Duration,
}

impl Future for Sleep {
    type Output = ();

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<()> {
        if self.clock.now() >= self.deadline {
            return Poll::Ready(());
        }
        self.clock.register(self.deadline, cx.waker().clone());
        Poll::Pending
    }
}
