//! In-order scoreboard for expected and observed frames.
//!
//! The transmitting side records what it sent with [`Scoreboard::expect`],
//! the monitoring side feeds what it decoded to [`Scoreboard::observe`].
//! Frames are matched strictly in order with
//! [`Transaction::check_against`]; timestamps never take part.

use std::{collections::VecDeque, fmt};

use serde::Serialize;
use tracing::{debug, warn};
use uartvip_proto::{Mismatch, Transaction};

/// One frame that did not match.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScoreFailure {
    /// Observed frame differs from the oldest expected one
    Mismatch {
        /// Position in the observed stream
        index: usize,
        /// Frame that was sent
        expected: Transaction,
        /// Frame that was decoded
        observed: Transaction,
        /// First differing field
        reason: Mismatch,
    },
    /// A frame arrived with nothing expected
    Unexpected {
        /// Frame that was decoded
        observed: Transaction,
    },
}

impl fmt::Display for ScoreFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Mismatch { index, expected, observed, reason } => {
                write!(f, "frame {index}: {reason} (expected {expected}, observed {observed})")
            },
            Self::Unexpected { observed } => write!(f, "unexpected frame {observed}"),
        }
    }
}

/// Summary counts of a scoreboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct ScoreboardReport {
    /// Frames that matched
    pub matched: usize,
    /// Frames that differed from the expected one
    pub mismatched: usize,
    /// Frames observed with nothing expected
    pub unexpected: usize,
    /// Expected frames never observed
    pub missing: usize,
}

impl ScoreboardReport {
    /// Whether every expected frame was observed intact.
    pub fn passed(&self) -> bool {
        self.mismatched == 0 && self.unexpected == 0 && self.missing == 0
    }
}

impl fmt::Display for ScoreboardReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} matched, {} mismatched, {} unexpected, {} missing",
            self.matched, self.mismatched, self.unexpected, self.missing
        )
    }
}

/// Compares sent and received transactions in order.
#[derive(Debug, Default)]
pub struct Scoreboard {
    expected: VecDeque<Transaction>,
    observed: usize,
    matched: usize,
    failures: Vec<ScoreFailure>,
}

impl Scoreboard {
    /// Empty scoreboard.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a frame that should appear next after those already queued.
    pub fn expect(&mut self, txn: Transaction) {
        self.expected.push_back(txn);
    }

    /// Compare `txn` against the oldest expected frame.
    ///
    /// Returns whether it matched. Failures are kept for
    /// [`Scoreboard::failures`].
    pub fn observe(&mut self, txn: Transaction) -> bool {
        let index = self.observed;
        self.observed += 1;

        let Some(expected) = self.expected.pop_front() else {
            warn!(index, observed = %txn, "unexpected frame");
            self.failures.push(ScoreFailure::Unexpected { observed: txn });
            return false;
        };

        match txn.check_against(&expected) {
            Ok(()) => {
                debug!(index, observed = %txn, "frame matched");
                self.matched += 1;
                true
            },
            Err(reason) => {
                warn!(index, %reason, "frame mismatch");
                self.failures.push(ScoreFailure::Mismatch { index, expected, observed: txn, reason });
                false
            },
        }
    }

    /// Frames still waiting to be observed.
    pub fn pending(&self) -> usize {
        self.expected.len()
    }

    /// Every failure so far, in observation order.
    pub fn failures(&self) -> &[ScoreFailure] {
        &self.failures
    }

    /// Current counts; pending frames count as missing.
    pub fn report(&self) -> ScoreboardReport {
        let mismatched =
            self.failures.iter().filter(|f| matches!(f, ScoreFailure::Mismatch { .. })).count();
        ScoreboardReport {
            matched: self.matched,
            mismatched,
            unexpected: self.failures.len() - mismatched,
            missing: self.expected.len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use uartvip_proto::{FrameFormat, Parity};

    use super::*;

    fn frame(data: u8, good_parity: bool, at_ns: u64) -> Transaction {
        Transaction::new(
            data,
            FrameFormat::eight_bit(Some(Parity::Odd)),
            good_parity,
            Duration::from_nanos(at_ns),
        )
    }

    #[test]
    fn matching_ignores_timestamps() {
        let mut board = Scoreboard::new();
        board.expect(frame(0x55, true, 0));
        assert!(board.observe(frame(0x55, true, 1_145_826)));

        let report = board.report();
        assert_eq!(report, ScoreboardReport { matched: 1, ..Default::default() });
        assert!(report.passed());
    }

    #[test]
    fn parity_difference_is_a_mismatch() {
        let mut board = Scoreboard::new();
        board.expect(frame(0x55, true, 0));
        assert!(!board.observe(frame(0x55, false, 0)));

        assert!(matches!(
            board.failures(),
            [ScoreFailure::Mismatch { index: 0, reason: Mismatch::ParityBit { .. }, .. }]
        ));
        assert!(!board.report().passed());
    }

    #[test]
    fn extra_and_missing_frames_are_counted() {
        let mut board = Scoreboard::new();
        board.observe(frame(0x01, true, 0));
        board.expect(frame(0x02, true, 0));
        board.expect(frame(0x03, true, 0));
        board.observe(frame(0x02, true, 0));

        let report = board.report();
        assert_eq!(report.to_string(), "1 matched, 0 mismatched, 1 unexpected, 1 missing");
        assert_eq!(board.pending(), 1);
    }
}
