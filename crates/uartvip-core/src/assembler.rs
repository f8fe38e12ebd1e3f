//! Link phase state machine for receiving one frame.
//!
//! Pure bookkeeping: the endpoint waits for the start edge and takes the
//! samples, the assembler tracks which slot comes next and turns the
//! collected samples into a [`Transaction`]. Transitions depend only on how
//! many slots have been sampled, never on the sampled values.
//!
//! # State Machine
//!
//! ```text
//! ┌──────┐ falling edge ┌───────────────┐  sample  ┌──────────────────────┐
//! │ Idle │─────────────>│ StartDetected │─────────>│ SamplingBits{index}  │──┐
//! └──────┘              └───────────────┘          └──────────────────────┘  │ sample
//!     ^                                                 │ last slot  ^───────┘
//!     │                 ┌───────────────┐               │
//!     └─────────────────│ FrameComplete │<──────────────┘
//!          finish       └───────────────┘
//! ```
//!
//! There is no error state. A frame with a bad stop bit still completes; the
//! next falling edge starts the next frame.

use std::{fmt, time::Duration};

use uartvip_proto::{FrameFormat, Transaction, decode};

use crate::{SampleMode, error::AssemblerError};

/// Receive-side link phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkPhase {
    /// Waiting for a falling edge
    Idle,
    /// Start edge seen, no slot sampled yet
    StartDetected,
    /// `index` slots sampled so far; `index` is the next slot to sample
    SamplingBits {
        /// Next slot to sample
        index: usize,
    },
    /// Every slot sampled, transaction ready
    FrameComplete,
}

impl fmt::Display for LinkPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => f.write_str("idle"),
            Self::StartDetected => f.write_str("start detected"),
            Self::SamplingBits { index } => write!(f, "sampling slot {index}"),
            Self::FrameComplete => f.write_str("frame complete"),
        }
    }
}

/// Collects slot samples for one frame at a time.
#[derive(Debug, Clone)]
pub struct FrameAssembler {
    format: FrameFormat,
    phase: LinkPhase,
    samples: Vec<bool>,
}

impl FrameAssembler {
    /// Idle assembler for `format`.
    pub fn new(format: FrameFormat) -> Self {
        Self { format, phase: LinkPhase::Idle, samples: Vec::with_capacity(format.slot_count()) }
    }

    /// Current phase.
    pub fn phase(&self) -> LinkPhase {
        self.phase
    }

    /// Frame format being assembled.
    pub fn format(&self) -> FrameFormat {
        self.format
    }

    /// Record the start edge.
    ///
    /// # Errors
    ///
    /// - `AssemblerError::InvalidPhase` unless idle
    pub fn start(&mut self) -> Result<(), AssemblerError> {
        if self.phase != LinkPhase::Idle {
            return Err(AssemblerError::InvalidPhase { phase: self.phase, operation: "start" });
        }
        self.samples.clear();
        self.phase = LinkPhase::StartDetected;
        Ok(())
    }

    /// Index of the next slot to sample, `None` outside the sampling phases.
    pub fn next_slot(&self) -> Option<usize> {
        match self.phase {
            LinkPhase::StartDetected => Some(0),
            LinkPhase::SamplingBits { index } => Some(index),
            LinkPhase::Idle | LinkPhase::FrameComplete => None,
        }
    }

    /// Sampling mode for the next slot: the start slot is sampled at its
    /// center, every other slot with jitter.
    pub fn next_mode(&self) -> Option<SampleMode> {
        self.next_slot().map(|slot| if slot == 0 { SampleMode::Center } else { SampleMode::Jittered })
    }

    /// Record the sample for the next slot and return the new phase.
    ///
    /// # Errors
    ///
    /// - `AssemblerError::InvalidPhase` if no slot is awaiting a sample
    pub fn push(&mut self, level: bool) -> Result<LinkPhase, AssemblerError> {
        if self.next_slot().is_none() {
            return Err(AssemblerError::InvalidPhase { phase: self.phase, operation: "push" });
        }

        self.samples.push(level);
        self.phase = if self.samples.len() == self.format.slot_count() {
            LinkPhase::FrameComplete
        } else {
            LinkPhase::SamplingBits { index: self.samples.len() }
        };

        debug_assert!(self.samples.len() <= self.format.slot_count());
        Ok(self.phase)
    }

    /// Emit the transaction and return to idle.
    ///
    /// # Errors
    ///
    /// - `AssemblerError::InvalidPhase` unless the frame is complete
    pub fn finish(&mut self, timestamp: Duration) -> Result<Transaction, AssemblerError> {
        if self.phase != LinkPhase::FrameComplete {
            return Err(AssemblerError::InvalidPhase { phase: self.phase, operation: "finish" });
        }

        let txn = decode(&self.samples, self.format, timestamp)?;
        self.reset();
        Ok(txn)
    }

    /// Drop any partial frame and return to idle.
    pub fn reset(&mut self) {
        self.samples.clear();
        self.phase = LinkPhase::Idle;
    }

    /// Samples collected for the current frame.
    pub fn samples(&self) -> &[bool] {
        &self.samples
    }
}

#[cfg(test)]
mod tests {
    use uartvip_proto::{Parity, encode};

    use super::*;

    #[test]
    fn walks_through_every_phase() {
        let format = FrameFormat::eight_bit(Some(Parity::Odd));
        let mut assembler = FrameAssembler::new(format);
        assert_eq!(assembler.phase(), LinkPhase::Idle);

        assembler.start().unwrap();
        assert_eq!(assembler.phase(), LinkPhase::StartDetected);
        assert_eq!(assembler.next_mode(), Some(SampleMode::Center));

        let slots = encode(0x55, format, true);
        for (i, level) in slots.iter().enumerate() {
            let phase = assembler.push(*level).unwrap();
            if i + 1 < slots.len() {
                assert_eq!(phase, LinkPhase::SamplingBits { index: i + 1 });
                assert_eq!(assembler.next_mode(), Some(SampleMode::Jittered));
            } else {
                assert_eq!(phase, LinkPhase::FrameComplete);
            }
        }

        let txn = assembler.finish(Duration::from_nanos(7)).unwrap();
        assert_eq!(txn.data(), 0x55);
        assert_eq!(assembler.phase(), LinkPhase::Idle);
        assert!(assembler.samples().is_empty());
    }

    #[test]
    fn push_before_start_is_rejected() {
        let mut assembler = FrameAssembler::new(FrameFormat::default());
        assert_eq!(
            assembler.push(false),
            Err(AssemblerError::InvalidPhase { phase: LinkPhase::Idle, operation: "push" })
        );
    }

    #[test]
    fn finish_requires_complete_frame() {
        let mut assembler = FrameAssembler::new(FrameFormat::default());
        assembler.start().unwrap();
        assembler.push(false).unwrap();
        assert!(matches!(
            assembler.finish(Duration::ZERO),
            Err(AssemblerError::InvalidPhase { phase: LinkPhase::SamplingBits { index: 1 }, .. })
        ));
    }

    #[test]
    fn push_after_complete_is_rejected() {
        let format = FrameFormat::eight_bit(None);
        let mut assembler = FrameAssembler::new(format);
        assembler.start().unwrap();
        for level in encode(0xA5, format, true) {
            assembler.push(level).unwrap();
        }
        assert!(assembler.push(true).is_err());
        assert_eq!(assembler.samples().len(), format.slot_count());
    }

    #[test]
    fn double_start_is_rejected() {
        let mut assembler = FrameAssembler::new(FrameFormat::default());
        assembler.start().unwrap();
        assert!(assembler.start().is_err());

        assembler.reset();
        assert_eq!(assembler.start(), Ok(()));
    }

    #[test]
    fn bad_stop_bit_still_completes() {
        let format = FrameFormat::eight_bit(None);
        let mut slots = encode(0x42, format, true);
        *slots.last_mut().unwrap() = false;

        let mut assembler = FrameAssembler::new(format);
        assembler.start().unwrap();
        for level in slots {
            assembler.push(level).unwrap();
        }
        let txn = assembler.finish(Duration::ZERO).unwrap();
        assert!(!txn.stop_bit_ok());
        assert_eq!(txn.data(), 0x42);
    }
}
