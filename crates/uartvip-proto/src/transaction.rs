//! Transaction record for one serial frame.
//!
//! A `Transaction` is built exactly once, either from an intended data value
//! (transmit side) or from sampled line levels (receive side), and is never
//! mutated afterwards. Levels are stored as `bool` with `true` meaning logic
//! high.

use std::{fmt, time::Duration};

use serde::{Serialize, Serializer};

use crate::{FrameFormat, Parity, errors::Mismatch};

/// Line levels of a frame's fields, as sampled or as they should be driven.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineFields {
    /// Start slot level (low in a well-formed frame)
    pub start_bit: bool,
    /// Data value, LSB sent first
    pub data: u8,
    /// Parity slot level. Ignored when the format has no parity.
    pub parity_bit: bool,
    /// Stop slot level (high in a well-formed frame)
    pub stop_bit: bool,
}

/// Overall validity of a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FrameStatus {
    /// Start low, stop high, parity matches the data
    Valid,
    /// Start bit high or stop bit low
    FramingError,
    /// Framing is fine but the parity bit does not match the data
    ParityError,
}

/// One complete serial frame, observed or synthesized.
///
/// # Invariants
///
/// - `data` is masked to the format's width.
/// - `parity_bit` is `Some` exactly when the format enables parity.
/// - Built by [`Transaction::new`] the parity bit is correct for `data`,
///   unless bad parity was requested, in which case it is the complement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Transaction {
    format: FrameFormat,
    start_bit: bool,
    data: u8,
    parity_bit: Option<bool>,
    stop_bit: bool,
    #[serde(rename = "timestamp_ns", serialize_with = "serialize_nanos")]
    timestamp: Duration,
}

fn serialize_nanos<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_u128(value.as_nanos())
}

impl Transaction {
    /// Intended frame for `data`.
    ///
    /// With `good_parity == false` the parity bit is inverted, producing a
    /// frame a receiver should flag with [`FrameStatus::ParityError`]. Has no
    /// effect when the format has no parity.
    pub fn new(data: u8, format: FrameFormat, good_parity: bool, timestamp: Duration) -> Self {
        let data = data & format.data_mask();
        let parity_bit = format.parity_bit(data).map(|bit| if good_parity { bit } else { !bit });

        Self { format, start_bit: false, data, parity_bit, stop_bit: true, timestamp }
    }

    /// Frame reconstructed from line levels, recorded verbatim.
    ///
    /// Parity is not recomputed here. Use [`Transaction::parity_ok`] or
    /// [`Transaction::check_against`] to judge it.
    pub fn observed(format: FrameFormat, fields: LineFields, timestamp: Duration) -> Self {
        Self {
            format,
            start_bit: fields.start_bit,
            data: fields.data & format.data_mask(),
            parity_bit: format.parity().map(|_| fields.parity_bit),
            stop_bit: fields.stop_bit,
            timestamp,
        }
    }

    /// Frame format this transaction was built for.
    pub fn format(&self) -> FrameFormat {
        self.format
    }

    /// Start slot level.
    pub fn start_bit(&self) -> bool {
        self.start_bit
    }

    /// Data value.
    pub fn data(&self) -> u8 {
        self.data
    }

    /// Whether the frame carries a parity slot.
    pub fn has_parity(&self) -> bool {
        self.parity_bit.is_some()
    }

    /// Parity polarity, if enabled.
    pub fn parity_type(&self) -> Option<Parity> {
        self.format.parity()
    }

    /// Parity slot level, if enabled.
    pub fn parity_bit(&self) -> Option<bool> {
        self.parity_bit
    }

    /// Stop slot level.
    pub fn stop_bit(&self) -> bool {
        self.stop_bit
    }

    /// Simulation time at which the frame was started (transmit) or
    /// recognized (receive).
    pub fn timestamp(&self) -> Duration {
        self.timestamp
    }

    /// Start slot was sampled low.
    pub fn start_bit_ok(&self) -> bool {
        !self.start_bit
    }

    /// Stop slot was sampled high.
    pub fn stop_bit_ok(&self) -> bool {
        self.stop_bit
    }

    /// Parity slot matches the parity recomputed over `data`. Always true
    /// without parity.
    pub fn parity_ok(&self) -> bool {
        self.parity_bit == self.format.parity_bit(self.data)
    }

    /// Framing problems take precedence over parity problems.
    pub fn status(&self) -> FrameStatus {
        if !self.start_bit_ok() || !self.stop_bit_ok() {
            FrameStatus::FramingError
        } else if !self.parity_ok() {
            FrameStatus::ParityError
        } else {
            FrameStatus::Valid
        }
    }

    /// Line levels of every field.
    pub fn fields(&self) -> LineFields {
        LineFields {
            start_bit: self.start_bit,
            data: self.data,
            parity_bit: self.parity_bit.unwrap_or(false),
            stop_bit: self.stop_bit,
        }
    }

    /// Compare this (observed) transaction with an expected one.
    ///
    /// Fields are checked in wire order after the format; the first
    /// difference is returned. Timestamps are ignored.
    pub fn check_against(&self, expected: &Self) -> Result<(), Mismatch> {
        if self.format != expected.format {
            return Err(Mismatch::Format { expected: expected.format, observed: self.format });
        }
        if self.start_bit != expected.start_bit {
            return Err(Mismatch::StartBit {
                expected: u8::from(expected.start_bit),
                observed: u8::from(self.start_bit),
            });
        }
        if self.data != expected.data {
            return Err(Mismatch::Data { expected: expected.data, observed: self.data });
        }
        if let (Some(expected_bit), Some(observed_bit)) = (expected.parity_bit, self.parity_bit)
            && expected_bit != observed_bit
        {
            return Err(Mismatch::ParityBit {
                expected: u8::from(expected_bit),
                observed: u8::from(observed_bit),
            });
        }
        if self.stop_bit != expected.stop_bit {
            return Err(Mismatch::StopBit {
                expected: u8::from(expected.stop_bit),
                observed: u8::from(self.stop_bit),
            });
        }
        Ok(())
    }
}

impl fmt::Display for Transaction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<uart {} data={:#04x}", self.format, self.data)?;
        if let Some(bit) = self.parity_bit {
            write!(f, " parity={}", u8::from(bit))?;
        }
        write!(f, " stop={} t={}ns>", u8::from(self.stop_bit), self.timestamp.as_nanos())
    }
}
