//! Frame format: data width and parity mode.
//!
//! The format fixes the slot layout of a frame. Slot 0 is the start bit,
//! slots `1..=data_bits` carry data LSB first, the optional parity slot
//! follows, and the stop bit is always last.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::errors::{ProtocolError, Result};

/// Parity polarity.
///
/// "Odd" means the total number of set bits across data and parity is odd.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Parity {
    /// Parity bit makes the count of ones odd
    Odd,
    /// Parity bit makes the count of ones even
    Even,
}

impl Parity {
    /// Correct parity bit for `data`.
    ///
    /// XOR-reduction of every bit in `data`, inverted for [`Parity::Odd`].
    /// Callers mask `data` to the frame width first.
    pub fn bit_for(self, data: u8) -> bool {
        let xor = data.count_ones() % 2 == 1;
        match self {
            Self::Even => xor,
            Self::Odd => !xor,
        }
    }
}

impl fmt::Display for Parity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Odd => f.write_str("odd"),
            Self::Even => f.write_str("even"),
        }
    }
}

/// Data width and parity mode of a frame.
///
/// # Invariants
///
/// - `data_bits` is within [`Self::MIN_DATA_BITS`]..=[`Self::MAX_DATA_BITS`].
///   Enforced by [`FrameFormat::new`].
/// - Exactly one start and one stop slot. Other stop-bit counts are not
///   modelled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct FrameFormat {
    data_bits: u8,
    parity: Option<Parity>,
}

impl FrameFormat {
    /// Narrowest supported data width.
    pub const MIN_DATA_BITS: u8 = 5;

    /// Widest supported data width.
    pub const MAX_DATA_BITS: u8 = 8;

    /// Create a format, rejecting unsupported widths.
    pub fn new(data_bits: u8, parity: Option<Parity>) -> Result<Self> {
        if !(Self::MIN_DATA_BITS..=Self::MAX_DATA_BITS).contains(&data_bits) {
            return Err(ProtocolError::InvalidDataBits(data_bits));
        }
        Ok(Self { data_bits, parity })
    }

    /// Eight data bits with the given parity mode.
    pub const fn eight_bit(parity: Option<Parity>) -> Self {
        Self { data_bits: 8, parity }
    }

    /// Number of data bits per frame.
    pub fn data_bits(&self) -> u8 {
        self.data_bits
    }

    /// Parity mode, `None` when the frame has no parity slot.
    pub fn parity(&self) -> Option<Parity> {
        self.parity
    }

    /// Mask selecting the data bits of a value.
    pub fn data_mask(&self) -> u8 {
        ((1u16 << self.data_bits) - 1) as u8
    }

    /// Total slots in a frame: start, data, optional parity, stop.
    pub fn slot_count(&self) -> usize {
        2 + usize::from(self.data_bits) + usize::from(self.parity.is_some())
    }

    /// Slot index of the parity bit.
    pub fn parity_slot(&self) -> Option<usize> {
        self.parity.map(|_| 1 + usize::from(self.data_bits))
    }

    /// Slot index of the stop bit.
    pub fn stop_slot(&self) -> usize {
        self.slot_count() - 1
    }

    /// Correct parity bit for `data` under this format.
    ///
    /// `data` is masked to the frame width before the parity is computed.
    pub fn parity_bit(&self, data: u8) -> Option<bool> {
        self.parity.map(|parity| parity.bit_for(data & self.data_mask()))
    }
}

impl Default for FrameFormat {
    fn default() -> Self {
        Self::eight_bit(Some(Parity::Odd))
    }
}

/// Short notation, e.g. `8O1` or `7N1`.
impl fmt::Display for FrameFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parity = match self.parity {
            None => 'N',
            Some(Parity::Odd) => 'O',
            Some(Parity::Even) => 'E',
        };
        write!(f, "{}{parity}1", self.data_bits)
    }
}
