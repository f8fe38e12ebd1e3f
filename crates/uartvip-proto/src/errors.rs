//! Error types for frame formatting and transaction comparison.

use thiserror::Error;

use crate::FrameFormat;

/// Result alias for protocol operations.
pub type Result<T> = std::result::Result<T, ProtocolError>;

/// Errors raised while building formats or decoding slot samples.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    /// Data width outside the supported range
    #[error("unsupported data width: {0} bits (supported: {min}..={max})", min = FrameFormat::MIN_DATA_BITS, max = FrameFormat::MAX_DATA_BITS)]
    InvalidDataBits(u8),

    /// Decoder was handed the wrong number of slot samples
    #[error("slot count mismatch: format needs {expected} samples, got {actual}")]
    SampleCount {
        /// Slots required by the frame format
        expected: usize,
        /// Samples actually supplied
        actual: usize,
    },
}

/// First field in which an observed transaction differs from the expected
/// one.
///
/// Timestamps never take part in the comparison.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Mismatch {
    /// Width or parity mode differs
    #[error("frame format mismatch: expected {expected}, observed {observed}")]
    Format {
        /// Format of the expected transaction
        expected: FrameFormat,
        /// Format of the observed transaction
        observed: FrameFormat,
    },

    /// Start bit was not sampled at the expected level
    #[error("start bit mismatch: expected {expected}, observed {observed}")]
    StartBit {
        /// Expected level
        expected: u8,
        /// Observed level
        observed: u8,
    },

    /// Data value differs
    #[error("data mismatch: expected {expected:#04x}, observed {observed:#04x}")]
    Data {
        /// Expected data value
        expected: u8,
        /// Observed data value
        observed: u8,
    },

    /// Parity bit differs
    #[error("parity bit mismatch: expected {expected}, observed {observed}")]
    ParityBit {
        /// Expected level
        expected: u8,
        /// Observed level
        observed: u8,
    },

    /// Stop bit was not sampled at the expected level
    #[error("stop bit mismatch: expected {expected}, observed {observed}")]
    StopBit {
        /// Expected level
        expected: u8,
        /// Observed level
        observed: u8,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Parity;

    #[test]
    fn data_mismatch_renders_hex() {
        let err = Mismatch::Data { expected: 0x55, observed: 0x54 };
        assert_eq!(err.to_string(), "data mismatch: expected 0x55, observed 0x54");
    }

    #[test]
    fn format_mismatch_uses_short_notation() {
        let err = Mismatch::Format {
            expected: FrameFormat::eight_bit(Some(Parity::Odd)),
            observed: FrameFormat::eight_bit(None),
        };
        assert_eq!(err.to_string(), "frame format mismatch: expected 8O1, observed 8N1");
    }

    #[test]
    fn invalid_width_names_supported_range() {
        assert_eq!(
            ProtocolError::InvalidDataBits(9).to_string(),
            "unsupported data width: 9 bits (supported: 5..=8)"
        );
    }
}
