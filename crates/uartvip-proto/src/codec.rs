//! Frame codec: byte values to slot levels and back.
//!
//! Encoding yields one level per slot in wire order. Decoding takes one
//! sample per slot and reports what was observed; it never recomputes or
//! corrects parity, so corrupted frames survive decoding unchanged.

use std::time::Duration;

use crate::{
    FrameFormat, LineFields, Transaction,
    errors::{ProtocolError, Result},
};

/// Encode `data` into slot levels for `format`.
///
/// With `good_parity == false` the parity slot carries the complement of the
/// correct parity.
pub fn encode(data: u8, format: FrameFormat, good_parity: bool) -> Vec<bool> {
    encode_transaction(&Transaction::new(data, format, good_parity, Duration::ZERO))
}

/// Slot levels of a prepared transaction, fields taken verbatim.
///
/// Lets negative tests drive frames with a high start bit, a low stop bit or
/// a wrong parity bit.
pub fn encode_transaction(txn: &Transaction) -> Vec<bool> {
    let format = txn.format();
    let mut slots = Vec::with_capacity(format.slot_count());

    slots.push(txn.start_bit());
    slots.extend((0..format.data_bits()).map(|i| (txn.data() >> i) & 1 == 1));
    if let Some(parity_bit) = txn.parity_bit() {
        slots.push(parity_bit);
    }
    slots.push(txn.stop_bit());

    debug_assert_eq!(slots.len(), format.slot_count());
    slots
}

/// Rebuild a transaction from one sample per slot.
///
/// # Errors
///
/// - `ProtocolError::SampleCount` if `samples` does not hold exactly
///   `format.slot_count()` entries
pub fn decode(samples: &[bool], format: FrameFormat, timestamp: Duration) -> Result<Transaction> {
    if samples.len() != format.slot_count() {
        return Err(ProtocolError::SampleCount {
            expected: format.slot_count(),
            actual: samples.len(),
        });
    }

    let data_end = 1 + usize::from(format.data_bits());
    let data = samples[1..data_end]
        .iter()
        .enumerate()
        .fold(0u8, |acc, (i, &bit)| acc | (u8::from(bit) << i));

    let fields = LineFields {
        start_bit: samples[0],
        data,
        parity_bit: format.parity_slot().is_some_and(|slot| samples[slot]),
        stop_bit: samples[format.stop_slot()],
    };

    Ok(Transaction::observed(format, fields, timestamp))
}

/// Render slot levels as `start|data|parity|stop`, e.g. `0|10101010|1|1`.
///
/// Data is printed in wire order (LSB first). Slots beyond the format are
/// appended after a trailing `|`.
pub fn render_slots(slots: &[bool], format: FrameFormat) -> String {
    let level = |bit: &bool| if *bit { '1' } else { '0' };
    let mut out = String::with_capacity(slots.len() + 4);

    for (index, bit) in slots.iter().enumerate() {
        let boundary = index == 1
            || index == 1 + usize::from(format.data_bits())
            || (format.parity().is_some() && index == format.stop_slot());
        if boundary {
            out.push('|');
        }
        out.push(level(bit));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{FrameStatus, Parity};

    #[test]
    fn encodes_0x55_with_odd_parity() {
        let format = FrameFormat::eight_bit(Some(Parity::Odd));
        let slots = encode(0x55, format, true);
        let expected = [false, true, false, true, false, true, false, true, false, true, true];
        assert_eq!(slots, expected);
        insta::assert_snapshot!(render_slots(&slots, format), @"0|10101010|1|1");
    }

    #[test]
    fn encodes_without_parity() {
        let format = FrameFormat::eight_bit(None);
        let slots = encode(0x0F, format, true);
        insta::assert_snapshot!(render_slots(&slots, format), @"0|11110000|1");
    }

    #[test]
    fn decodes_scenario_frame() {
        let format = FrameFormat::eight_bit(Some(Parity::Odd));
        let samples = [false, true, false, true, false, true, false, true, false, true, true];
        let txn = decode(&samples, format, Duration::from_nanos(42)).unwrap();

        assert_eq!(txn.data(), 0x55);
        assert_eq!(txn.parity_bit(), Some(true));
        assert!(txn.stop_bit());
        assert_eq!(txn.timestamp(), Duration::from_nanos(42));
    }

    #[test]
    fn decode_reports_corruption_verbatim() {
        let format = FrameFormat::eight_bit(Some(Parity::Even));
        let mut samples = encode(0x3C, format, true);
        let parity_slot = format.parity_slot().unwrap();
        samples[parity_slot] = !samples[parity_slot];
        samples[format.stop_slot()] = false;

        let txn = decode(&samples, format, Duration::ZERO).unwrap();
        assert_eq!(txn.data(), 0x3C);
        assert!(!txn.parity_ok());
        assert_eq!(txn.status(), FrameStatus::FramingError);
    }

    #[test]
    fn decode_rejects_wrong_sample_count() {
        let format = FrameFormat::eight_bit(None);
        let err = decode(&[false; 11], format, Duration::ZERO).unwrap_err();
        assert_eq!(err, ProtocolError::SampleCount { expected: 10, actual: 11 });
    }

    #[test]
    fn encode_transaction_drives_injected_fields() {
        let format = FrameFormat::new(5, Some(Parity::Odd)).unwrap();
        let fields = LineFields { start_bit: false, data: 0x1F, parity_bit: true, stop_bit: false };
        let txn = Transaction::observed(format, fields, Duration::ZERO);
        insta::assert_snapshot!(render_slots(&encode_transaction(&txn), format), @"0|11111|1|0");
    }
}
