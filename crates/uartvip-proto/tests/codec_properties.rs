//! Property-based tests for the frame codec.
//!
//! These verify framing and parity rules for every byte value and every
//! supported format, not just specific examples.

use std::time::Duration;

use proptest::prelude::*;
use uartvip_proto::{FrameFormat, FrameStatus, Parity, Transaction, decode, encode};

/// Strategy for generating every supported frame format
fn arbitrary_format() -> impl Strategy<Value = FrameFormat> {
    (
        FrameFormat::MIN_DATA_BITS..=FrameFormat::MAX_DATA_BITS,
        prop_oneof![Just(None), Just(Some(Parity::Odd)), Just(Some(Parity::Even))],
    )
        .prop_map(|(data_bits, parity)| {
            FrameFormat::new(data_bits, parity).expect("strategy only yields supported widths")
        })
}

#[test]
fn prop_encode_decode_roundtrip() {
    proptest!(|(data in any::<u8>(), format in arbitrary_format())| {
        let slots = encode(data, format, true);
        let txn = decode(&slots, format, Duration::ZERO).expect("slot count matches format");

        // PROPERTY: Decoding an encoded frame recovers the masked data
        prop_assert_eq!(txn.data(), data & format.data_mask());
        prop_assert!(!txn.start_bit());
        prop_assert!(txn.stop_bit());
        prop_assert_eq!(txn.parity_bit(), format.parity_bit(data));
        prop_assert_eq!(txn.status(), FrameStatus::Valid);
    });
}

#[test]
fn prop_frame_length_matches_format() {
    proptest!(|(data in any::<u8>(), format in arbitrary_format(), good_parity in any::<bool>())| {
        let slots = encode(data, format, good_parity);

        prop_assert_eq!(slots.len(), format.slot_count());
        prop_assert!(!slots[0], "start slot must be low");
        prop_assert!(slots[format.stop_slot()], "stop slot must be high");
    });
}

#[test]
fn prop_odd_parity_counts_ones() {
    proptest!(|(data in any::<u8>())| {
        let ones_even = data.count_ones() % 2 == 0;

        // PROPERTY: Odd parity bit is set iff the data has an even number of ones
        prop_assert_eq!(Parity::Odd.bit_for(data), ones_even);
        prop_assert_eq!(Parity::Even.bit_for(data), !ones_even);

        // Total ones across data and parity is odd for odd parity
        let total = data.count_ones() + u32::from(Parity::Odd.bit_for(data));
        prop_assert_eq!(total % 2, 1);
    });
}

#[test]
fn prop_bad_parity_only_changes_parity_slot() {
    proptest!(|(data in any::<u8>(), parity in prop_oneof![Just(Parity::Odd), Just(Parity::Even)])| {
        let format = FrameFormat::eight_bit(Some(parity));
        let good = encode(data, format, true);
        let bad = encode(data, format, false);
        let parity_slot = format.parity_slot().expect("parity enabled");

        for (slot, (g, b)) in good.iter().zip(&bad).enumerate() {
            if slot == parity_slot {
                prop_assert_ne!(g, b);
            } else {
                prop_assert_eq!(g, b);
            }
        }

        let txn = Transaction::new(data, format, false, Duration::ZERO);
        prop_assert_eq!(txn.status(), FrameStatus::ParityError);
    });
}

#[test]
fn prop_decode_never_recomputes_parity() {
    proptest!(|(data in any::<u8>(), format in arbitrary_format())| {
        let mut slots = encode(data, format, true);
        if let Some(slot) = format.parity_slot() {
            slots[slot] = !slots[slot];
        }
        let txn = decode(&slots, format, Duration::ZERO).expect("slot count matches format");

        // PROPERTY: The sampled parity bit is reported as observed
        prop_assert_eq!(txn.parity_bit(), format.parity_bit(data).map(|bit| !bit));
        prop_assert_eq!(txn.parity_ok(), format.parity().is_none());
    });
}
