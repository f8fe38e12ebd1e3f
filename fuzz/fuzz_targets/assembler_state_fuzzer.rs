//! Fuzz target for the receive-side frame assembler
//!
//! # Strategy
//!
//! - Arbitrary interleavings of start, push, finish and reset
//! - Every supported frame format
//!
//! # Invariants
//!
//! - Never panics; misuse returns `AssemblerError::InvalidPhase`
//! - Never holds more samples than the format has slots
//! - `finish` succeeds exactly when the phase is `FrameComplete`

#![no_main]

use std::time::Duration;

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use uartvip_core::{FrameAssembler, FrameFormat, LinkPhase, Parity};

#[derive(Debug, Clone, Arbitrary)]
enum AssemblerOp {
    Start,
    Push(bool),
    Finish(u64),
    Reset,
}

fuzz_target!(|input: (u8, Option<bool>, Vec<AssemblerOp>)| {
    let (data_bits, parity, ops) = input;
    let parity = parity.map(|odd| if odd { Parity::Odd } else { Parity::Even });
    let Ok(format) = FrameFormat::new(5 + data_bits % 4, parity) else {
        return;
    };

    let mut assembler = FrameAssembler::new(format);
    for op in ops {
        let before = assembler.phase();
        match op {
            AssemblerOp::Start => {
                assert_eq!(assembler.start().is_ok(), before == LinkPhase::Idle);
            },
            AssemblerOp::Push(level) => {
                let _ = assembler.push(level);
            },
            AssemblerOp::Finish(ns) => {
                let result = assembler.finish(Duration::from_nanos(ns));
                assert_eq!(result.is_ok(), before == LinkPhase::FrameComplete);
                if result.is_ok() {
                    assert_eq!(assembler.phase(), LinkPhase::Idle);
                }
            },
            AssemblerOp::Reset => assembler.reset(),
        }
        assert!(assembler.samples().len() <= format.slot_count());
    }
});
