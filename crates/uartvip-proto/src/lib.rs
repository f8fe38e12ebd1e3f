//! UART frame protocol types.
//!
//! Pure data and codec layer shared by the endpoint and the simulation
//! harness. Nothing in this crate waits, logs or touches a line: it maps
//! between byte values and the per-slot line levels of an asynchronous serial
//! frame.
//!
//! # Frame Shape
//!
//! ```text
//!  idle ─┐     ┌──┬──┬──┬──┬──┬──┬──┬──┬──────┬──────── idle
//!        │start│d0│d1│d2│d3│d4│d5│d6│d7│parity│stop
//!        └─────┴──┴──┴──┴──┴──┴──┴──┴──┴──────┘
//! ```
//!
//! Start is always driven low, stop high, data LSB first. Parity is optional
//! and is the XOR of the data bits, inverted for odd parity. Each slot lasts
//! exactly one bit period.
//!
//! # Components
//!
//! - [`FrameFormat`]: data width and parity mode
//! - [`Transaction`]: immutable record of one frame
//! - [`codec`]: frame encoding and decoding

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod codec;
pub mod errors;
pub mod format;
pub mod transaction;

pub use codec::{decode, encode, encode_transaction, render_slots};
pub use errors::{Mismatch, ProtocolError, Result};
pub use format::{FrameFormat, Parity};
pub use transaction::{FrameStatus, LineFields, Transaction};
