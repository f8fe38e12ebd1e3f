//! UART verification endpoint.
//!
//! Models both sides of a UART link for exercising a design under
//! simulation: an [`Endpoint`] drives frames onto one line and/or recovers
//! frames from another, sampling each bit slot with randomized timing.
//!
//! # Architecture
//!
//! The crate never talks to a simulator directly. Everything that waits or
//! touches a signal goes through two injected capabilities:
//!
//! - [`Environment`]: simulated time, delays and seeded randomness
//! - [`Line`]: a boolean signal that can be driven, read and watched for
//!   falling edges
//!
//! Pure logic ([`FrameAssembler`], [`SamplePlan`], the codec in
//! [`uartvip_proto`]) takes no capabilities at all, which keeps it testable
//! without any executor. The `uartvip-harness` crate supplies a deterministic
//! discrete-event implementation of both capabilities.
//!
//! # Components
//!
//! - [`Endpoint`]: configuration, role and the transmit/receive operations
//! - [`BitSampler`]: one sample per bit slot, one bit period per call
//! - [`FrameAssembler`]: link phase state machine for a single frame
//! - [`IdAllocator`]: run-scoped endpoint identifiers

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod assembler;
pub mod config;
pub mod endpoint;
pub mod env;
pub mod error;
pub mod id;
pub mod line;
pub mod sampler;

pub use assembler::{FrameAssembler, LinkPhase};
pub use config::{Role, UartConfig};
pub use endpoint::Endpoint;
pub use env::Environment;
pub use error::{AssemblerError, BindError, ConfigError, Direction, EndpointError};
pub use id::{IdAllocator, VipId};
pub use line::{Line, LineResolver, PinNames};
pub use sampler::{BitSampler, SampleMode, SamplePlan};
pub use uartvip_proto::{FrameFormat, FrameStatus, Parity, Transaction};
