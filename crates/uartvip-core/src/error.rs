//! Error types for the UART endpoint.
//!
//! Strongly-typed errors for each layer: configuration, pin binding, the
//! frame assembler and endpoint operations. Framing and parity problems on
//! the line are not errors; they are reported through
//! [`Transaction`](uartvip_proto::Transaction) validity accessors.

use std::fmt;

use thiserror::Error;
use uartvip_proto::{FrameFormat, ProtocolError};

use crate::{Role, VipId, assembler::LinkPhase};

/// Which of the endpoint's two lines an error refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Line driven by the endpoint
    Drive,
    /// Line sampled by the endpoint
    Observe,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Drive => f.write_str("drive"),
            Self::Observe => f.write_str("observe"),
        }
    }
}

/// Invalid endpoint configuration.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// Baud rate of zero has no bit period
    #[error("baud rate must be non-zero")]
    ZeroBaudRate,

    /// Bit period too short to place a sample strictly inside the slot
    #[error("baud rate {baud_rate} gives a {bit_period_ns}ns bit period (minimum 2ns)")]
    BaudRateTooHigh {
        /// Requested baud rate
        baud_rate: u32,
        /// Resulting bit period in nanoseconds
        bit_period_ns: u64,
    },

    /// Unsupported frame format
    #[error("invalid frame format: {0}")]
    Format(#[from] ProtocolError),
}

/// Failure to bind an endpoint to its pins.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BindError {
    /// Pin path was empty
    #[error("pin path is empty")]
    EmptyPinName,

    /// Nothing is bound at this path
    #[error("no signal at pin path {path:?}")]
    UnknownPin {
        /// Path that failed to resolve
        path: String,
    },

    /// The role needs a pin that was not supplied
    #[error("{role} endpoint requires a pin to {direction}")]
    MissingPin {
        /// Role being bound
        role: Role,
        /// Missing pin
        direction: Direction,
    },
}

/// Frame assembler misuse.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AssemblerError {
    /// Operation not valid in the current link phase
    #[error("invalid link phase: cannot {operation} while {phase}")]
    InvalidPhase {
        /// Phase when the operation was attempted
        phase: LinkPhase,
        /// Operation that was attempted
        operation: &'static str,
    },

    /// Decoding the collected samples failed
    #[error("decode failed: {0}")]
    Decode(#[from] ProtocolError),
}

/// Errors returned by [`Endpoint`](crate::Endpoint) operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EndpointError {
    /// Operation needs a role the endpoint does not have
    #[error("role error: {operation} on vip {id} requires an active endpoint, found {role}")]
    Role {
        /// Endpoint that rejected the operation
        id: VipId,
        /// Role of that endpoint
        role: Role,
        /// Operation that was attempted
        operation: &'static str,
    },

    /// No line bound for the requested direction
    #[error("vip {id} has no {direction} line bound")]
    NotBound {
        /// Endpoint without the line
        id: VipId,
        /// Missing direction
        direction: Direction,
    },

    /// Transaction built for another frame format
    #[error("format mismatch on vip {id}: endpoint uses {expected}, transaction has {actual}")]
    FormatMismatch {
        /// Endpoint receiving the transaction
        id: VipId,
        /// Endpoint's format
        expected: FrameFormat,
        /// Transaction's format
        actual: FrameFormat,
    },

    /// Configuration rejected at bind time
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Pin binding failed
    #[error("bind error: {0}")]
    Bind(#[from] BindError),

    /// Frame assembly failed
    #[error("assembler error: {0}")]
    Assembler(#[from] AssemblerError),
}

impl EndpointError {
    /// Returns true if the operation was rejected because of the endpoint's
    /// role.
    pub fn is_role_error(&self) -> bool {
        matches!(self, Self::Role { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_error_is_classified() {
        let err = EndpointError::Role { id: VipId::new(3), role: Role::Passive, operation: "transmit" };
        assert!(err.is_role_error());
        assert_eq!(
            err.to_string(),
            "role error: transmit on vip 3 requires an active endpoint, found passive"
        );
    }

    #[test]
    fn binding_failures_are_not_role_errors() {
        let err = EndpointError::from(BindError::UnknownPin { path: "dut.rx".to_string() });
        assert!(!err.is_role_error());
        assert_eq!(err.to_string(), "bind error: no signal at pin path \"dut.rx\"");
    }

    #[test]
    fn missing_pin_names_role_and_direction() {
        let err = BindError::MissingPin { role: Role::Passive, direction: Direction::Observe };
        assert_eq!(err.to_string(), "passive endpoint requires a pin to observe");
    }
}
