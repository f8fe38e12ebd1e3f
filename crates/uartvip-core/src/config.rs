//! Endpoint configuration.
//!
//! Fixed when the endpoint is bound; there is no baud renegotiation. The
//! defaults match a 9600 baud, 8 data bit, odd parity, active transmitter.

use std::{fmt, time::Duration};

use serde::{Deserialize, Serialize};
use uartvip_proto::{FrameFormat, Parity};

use crate::error::ConfigError;

/// Default line speed in bits per second.
pub const DEFAULT_BAUD_RATE: u32 = 9600;

/// Default data bits per frame.
pub const DEFAULT_DATA_BITS: u8 = 8;

/// Default parity mode.
pub const DEFAULT_PARITY: Option<Parity> = Some(Parity::Odd);

/// Shortest bit period that still leaves room for a sample strictly inside
/// the slot (offsets are drawn from `[1, bit_period - 1]`).
pub const MIN_BIT_PERIOD_NS: u64 = 2;

const NANOS_PER_SEC: u64 = 1_000_000_000;

/// Whether an endpoint may drive its line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Drives the line as a transmitter; may also observe
    Active,
    /// Observe-only monitor
    Passive,
}

impl Role {
    /// Active endpoints own a drive line.
    pub fn can_drive(self) -> bool {
        matches!(self, Self::Active)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Active => f.write_str("active"),
            Self::Passive => f.write_str("passive"),
        }
    }
}

/// UART endpoint configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UartConfig {
    /// Bits per second
    pub baud_rate: u32,
    /// Data bits per frame (5..=8)
    pub data_bits: u8,
    /// Parity mode, `None` for no parity slot
    pub parity: Option<Parity>,
    /// Active transmitter or passive monitor
    pub role: Role,
}

impl Default for UartConfig {
    fn default() -> Self {
        Self {
            baud_rate: DEFAULT_BAUD_RATE,
            data_bits: DEFAULT_DATA_BITS,
            parity: DEFAULT_PARITY,
            role: Role::Active,
        }
    }
}

impl UartConfig {
    /// Default configuration in the passive role.
    pub fn passive() -> Self {
        Self { role: Role::Passive, ..Self::default() }
    }

    /// Set the baud rate.
    #[must_use]
    pub fn with_baud_rate(mut self, baud_rate: u32) -> Self {
        self.baud_rate = baud_rate;
        self
    }

    /// Set the data width.
    #[must_use]
    pub fn with_data_bits(mut self, data_bits: u8) -> Self {
        self.data_bits = data_bits;
        self
    }

    /// Set the parity mode.
    #[must_use]
    pub fn with_parity(mut self, parity: Option<Parity>) -> Self {
        self.parity = parity;
        self
    }

    /// Set the role.
    #[must_use]
    pub fn with_role(mut self, role: Role) -> Self {
        self.role = role;
        self
    }

    /// Bit period in whole nanoseconds: `1e9 / baud_rate`, truncated.
    ///
    /// Zero for a zero baud rate; [`UartConfig::validate`] rejects that.
    pub fn bit_period(&self) -> Duration {
        Duration::from_nanos(self.bit_period_ns())
    }

    fn bit_period_ns(&self) -> u64 {
        NANOS_PER_SEC.checked_div(u64::from(self.baud_rate)).unwrap_or(0)
    }

    /// Frame format described by this configuration.
    pub fn frame_format(&self) -> Result<FrameFormat, ConfigError> {
        Ok(FrameFormat::new(self.data_bits, self.parity)?)
    }

    /// Check the configuration is usable.
    ///
    /// # Errors
    ///
    /// - `ConfigError::ZeroBaudRate` for a zero baud rate
    /// - `ConfigError::BaudRateTooHigh` if the bit period is under
    ///   [`MIN_BIT_PERIOD_NS`]
    /// - `ConfigError::Format` for an unsupported data width
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.baud_rate == 0 {
            return Err(ConfigError::ZeroBaudRate);
        }

        let bit_period_ns = self.bit_period_ns();
        if bit_period_ns < MIN_BIT_PERIOD_NS {
            return Err(ConfigError::BaudRateTooHigh { baud_rate: self.baud_rate, bit_period_ns });
        }

        self.frame_format()?;
        Ok(())
    }
}
