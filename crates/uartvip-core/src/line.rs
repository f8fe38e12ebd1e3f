//! Line signal capability and typed pin binding.
//!
//! An endpoint holds up to two lines: the one it drives and the one it
//! observes. They may be the same wire in a loopback topology or different
//! wires when transmit and receive are split; nothing here assumes either.

use std::future::Future;

use crate::error::BindError;

/// A single-bit signal in the simulated design.
///
/// `true` is logic high. An idle UART line is high.
pub trait Line: Clone + Send + Sync + 'static {
    /// Drive the line to `level`.
    fn drive(&self, level: bool);

    /// Current level of the line.
    fn level(&self) -> bool;

    /// Completes on the next high-to-low transition.
    ///
    /// Any fall at the current simulated instant counts as "next", including
    /// one that happened earlier in the same instant, before this call. A
    /// fall at an earlier instant never does.
    fn falling_edge(&self) -> impl Future<Output = ()> + Send;
}

/// Maps symbolic pin paths (e.g. `"uart0.tx"`) to lines.
///
/// Resolution happens once, when an endpoint is bound. Unknown paths are an
/// error at that point rather than a broken handle discovered mid-frame.
pub trait LineResolver {
    /// Line type produced by this resolver.
    type Line: Line;

    /// Resolve a pin path.
    ///
    /// # Errors
    ///
    /// - `BindError::EmptyPinName` if `path` is blank
    /// - `BindError::UnknownPin` if nothing is bound at `path`
    fn resolve(&self, path: &str) -> Result<Self::Line, BindError>;
}

/// Pin paths an endpoint should bind to.
///
/// Named from the endpoint's point of view: `drive` is the pin the endpoint
/// writes (the design's RX input), `observe` the pin it samples (the design's
/// TX output).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PinNames {
    /// Pin driven by the endpoint
    pub drive: Option<String>,
    /// Pin sampled by the endpoint
    pub observe: Option<String>,
}

impl PinNames {
    /// No pins.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the driven pin.
    #[must_use]
    pub fn drive(mut self, path: impl Into<String>) -> Self {
        self.drive = Some(path.into());
        self
    }

    /// Set the observed pin.
    #[must_use]
    pub fn observe(mut self, path: impl Into<String>) -> Self {
        self.observe = Some(path.into());
        self
    }

    /// Drive and observe the same pin.
    pub fn loopback(path: impl Into<String>) -> Self {
        let path = path.into();
        Self { drive: Some(path.clone()), observe: Some(path) }
    }
}
