//! Named pins of a simulated design.
//!
//! Endpoints bind by path through [`LineResolver`]. `SimDut` maps each path
//! to a [`SimLine`]; two paths connected to the same line form one wire.

use std::collections::BTreeMap;

use uartvip_core::{BindError, LineResolver};

use crate::{SimLine, clock::SimClock};

/// Pin map of a simulated design.
pub struct SimDut {
    clock: SimClock,
    pins: BTreeMap<String, SimLine>,
}

impl SimDut {
    pub(crate) fn new(clock: SimClock) -> Self {
        Self { clock, pins: BTreeMap::new() }
    }

    /// Create an idle-high pin at `path`, replacing any previous one.
    pub fn add_pin(&mut self, path: &str) -> SimLine {
        let line = SimLine::new(path, self.clock.clone(), true);
        self.pins.insert(path.to_owned(), line.clone());
        line
    }

    /// Expose an existing line under `path`.
    pub fn connect(&mut self, path: &str, line: &SimLine) {
        self.pins.insert(path.to_owned(), line.clone());
    }

    /// Line bound at `path`.
    pub fn pin(&self, path: &str) -> Option<&SimLine> {
        self.pins.get(path)
    }

    /// Every bound path, sorted.
    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.pins.keys().map(String::as_str)
    }
}

impl LineResolver for SimDut {
    type Line = SimLine;

    fn resolve(&self, path: &str) -> Result<SimLine, BindError> {
        if path.trim().is_empty() {
            return Err(BindError::EmptyPinName);
        }
        self.pins.get(path).cloned().ok_or_else(|| BindError::UnknownPin { path: path.to_owned() })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn connected_paths_share_a_wire() {
        let mut dut = SimDut::new(SimClock::default());
        let tx = dut.add_pin("uart0.tx");
        dut.connect("uart1.rx", &tx);

        let rx = dut.resolve("uart1.rx").unwrap();
        assert!(rx.same_wire(&tx));
        assert_eq!(dut.paths().collect::<Vec<_>>(), vec!["uart0.tx", "uart1.rx"]);
    }

    #[test]
    fn unknown_and_empty_paths_fail() {
        let dut = SimDut::new(SimClock::default());
        assert_eq!(
            dut.resolve("uart0.tx").unwrap_err(),
            BindError::UnknownPin { path: "uart0.tx".to_owned() }
        );
        assert_eq!(dut.resolve("").unwrap_err(), BindError::EmptyPinName);
    }
}
