//! Loopback testbench: one transmitter and one monitor on a single wire.
//!
//! The active endpoint drives `uart.line`, a passive endpoint with the same
//! frame format observes it. [`LoopbackBench::run`] sends a list of frames
//! back to back while the monitor decodes them, then scoreboards what was
//! sent against what was seen.

use std::{cell::RefCell, rc::Rc};

use serde::Serialize;
use thiserror::Error;
use tracing::info;
use uartvip_core::{
    Endpoint, EndpointError, IdAllocator, PinNames, Role, Transaction, UartConfig,
};

use crate::{Scoreboard, ScoreboardReport, SimEnv, SimError, SimLine, Simulation, Waveform};

/// Endpoint bound to simulated pins.
pub type SimEndpoint = Endpoint<SimEnv, SimLine>;

/// Pin path of the shared wire.
pub const LINE_PIN: &str = "uart.line";

/// Errors from a bench run.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BenchError {
    /// Endpoint operation failed
    #[error(transparent)]
    Endpoint(#[from] EndpointError),

    /// Simulation stalled or ran too long
    #[error(transparent)]
    Sim(#[from] SimError),
}

/// One frame to send.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Stimulus {
    /// Payload, masked to the data width
    pub data: u8,
    /// Whether the parity bit is correct
    pub good_parity: bool,
}

impl Stimulus {
    /// Frame with correct parity.
    pub fn good(data: u8) -> Self {
        Self { data, good_parity: true }
    }

    /// Frame with inverted parity.
    pub fn bad_parity(data: u8) -> Self {
        Self { data, good_parity: false }
    }
}

/// Outcome of [`LoopbackBench::run`].
#[derive(Debug, Clone, Serialize)]
pub struct LoopbackRun {
    /// Frames as the transmitter intended them
    pub sent: Vec<Transaction>,
    /// Frames as the monitor decoded them
    pub received: Vec<Transaction>,
    /// Scoreboard summary
    pub report: ScoreboardReport,
}

/// Active transmitter and passive monitor sharing one wire.
pub struct LoopbackBench {
    sim: Simulation,
    wire: SimLine,
    tx: Rc<SimEndpoint>,
    rx: Rc<SimEndpoint>,
}

impl LoopbackBench {
    /// Bind both endpoints with `config`'s line settings.
    ///
    /// The role in `config` is ignored: the transmitter is active and the
    /// monitor passive.
    ///
    /// # Errors
    ///
    /// - `EndpointError::Config` if `config` is invalid
    pub fn new(seed: u64, config: UartConfig) -> Result<Self, EndpointError> {
        let sim = Simulation::with_seed(seed);
        let mut dut = sim.dut();
        let wire = dut.add_pin(LINE_PIN);
        let ids = IdAllocator::new();

        let tx = Endpoint::bind_with(
            &ids,
            config.clone().with_role(Role::Active),
            sim.env(),
            &dut,
            &PinNames::new().drive(LINE_PIN),
        )?;
        let rx = Endpoint::bind_with(
            &ids,
            config.with_role(Role::Passive),
            sim.env(),
            &dut,
            &PinNames::new().observe(LINE_PIN),
        )?;

        Ok(Self { sim, wire, tx: Rc::new(tx), rx: Rc::new(rx) })
    }

    /// Underlying simulation.
    pub fn sim(&mut self) -> &mut Simulation {
        &mut self.sim
    }

    /// Transmitting endpoint.
    pub fn tx(&self) -> &SimEndpoint {
        &self.tx
    }

    /// Monitoring endpoint.
    pub fn rx(&self) -> &SimEndpoint {
        &self.rx
    }

    /// Shared wire.
    pub fn wire(&self) -> &SimLine {
        &self.wire
    }

    /// Everything driven on the wire so far.
    pub fn waveform(&self) -> Waveform {
        self.wire.waveform()
    }

    /// Send `frames` in order and decode them on the monitor.
    ///
    /// # Errors
    ///
    /// - `BenchError::Endpoint` if either endpoint fails
    /// - `BenchError::Sim` if the monitor stalls waiting for a frame
    pub fn run(&mut self, frames: &[Stimulus]) -> Result<LoopbackRun, BenchError> {
        let received = Rc::new(RefCell::new(Vec::with_capacity(frames.len())));

        let monitor = {
            let rx = Rc::clone(&self.rx);
            let received = Rc::clone(&received);
            let count = frames.len();
            self.sim.spawn(async move {
                for _ in 0..count {
                    let txn = rx.receive().await?;
                    received.borrow_mut().push(txn);
                }
                Ok::<(), EndpointError>(())
            })?
        };

        let tx = Rc::clone(&self.tx);
        let stimulus = frames.to_vec();
        let sent = self.sim.run_until(async move {
            let mut sent = Vec::with_capacity(stimulus.len());
            for frame in stimulus {
                let txn = if frame.good_parity {
                    tx.transmit(frame.data).await?
                } else {
                    tx.transmit_bad_parity(frame.data).await?
                };
                sent.push(txn);
            }
            Ok::<_, EndpointError>(sent)
        })??;

        self.sim.run_until(monitor)??;
        let received = received.take();

        let mut board = Scoreboard::new();
        for txn in &sent {
            board.expect(txn.clone());
        }
        for txn in &received {
            board.observe(txn.clone());
        }
        let report = board.report();
        info!(seed = self.sim.seed(), %report, "loopback run finished");

        Ok(LoopbackRun { sent, received, report })
    }
}
