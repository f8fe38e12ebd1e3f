//! Deterministic simulation harness for uartvip endpoints.
//!
//! Discrete-event implementations of the [`Environment`] and [`Line`]
//! capabilities for reproducible testing with nanosecond timing.
//!
//! # Scheduling
//!
//! [`Simulation`] owns a virtual clock and a single-threaded executor. Tasks
//! run until every one of them is blocked; only then does the clock jump to
//! the earliest pending timer. Nothing is preemptive, and the same seed
//! always replays the same interleaving, jitter and idle delays.
//!
//! # Components
//!
//! - [`Simulation`]: clock, timers and task executor
//! - [`SimEnv`]: seeded environment over the simulation clock
//! - [`SimLine`]: wire with falling-edge wakeups and a recorded [`Waveform`]
//! - [`SimDut`]: named pins of the design, resolvable by endpoints
//! - [`Scoreboard`]: in-order comparison of expected and observed frames
//! - [`LoopbackBench`]: a transmitter and a monitor sharing one wire
//!
//! [`Environment`]: uartvip_core::Environment
//! [`Line`]: uartvip_core::Line

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod bench;
mod clock;
pub mod dut;
pub mod scoreboard;
pub mod sim_env;
pub mod sim_line;
pub mod simulation;

pub use bench::{BenchError, LINE_PIN, LoopbackBench, LoopbackRun, SimEndpoint, Stimulus};
pub use dut::SimDut;
pub use scoreboard::{ScoreFailure, Scoreboard, ScoreboardReport};
pub use sim_env::SimEnv;
pub use sim_line::{FallingEdge, SimLine, Transition, Waveform};
pub use simulation::{SimError, Simulation};
