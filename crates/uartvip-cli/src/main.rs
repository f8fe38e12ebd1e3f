//! uartvip command-line runner.
//!
//! # Usage
//!
//! ```bash
//! # 16 random frames at 9600 baud, 8 data bits, odd parity
//! uartvip loopback --frames 16 --seed 7
//!
//! # 7E1 at 115200 baud, every 4th frame with inverted parity, JSON report
//! uartvip loopback --baud 115200 --data-bits 7 --parity even --bad-parity-every 4 --json
//! ```
//!
//! Logs go to stderr; the report goes to stdout. The exit status is non-zero
//! when the monitor did not decode exactly what was sent.

use std::process::ExitCode;

use clap::{Parser, Subcommand, ValueEnum};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::Serialize;
use thiserror::Error;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};
use uartvip_core::{EndpointError, Parity, UartConfig};
use uartvip_harness::{BenchError, LoopbackBench, LoopbackRun, Stimulus};

/// UART verification endpoint runner
#[derive(Parser, Debug)]
#[command(name = "uartvip")]
#[command(about = "Drive and monitor UART frames in a deterministic simulation")]
#[command(version)]
struct Cli {
    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info", global = true)]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Send frames from an active endpoint to a passive monitor on one wire
    Loopback(LoopbackArgs),
}

#[derive(clap::Args, Debug, Clone)]
struct LoopbackArgs {
    /// Line speed in bits per second
    #[arg(long, default_value_t = 9600)]
    baud: u32,

    /// Data bits per frame (5..=8)
    #[arg(long, default_value_t = 8)]
    data_bits: u8,

    /// Parity mode
    #[arg(long, value_enum, default_value_t = ParityArg::Odd)]
    parity: ParityArg,

    /// Number of frames to send
    #[arg(long, default_value_t = 8)]
    frames: usize,

    /// Seed for payloads, idle delays and sampling jitter
    #[arg(long, default_value_t = 0)]
    seed: u64,

    /// Invert the parity bit of every K-th frame
    #[arg(long, value_name = "K")]
    bad_parity_every: Option<usize>,

    /// Print the report as JSON
    #[arg(long)]
    json: bool,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
enum ParityArg {
    Odd,
    Even,
    None,
}

impl From<ParityArg> for Option<Parity> {
    fn from(arg: ParityArg) -> Self {
        match arg {
            ParityArg::Odd => Some(Parity::Odd),
            ParityArg::Even => Some(Parity::Even),
            ParityArg::None => None,
        }
    }
}

#[derive(Error, Debug)]
enum CliError {
    #[error(transparent)]
    Endpoint(#[from] EndpointError),

    #[error(transparent)]
    Bench(#[from] BenchError),

    #[error("failed to encode report: {0}")]
    Json(#[from] serde_json::Error),
}

/// JSON report of a loopback run.
#[derive(Serialize)]
struct Report<'a> {
    seed: u64,
    config: &'a UartConfig,
    #[serde(flatten)]
    run: &'a LoopbackRun,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level));

    tracing_subscriber::registry().with(fmt::layer().with_writer(std::io::stderr)).with(filter).init();

    let result = match cli.command {
        Command::Loopback(args) => loopback(&args),
    };

    match result {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(err) => {
            tracing::error!(error = %err, "run failed");
            ExitCode::from(2)
        },
    }
}

/// Run the loopback bench; `Ok(false)` means the scoreboard failed.
fn loopback(args: &LoopbackArgs) -> Result<bool, CliError> {
    let config = UartConfig::default()
        .with_baud_rate(args.baud)
        .with_data_bits(args.data_bits)
        .with_parity(args.parity.into());

    tracing::info!(
        seed = args.seed,
        baud_rate = config.baud_rate,
        data_bits = config.data_bits,
        parity = ?config.parity,
        frames = args.frames,
        "starting loopback"
    );

    let frames = stimulus(args.seed, args.frames, args.bad_parity_every);
    let mut bench = LoopbackBench::new(args.seed, config.clone())?;
    let run = bench.run(&frames)?;

    for (sent, received) in run.sent.iter().zip(&run.received) {
        tracing::info!(%sent, %received, status = ?received.status(), "frame");
    }

    print_report(args, &config, &run)?;
    Ok(run.report.passed())
}

/// Payloads drawn from their own stream so they do not shift the bench's
/// jitter when the frame count changes.
fn stimulus(seed: u64, count: usize, bad_parity_every: Option<usize>) -> Vec<Stimulus> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed ^ 0x5541_5254);
    (1..=count)
        .map(|n| {
            let data: u8 = rng.r#gen();
            let bad = bad_parity_every.is_some_and(|k| k > 0 && n % k == 0);
            if bad { Stimulus::bad_parity(data) } else { Stimulus::good(data) }
        })
        .collect()
}

#[allow(clippy::print_stdout, reason = "The report is the program's output")]
fn print_report(args: &LoopbackArgs, config: &UartConfig, run: &LoopbackRun) -> Result<(), CliError> {
    if args.json {
        let report = Report { seed: args.seed, config, run };
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    for (index, received) in run.received.iter().enumerate() {
        println!("{index:>4}  {received}  {:?}", received.status());
    }
    println!("{}", run.report);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loopback_defaults_match_endpoint_defaults() {
        let cli = Cli::try_parse_from(["uartvip", "loopback"]).unwrap();
        let Command::Loopback(args) = cli.command;

        let defaults = UartConfig::default();
        assert_eq!(args.baud, defaults.baud_rate);
        assert_eq!(args.data_bits, defaults.data_bits);
        assert_eq!(Option::<Parity>::from(args.parity), defaults.parity);
        assert!(!args.json);
    }

    #[test]
    fn parity_none_is_accepted() {
        let cli = Cli::try_parse_from(["uartvip", "loopback", "--parity", "none", "--json"]).unwrap();
        let Command::Loopback(args) = cli.command;
        assert_eq!(args.parity, ParityArg::None);
        assert!(args.json);
    }

    #[test]
    fn every_kth_frame_gets_bad_parity() {
        let frames = stimulus(1, 6, Some(3));
        let bad: Vec<bool> = frames.iter().map(|f| !f.good_parity).collect();
        assert_eq!(bad, vec![false, false, true, false, false, true]);

        assert!(stimulus(1, 6, Some(0)).iter().all(|f| f.good_parity));
        assert_eq!(stimulus(9, 5, None), stimulus(9, 5, None));
    }

    #[test]
    fn payloads_come_from_a_seeded_stream() {
        let mut rng = ChaCha8Rng::seed_from_u64(5 ^ 0x5541_5254);
        let expected: Vec<u8> = (0..4).map(|_| rng.r#gen()).collect();

        let long: Vec<u8> = stimulus(5, 4, None).iter().map(|f| f.data).collect();
        let short: Vec<u8> = stimulus(5, 2, None).iter().map(|f| f.data).collect();
        assert_eq!(long, expected);
        assert_eq!(short, long[..2]);
    }

    #[test]
    fn loopback_run_passes() {
        let args = LoopbackArgs {
            baud: 115_200,
            data_bits: 8,
            parity: ParityArg::Even,
            frames: 4,
            seed: 3,
            bad_parity_every: Some(2),
            json: false,
        };
        let config = UartConfig::default().with_baud_rate(args.baud).with_parity(args.parity.into());
        let mut bench = LoopbackBench::new(args.seed, config).unwrap();
        let run = bench.run(&stimulus(args.seed, args.frames, args.bad_parity_every)).unwrap();
        assert!(run.report.passed());
        assert_eq!(run.received.len(), 4);
    }
}
