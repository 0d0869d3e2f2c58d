//! FramePulse CLI - command-line host for the telemetry engine
//!
//! # Commands
//!
//! - `framepulse summarize` - Recompute the summary of a benchmark artifact
//! - `framepulse simulate` - Record a benchmark of a synthetic frame stream
//!
//! # Usage
//!
//! ```bash
//! # Summarize a recorded run with the method stored in its header
//! framepulse summarize benchmark_20260131_180411.csv
//!
//! # Same run, mean of the worst frames, as JSON
//! framepulse summarize benchmark_20260131_180411.csv --method mean-worst --json
//!
//! # 20 seconds at 144 FPS with a 120 ms hitch every 500 frames
//! framepulse simulate --fps 144 --seconds 20 --spike-every 500 --spike-ms 120 --out ./runs
//! ```
//!
//! Logging is controlled with `RUST_LOG` (default: `info`).

mod simulate;
mod summarize;

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use framepulse_core::LowMethod;

/// FramePulse CLI - frame-timing telemetry tools
#[derive(Parser)]
#[command(name = "framepulse")]
#[command(about = "Frame-timing telemetry and benchmark tools")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Recompute the full-run summary of a benchmark artifact
    Summarize(summarize::SummarizeArgs),

    /// Drive the engine with synthetic frames and record a benchmark
    Simulate(simulate::SimulateArgs),
}

/// Low-metric method as spelled on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum MethodArg {
    Percentile,
    MeanWorst,
}

impl From<MethodArg> for LowMethod {
    fn from(method: MethodArg) -> Self {
        match method {
            MethodArg::Percentile => LowMethod::Percentile,
            MethodArg::MeanWorst => LowMethod::MeanWorst,
        }
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Summarize(args) => summarize::execute(args),
        Commands::Simulate(args) => simulate::execute(args),
    }
}
