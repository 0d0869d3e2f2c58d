//! Summarize command - recompute a run's summary from its artifact
//!
//! The recomputed summary is exact; the stored trailer only carries one
//! decimal and is missing for runs that never stopped cleanly.

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Args;
use framepulse_core::format::fixed1;
use framepulse_core::{BenchmarkLog, BenchmarkSummary, LowMethod, read_artifact, summarize_frames};
use serde::Serialize;

use crate::MethodArg;

/// Threshold used when neither the command line nor the artifact names one.
const DEFAULT_THRESHOLD_MS: u32 = 40;

/// Arguments for the summarize command
#[derive(Args)]
pub struct SummarizeArgs {
    /// Benchmark artifact (.csv)
    pub file: PathBuf,

    /// Low-metric method (defaults to the one recorded in the artifact)
    #[arg(short, long, value_enum)]
    pub method: Option<MethodArg>,

    /// Stutter threshold in ms (defaults to the one recorded in the artifact)
    #[arg(short, long)]
    pub threshold_ms: Option<u32>,

    /// Print the summary as JSON
    #[arg(long)]
    pub json: bool,
}

/// Recomputed summary plus what the artifact itself recorded.
#[derive(Debug, Serialize)]
struct Report {
    file: PathBuf,
    low_method: LowMethod,
    threshold_ms: u32,
    summary: BenchmarkSummary,
    stored: Option<BenchmarkSummary>,
}

/// Execute the summarize command
pub fn execute(args: SummarizeArgs) -> Result<()> {
    let file = File::open(&args.file)
        .with_context(|| format!("Failed to open {}", args.file.display()))?;
    let log = read_artifact(BufReader::new(file))
        .with_context(|| format!("Failed to read {}", args.file.display()))?;

    let report = build_report(&args.file, &log, args.method, args.threshold_ms);
    tracing::debug!(rows = log.rows.len(), "Artifact parsed");

    if args.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&report).context("Failed to serialize summary")?
        );
    } else {
        print!("{}", render(&report));
    }
    Ok(())
}

fn build_report(
    file: &Path,
    log: &BenchmarkLog,
    method: Option<MethodArg>,
    threshold_ms: Option<u32>,
) -> Report {
    let low_method = method
        .map(LowMethod::from)
        .or_else(|| log.get("LowMethod").and_then(method_from_header))
        .unwrap_or_default();
    let threshold_ms = threshold_ms
        .or_else(|| log.get("StutterThresholdMs").and_then(|v| v.parse().ok()))
        .unwrap_or(DEFAULT_THRESHOLD_MS);

    Report {
        file: file.to_path_buf(),
        low_method,
        threshold_ms,
        summary: summarize_frames(&log.frame_durations_ns(), low_method, threshold_ms),
        stored: log.stored_summary(),
    }
}

fn method_from_header(name: &str) -> Option<LowMethod> {
    [LowMethod::Percentile, LowMethod::MeanWorst]
        .into_iter()
        .find(|m| m.as_str() == name)
}

fn render(report: &Report) -> String {
    let s = &report.summary;
    let mut out = format!(
        "{}\n  Method:     {} (stutters >= {} ms)\n  Frames:     {}\n  Avg FPS:    {}\n  1% low:     {}\n  0.1% low:   {}\n  Stutters:   {} ({}%)\n  Max spike:  {} ms\n",
        report.file.display(),
        report.low_method.as_str(),
        report.threshold_ms,
        s.frames_logged,
        fixed1(s.avg_fps),
        fixed1(s.low1_fps),
        fixed1(s.low01_fps),
        s.stutter_count,
        s.stutter_percent,
        fixed1(s.max_spike_ms),
    );

    match &report.stored {
        Some(stored) => {
            out.push_str(&format!(
                "  Recorded:   avg {} / 1% {} / 0.1% {} over {} of {} frames\n",
                fixed1(stored.avg_fps),
                fixed1(stored.low1_fps),
                fixed1(stored.low01_fps),
                stored.frames_retained,
                stored.frames_logged,
            ));
            if stored.is_truncated() {
                out.push_str("  Note: the recorder's lows covered only the retained frames\n");
            }
        }
        None => out.push_str("  Recorded:   no summary (run did not stop cleanly)\n"),
    }
    out
}
