//! Simulate command - record a benchmark of a synthetic frame stream
//!
//! Frames are fed on a synthetic clock, so a 60 second run finishes
//! instantly and the artifact is identical from one invocation to the next
//! apart from its timestamp.

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use anyhow::{Context, Result, bail};
use clap::Args;
use framepulse_core::format::fixed1;
use framepulse_core::{
    BenchmarkStatus, BenchmarkSummary, DirectorySinks, FrameTracker, TelemetryConfig,
    default_benchmark_dir,
};

/// Arguments for the simulate command
#[derive(Args)]
pub struct SimulateArgs {
    /// Steady frame rate
    #[arg(long, default_value_t = 60.0)]
    pub fps: f64,

    /// Simulated run length in seconds
    #[arg(long, default_value_t = 10)]
    pub seconds: u32,

    /// Replace every Nth frame with a spike (0 = never)
    #[arg(long, default_value_t = 0)]
    pub spike_every: u64,

    /// Duration of a spike frame in ms
    #[arg(long, default_value_t = 100.0)]
    pub spike_ms: f64,

    /// Directory for the artifact (defaults to the platform data directory)
    #[arg(short, long)]
    pub out: Option<PathBuf>,

    /// Telemetry config document (TOML)
    #[arg(short, long)]
    pub config: Option<PathBuf>,
}

/// Steady frames with a periodic spike.
#[derive(Debug, Clone, Copy, PartialEq)]
struct FramePattern {
    frame_ns: u64,
    spike_every: u64,
    spike_ns: u64,
}

impl FramePattern {
    fn from_args(args: &SimulateArgs) -> Result<Self> {
        if !(args.fps.is_finite() && args.fps > 0.0) {
            bail!("--fps must be a positive number, got {}", args.fps);
        }
        if !(args.spike_ms.is_finite() && args.spike_ms > 0.0) {
            bail!("--spike-ms must be a positive number, got {}", args.spike_ms);
        }
        Ok(Self {
            frame_ns: ((1e9 / args.fps).round() as u64).max(1),
            spike_every: args.spike_every,
            spike_ns: ((args.spike_ms * 1e6).round() as u64).max(1),
        })
    }

    /// Duration of the frame with 1-based `index`.
    fn frame(&self, index: u64) -> u64 {
        if self.spike_every > 0 && index % self.spike_every == 0 {
            self.spike_ns
        } else {
            self.frame_ns
        }
    }
}

/// Outcome of a simulated run.
struct Simulation {
    frames: u64,
    snapshot: String,
    file: PathBuf,
    summary: BenchmarkSummary,
}

/// Execute the simulate command
pub fn execute(args: SimulateArgs) -> Result<()> {
    let pattern = FramePattern::from_args(&args)?;
    let config = match &args.config {
        Some(path) => load_config(path)?,
        None => TelemetryConfig::default(),
    };
    let out = match args.out.clone() {
        Some(dir) => dir,
        None => default_benchmark_dir().context("No platform data directory; pass --out")?,
    };

    println!(
        "Simulating {}s at {} FPS into {}...",
        args.seconds,
        fixed1(args.fps),
        out.display()
    );

    let sim = run(config, &out, pattern, args.seconds)?;

    println!("{}", sim.snapshot);
    println!();
    println!("Recorded {} frames to {}", sim.frames, sim.file.display());
    println!(
        "  Avg {} | 1% {} | 0.1% {} | Stutters {} ({}%) | Max spike {}ms",
        fixed1(sim.summary.avg_fps),
        fixed1(sim.summary.low1_fps),
        fixed1(sim.summary.low01_fps),
        sim.summary.stutter_count,
        sim.summary.stutter_percent,
        fixed1(sim.summary.max_spike_ms),
    );
    Ok(())
}

fn load_config(path: &Path) -> Result<TelemetryConfig> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config {}", path.display()))?;
    TelemetryConfig::from_toml_str(&text)
        .with_context(|| format!("Failed to parse config {}", path.display()))
}

/// Records one run of `seconds` of `pattern` into `out`.
///
/// The run ends at the configured auto-stop duration or after `seconds`,
/// whichever comes first.
fn run(mut config: TelemetryConfig, out: &Path, pattern: FramePattern, seconds: u32) -> Result<Simulation> {
    config.enabled = true;
    config.benchmark.auto_duration_sec = seconds;
    let mut tracker = FrameTracker::new(config).with_sinks(DirectorySinks::new(out));

    let start = Instant::now();
    tracker.on_frame(start, false);
    tracker
        .toggle_benchmark(start)
        .context("Failed to start benchmark")?;

    let end = start + Duration::from_secs(u64::from(seconds));
    let mut now = start;
    let mut frames = 0;
    let status = loop {
        if let Some(stopped) = tracker.poll_auto_stop(now) {
            break stopped.context("Failed to stop benchmark")?;
        }
        if now >= end {
            break tracker.toggle_benchmark(now).context("Failed to stop benchmark")?;
        }
        frames += 1;
        now += Duration::from_nanos(pattern.frame(frames));
        tracker.on_frame(now, false);
    };

    let BenchmarkStatus::Stopped { path, summary, .. } = status else {
        bail!("Benchmark did not stop");
    };
    Ok(Simulation {
        frames,
        snapshot: tracker.text(),
        file: path,
        summary,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(fps: f64, spike_every: u64) -> SimulateArgs {
        SimulateArgs {
            fps,
            seconds: 2,
            spike_every,
            spike_ms: 100.0,
            out: None,
            config: None,
        }
    }

    #[test]
    fn test_frame_pattern() {
        let pattern = FramePattern::from_args(&args(100.0, 4)).unwrap();
        assert_eq!(pattern.frame_ns, 10_000_000);
        assert_eq!(pattern.frame(1), 10_000_000);
        assert_eq!(pattern.frame(4), 100_000_000);
        assert_eq!(pattern.frame(8), 100_000_000);

        let steady = FramePattern::from_args(&args(100.0, 0)).unwrap();
        assert!((1..1000).all(|i| steady.frame(i) == 10_000_000));
    }

    #[test]
    fn test_rejects_bad_rates() {
        assert!(FramePattern::from_args(&args(0.0, 0)).is_err());
        assert!(FramePattern::from_args(&args(f64::NAN, 0)).is_err());

        let mut bad_spike = args(60.0, 10);
        bad_spike.spike_ms = -1.0;
        assert!(FramePattern::from_args(&bad_spike).is_err());
    }

    #[test]
    fn test_run_records_artifact() {
        let dir = tempfile::tempdir().unwrap();
        let pattern = FramePattern::from_args(&args(100.0, 50)).unwrap();

        let sim = run(TelemetryConfig::default(), dir.path(), pattern, 2).unwrap();
        assert!(sim.file.starts_with(std::path::absolute(dir.path()).unwrap()));
        assert!(sim.file.exists());
        assert_eq!(sim.summary.frames_logged, sim.frames);
        assert!(sim.summary.stutter_count > 0);
        assert_eq!(sim.summary.max_spike_ms, 100.0);
        assert!(sim.snapshot.starts_with("FPS: "));
    }

    #[test]
    fn test_config_document() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("telemetry.toml");
        std::fs::write(&path, "low_method = \"MeanWorst\"\n[stutter]\nthreshold_ms = 20\n").unwrap();

        let config = load_config(&path).unwrap();
        assert_eq!(config.stutter.threshold_ms, 20);

        std::fs::write(&path, "low_method = 3\n").unwrap();
        let err = load_config(&path).unwrap_err();
        assert!(err.to_string().starts_with("Failed to parse config"));
    }
}
