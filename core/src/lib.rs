//! FramePulse Core - frame-timing telemetry engine
//!
//! Turns a stream of per-frame timestamps into smoothed FPS, windowed
//! averages, 1% / 0.1% lows, stutter counts and spike magnitudes, each
//! refreshed on its own cadence, and records benchmark runs to CSV.
//!
//! # Architecture
//!
//! - [`FrameTracker`] - per-frame driver; the only type most hosts need
//! - [`FrameHistory`] - bounded ring of samples with trailing-window queries
//! - [`stats::select`] - quickselect behind every percentile and worst-K value
//! - [`RefreshGate`] / [`MetricCache`] - per-metric refresh throttling
//! - [`BenchmarkRecorder`] - benchmark session state machine and CSV artifacts
//! - [`HostProbe`] / [`SinkFactory`] - seams to the host runtime and filesystem
//!
//! The engine is single-threaded and never reads the clock itself: every
//! call takes the host's [`std::time::Instant`].

pub mod benchmark;
pub mod cache;
pub mod config;
pub mod format;
pub mod host;
pub mod snapshot;
pub mod stats;
#[cfg(test)]
pub mod test_utils;
pub mod tracker;

pub use tracker::FrameTracker;

// Re-export configuration types
pub use config::{
    BenchmarkConfig, ColorConfig, ColorTarget, ConfigError, DisplayConfig, LowMethod,
    PauseHandling, Preset, StutterConfig, TelemetryConfig, TextLayout, UpdateIntervals,
    WindowConfig,
};

// Re-export statistics types
pub use cache::{MetricCache, RefreshGate, RefreshGates};
pub use stats::{FrameHistory, Smoothed, WindowStats};

// Re-export benchmark types
pub use benchmark::artifact::{ArtifactError, BenchmarkLog, read_artifact};
pub use benchmark::csv::FrameRow;
pub use benchmark::{
    BenchmarkError, BenchmarkProgress, BenchmarkRecorder, BenchmarkStatus, BenchmarkSummary,
    DirectorySinks, RecorderState, SinkFactory, default_benchmark_dir, summarize_frames,
};

// Re-export host and display types
pub use host::{HostProbe, MemoryUsage, NullProbe};
pub use snapshot::{OverlayColor, Snapshot};
