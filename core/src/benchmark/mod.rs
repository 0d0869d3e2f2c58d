//! Benchmark recording
//!
//! A benchmark run streams one CSV row per frame into an artifact and keeps
//! every frame duration in memory, so the end-of-run summary covers the
//! whole run. See [`BenchmarkRecorder`] for the session lifecycle and
//! [`csv`] for the artifact layout.

pub mod artifact;
pub mod csv;
mod recorder;
mod retained;
mod sink;
mod summary;


use std::io;
use std::path::PathBuf;

pub use recorder::{BenchmarkRecorder, FLUSH_EVERY_ROWS, RecorderState};
pub use retained::{INITIAL_RETAINED_FRAMES, MAX_RETAINED_FRAMES, RetainedFrames};
pub use sink::{BenchmarkSink, DirectorySinks, SinkFactory, default_benchmark_dir};
pub use summary::{BenchmarkSummary, RunTotals, summarize_frames, summarize_run};

/// Errors surfaced by benchmark operations.
///
/// None of these affect live metrics; the frame loop keeps running.
#[derive(Debug, thiserror::Error)]
pub enum BenchmarkError {
    /// Opening, writing, flushing or closing the artifact failed
    #[error("Failed to {action} benchmark: {source}")]
    Io {
        action: &'static str,
        source: io::Error,
    },
    /// The previous run died on a write error
    #[error("Benchmark aborted: write failed")]
    AlreadyErrored,
    #[error("Benchmark already recording")]
    AlreadyRecording,
    #[error("No benchmark is recording")]
    NotRecording,
}

impl BenchmarkError {
    pub(crate) fn io(action: &'static str) -> impl FnOnce(io::Error) -> Self {
        move |source| Self::Io { action, source }
    }
}

/// Successful outcome of starting or stopping a run.
#[derive(Debug, Clone, PartialEq)]
pub enum BenchmarkStatus {
    Started {
        file_name: String,
        path: PathBuf,
    },
    Stopped {
        file_name: String,
        path: PathBuf,
        summary: BenchmarkSummary,
    },
}

impl BenchmarkStatus {
    pub fn file_name(&self) -> &str {
        match self {
            Self::Started { file_name, .. } | Self::Stopped { file_name, .. } => file_name,
        }
    }

    pub fn path(&self) -> &std::path::Path {
        match self {
            Self::Started { path, .. } | Self::Stopped { path, .. } => path,
        }
    }
}

/// How far an active run has progressed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BenchmarkProgress {
    pub elapsed_secs: f64,
    /// Configured run length; 0 = manual stop
    pub duration_secs: u32,
    /// 0-100; always 0 without a configured duration
    pub percent: f64,
}
