//! Benchmark artifact writer
//!
//! Artifact layout (UTF-8):
//!
//! ```text
//! # FramePulse Benchmark
//! # Date: 2026-01-31 18:04:11
//! # <Key>: <Value>              run settings, one per line
//! elapsed_ms,frame_ms,...       13-column header
//! 0,16.667,60.0,...             one row per recorded frame
//! # SUMMARY                     trailer, written on stop
//! # <Key>: <Value>
//! ```
//!
//! Field formatting is part of the format: existing logs and the scripts
//! reading them depend on it.

use std::io::{self, Write};

use chrono::{DateTime, Local};
use serde::Serialize;

use super::summary::BenchmarkSummary;
use crate::cache::MetricCache;
use crate::config::{LowMethod, PauseHandling, TelemetryConfig};
use crate::format::{fixed1, fixed3};
use crate::stats::{NS_PER_MS, ns_to_fps, ns_to_ms};

/// Version of this engine, written into every artifact.
pub const ENGINE_VERSION: &str = env!("CARGO_PKG_VERSION");

/// First line of every artifact.
pub const TITLE: &str = "# FramePulse Benchmark";

/// Column names, in order.
pub const COLUMNS: [&str; 13] = [
    "elapsed_ms",
    "frame_ms",
    "inst_fps",
    "fps_smoothed",
    "avg_fps",
    "low1_fps",
    "low01_fps",
    "stutters",
    "stutter_percent",
    "max_spike_ms",
    "gc_pause_ms",
    "mem_used_mb",
    "mem_max_mb",
];

/// Marker line opening the trailer.
pub const SUMMARY_MARKER: &str = "# SUMMARY";

const DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Settings in effect when a run started.
///
/// Captured once, so that editing the configuration mid-run changes neither
/// the header nor how the run is summarized.
#[derive(Debug, Clone, PartialEq)]
pub struct RunSettings {
    pub started_at: DateTime<Local>,
    pub host_version: String,
    /// Auto-stop duration; 0 = manual stop
    pub duration_sec: u32,
    pub pause_handling: PauseHandling,
    pub low_method: LowMethod,
    pub stutter_threshold_ms: u32,
    pub avg_window_sec: u32,
    pub low1_window_sec: u32,
    pub low01_window_sec: u32,
    pub stutter_window_sec: u32,
    pub fps_window_ms: u32,
}

impl RunSettings {
    pub fn from_config(config: &TelemetryConfig, started_at: DateTime<Local>, host_version: String) -> Self {
        Self {
            started_at,
            host_version,
            duration_sec: config.benchmark.auto_duration_sec,
            pause_handling: config.pause_handling,
            low_method: config.low_method,
            stutter_threshold_ms: config.stutter.threshold_ms,
            avg_window_sec: config.windows.avg_window_sec,
            low1_window_sec: config.windows.low1_window_sec,
            low01_window_sec: config.windows.low01_window_sec,
            stutter_window_sec: config.windows.stutter_window_sec,
            fps_window_ms: config.windows.fps_window_ms,
        }
    }
}

/// Writes the metadata block and the column header.
pub fn write_header<W: Write + ?Sized>(w: &mut W, settings: &RunSettings) -> io::Result<()> {
    writeln!(w, "{TITLE}")?;
    writeln!(w, "# Date: {}", settings.started_at.format(DATE_FORMAT))?;
    writeln!(w, "# EngineVersion: {ENGINE_VERSION}")?;
    writeln!(w, "# HostVersion: {}", settings.host_version)?;
    writeln!(w, "# DurationSec: {}", settings.duration_sec)?;
    writeln!(w, "# PauseHandling: {}", settings.pause_handling.as_str())?;
    writeln!(w, "# LowMethod: {}", settings.low_method.as_str())?;
    writeln!(w, "# StutterThresholdMs: {}", settings.stutter_threshold_ms)?;
    writeln!(w, "# AvgWindowSec: {}", settings.avg_window_sec)?;
    writeln!(w, "# Low1WindowSec: {}", settings.low1_window_sec)?;
    writeln!(w, "# Low01WindowSec: {}", settings.low01_window_sec)?;
    writeln!(w, "# StutterWindowSec: {}", settings.stutter_window_sec)?;
    writeln!(w, "# FpsWindowMs: {}", settings.fps_window_ms)?;
    writeln!(w, "{}", COLUMNS.join(","))
}

/// Writes the trailer.
pub fn write_summary<W: Write + ?Sized>(w: &mut W, summary: &BenchmarkSummary) -> io::Result<()> {
    writeln!(w, "{SUMMARY_MARKER}")?;
    writeln!(w, "# FramesLogged: {}", summary.frames_logged)?;
    writeln!(w, "# FramesSummary: {}", summary.frames_retained)?;
    writeln!(w, "# AvgFPS: {}", fixed1(summary.avg_fps))?;
    writeln!(w, "# Low1FPS: {}", fixed1(summary.low1_fps))?;
    writeln!(w, "# Low01FPS: {}", fixed1(summary.low01_fps))?;
    writeln!(w, "# Stutters: {}", summary.stutter_count)?;
    writeln!(w, "# StutterPercent: {}", summary.stutter_percent)?;
    writeln!(w, "# MaxSpikeMs: {}", fixed1(summary.max_spike_ms))
}

/// One data row.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct FrameRow {
    pub elapsed_ms: u64,
    pub frame_ms: f64,
    pub inst_fps: f64,
    pub fps_smoothed: f64,
    pub avg_fps: f64,
    pub low1_fps: f64,
    pub low01_fps: f64,
    pub stutters: u64,
    pub stutter_percent: u32,
    pub max_spike_ms: f64,
    pub gc_pause_ms: f64,
    pub mem_used_mb: u64,
    pub mem_max_mb: u64,
}

impl FrameRow {
    /// Row for a frame of `frame_ns` ending `elapsed_ns` into the run, with the
    /// currently cached live metrics.
    pub fn new(elapsed_ns: u64, frame_ns: u64, metrics: &MetricCache) -> Self {
        Self {
            elapsed_ms: elapsed_ns / NS_PER_MS,
            frame_ms: ns_to_ms(frame_ns),
            inst_fps: ns_to_fps(frame_ns),
            fps_smoothed: metrics.fps,
            avg_fps: metrics.avg_fps,
            low1_fps: metrics.low1_fps,
            low01_fps: metrics.low01_fps,
            stutters: metrics.stutters as u64,
            stutter_percent: metrics.stutter_percent,
            max_spike_ms: metrics.max_spike_ms,
            gc_pause_ms: metrics.gc_pause_ms.unwrap_or(0) as f64,
            mem_used_mb: metrics.memory.used_mb,
            mem_max_mb: metrics.memory.max_mb,
        }
    }

    /// The row as written to the artifact, without the line terminator.
    pub fn to_csv_line(&self) -> String {
        format!(
            "{},{},{},{},{},{},{},{},{},{},{},{},{}",
            self.elapsed_ms,
            fixed3(self.frame_ms),
            fixed1(self.inst_fps),
            fixed1(self.fps_smoothed),
            fixed1(self.avg_fps),
            fixed1(self.low1_fps),
            fixed1(self.low01_fps),
            self.stutters,
            self.stutter_percent,
            fixed3(self.max_spike_ms),
            fixed1(self.gc_pause_ms),
            self.mem_used_mb,
            self.mem_max_mb,
        )
    }
}
