//! End-of-run statistics
//!
//! Unlike the live metrics, the summary looks at every retained frame of the
//! run rather than a trailing window.

use serde::Serialize;

use crate::cache::stutter_percent;
use crate::config::LowMethod;
use crate::stats::select::low_frame_ns;
use crate::stats::{NS_PER_MS, NS_PER_SEC, ns_to_fps, ns_to_ms};

/// Full-run benchmark result.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct BenchmarkSummary {
    pub avg_fps: f64,
    pub low1_fps: f64,
    pub low01_fps: f64,
    pub stutter_count: u64,
    pub stutter_percent: u32,
    pub max_spike_ms: f64,
    /// Frames written to the artifact
    pub frames_logged: u64,
    /// Frames the lows and stutters were computed from
    pub frames_retained: u64,
}

impl BenchmarkSummary {
    /// True when some logged frames did not fit in memory and are missing
    /// from the lows and stutter figures.
    pub fn is_truncated(&self) -> bool {
        self.frames_retained < self.frames_logged
    }
}

/// Running totals over every logged frame, retained or not.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunTotals {
    pub frames_logged: u64,
    pub total_ns: u64,
    pub max_ns: u64,
}

impl RunTotals {
    pub fn add(&mut self, frame_ns: u64) {
        self.frames_logged += 1;
        self.total_ns = self.total_ns.saturating_add(frame_ns);
        self.max_ns = self.max_ns.max(frame_ns);
    }

    pub fn from_frames(frames: &[u64]) -> Self {
        let mut totals = Self::default();
        for &frame_ns in frames {
            totals.add(frame_ns);
        }
        totals
    }
}

/// Summary of a run whose per-frame durations are all in `frames`.
pub fn summarize_frames(frames: &[u64], method: LowMethod, threshold_ms: u32) -> BenchmarkSummary {
    let totals = RunTotals::from_frames(frames);
    summarize_run(frames, &mut Vec::new(), &totals, method, threshold_ms)
}

/// Summary of a run from its retained frames and running totals.
///
/// Average FPS and max spike come from the totals; lows and stutters can
/// only be computed from `retained`. `scratch` is reused for selection.
pub fn summarize_run(
    retained: &[u64],
    scratch: &mut Vec<u64>,
    totals: &RunTotals,
    method: LowMethod,
    threshold_ms: u32,
) -> BenchmarkSummary {
    let mut summary = BenchmarkSummary {
        frames_logged: totals.frames_logged,
        frames_retained: retained.len() as u64,
        ..BenchmarkSummary::default()
    };
    if retained.is_empty() || totals.total_ns == 0 {
        return summary;
    }

    summary.avg_fps = totals.frames_logged as f64 * NS_PER_SEC as f64 / totals.total_ns as f64;
    summary.max_spike_ms = ns_to_ms(totals.max_ns);

    let mut low = |worst_fraction: f64| {
        scratch.clear();
        scratch.extend_from_slice(retained);
        ns_to_fps(low_frame_ns(scratch, method, worst_fraction))
    };
    summary.low1_fps = low(0.01);
    summary.low01_fps = low(0.001);

    let threshold_ns = u64::from(threshold_ms.max(1)) * NS_PER_MS;
    let stutters = retained.iter().filter(|&&f| f >= threshold_ns).count();
    summary.stutter_count = stutters as u64;
    summary.stutter_percent = stutter_percent(stutters, retained.len());

    summary
}
