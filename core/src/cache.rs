//! Refresh throttling and cached metric values
//!
//! Each displayed metric is recomputed only when its own interval has
//! elapsed since the last refresh. The values shown between refreshes come
//! from [`MetricCache`].

use std::time::{Duration, Instant};

use crate::host::MemoryUsage;

/// Interval gate for a single metric.
///
/// A gate that has never fired is always due.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RefreshGate {
    last: Option<Instant>,
}

impl RefreshGate {
    /// True if `interval` has elapsed since the last [`mark`](Self::mark).
    pub fn is_due(&self, now: Instant, interval: Duration) -> bool {
        match self.last {
            None => true,
            Some(last) => now.saturating_duration_since(last) >= interval,
        }
    }

    pub fn mark(&mut self, now: Instant) {
        self.last = Some(now);
    }

    /// Fires (and marks) if due.
    pub fn fire(&mut self, now: Instant, interval: Duration) -> bool {
        let due = self.is_due(now, interval);
        if due {
            self.mark(now);
        }
        due
    }

    pub fn last(&self) -> Option<Instant> {
        self.last
    }
}

/// Host sampling cadence for GC pauses.
pub const GC_SAMPLE_INTERVAL: Duration = Duration::from_millis(1000);
/// Host sampling cadence for memory usage.
pub const MEMORY_SAMPLE_INTERVAL: Duration = Duration::from_millis(250);

/// One gate per refreshed metric group.
#[derive(Debug, Clone, Default)]
pub struct RefreshGates {
    pub fps: RefreshGate,
    pub frame_time: RefreshGate,
    pub avg: RefreshGate,
    pub low1: RefreshGate,
    pub low01: RefreshGate,
    /// Stutter count, stutter percent and max spike refresh together
    pub stutters: RefreshGate,
    pub gc: RefreshGate,
    pub memory: RefreshGate,
}

/// Last computed value of every displayed metric.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct MetricCache {
    pub fps: f64,
    pub frame_time_ms: f64,
    pub avg_fps: f64,
    pub low1_fps: f64,
    pub low01_fps: f64,
    pub stutters: usize,
    /// Whole percent of in-window frames that stuttered
    pub stutter_percent: u32,
    pub max_spike_ms: f64,
    /// Most recent GC pause; `None` when the host reported none
    pub gc_pause_ms: Option<u64>,
    pub memory: MemoryUsage,
}

/// `round(stutters * 100 / frames)`, 0 for an empty window.
pub fn stutter_percent(stutters: usize, frames: usize) -> u32 {
    if frames == 0 {
        return 0;
    }
    (stutters as f64 * 100.0 / frames as f64).round() as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gate_first_call_always_fires() {
        let gate = RefreshGate::default();
        assert!(gate.is_due(Instant::now(), Duration::from_secs(3600)));
    }

    #[test]
    fn test_gate_interval() {
        let base = Instant::now();
        let interval = Duration::from_millis(250);
        let mut gate = RefreshGate::default();

        assert!(gate.fire(base, interval));
        assert!(!gate.fire(base + Duration::from_millis(249), interval));
        // Exactly one interval later counts as due
        assert!(gate.fire(base + interval, interval));
        assert_eq!(gate.last(), Some(base + interval));
    }

    #[test]
    fn test_gate_tolerates_clock_going_backwards() {
        let base = Instant::now() + Duration::from_secs(10);
        let mut gate = RefreshGate::default();
        gate.mark(base);
        assert!(!gate.is_due(base - Duration::from_secs(1), Duration::from_millis(50)));
    }

    #[test]
    fn test_stutter_percent() {
        assert_eq!(stutter_percent(0, 0), 0);
        assert_eq!(stutter_percent(10, 1010), 1);
        assert_eq!(stutter_percent(1, 8), 13);
        assert_eq!(stutter_percent(5, 5), 100);
    }
}
