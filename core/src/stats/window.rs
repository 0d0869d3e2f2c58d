//! Trailing-window queries
//!
//! A sample belongs to the window `[now - window, now]`. Every query walks the
//! history newest to oldest and stops at the first sample stamped before the
//! window start, so cost follows the window size rather than the capacity.

use std::time::{Duration, Instant};

use super::select::low_frame_ns;
use super::{FrameHistory, NS_PER_MS, NS_PER_SEC, ns_to_fps, ns_to_ms};
use crate::config::LowMethod;

/// Sum and count of the frame durations inside a window.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WindowStats {
    pub sum_ns: u64,
    pub count: usize,
}

impl WindowStats {
    /// `count * 1e9 / sum`, or 0 with fewer than two samples.
    pub fn fps(&self) -> f64 {
        if self.count < 2 || self.sum_ns == 0 {
            return 0.0;
        }
        self.count as f64 * NS_PER_SEC as f64 / self.sum_ns as f64
    }
}

/// Smoothed instantaneous rate.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Smoothed {
    pub fps: f64,
    pub frame_time_ms: f64,
}

impl FrameHistory {
    /// Samples stamped at or after `now - window`, newest first.
    fn in_window(&self, now: Instant, window: Duration) -> impl Iterator<Item = (Instant, u64)> + '_ {
        let start = now.checked_sub(window);
        self.iter_newest_first()
            .take_while(move |&(at, _)| start.is_none_or(|start| at >= start))
    }

    /// Trailing sum of durations and sample count.
    pub fn window_stats(&self, now: Instant, window: Duration) -> WindowStats {
        self.in_window(now, window)
            .fold(WindowStats::default(), |acc, (_, frame_ns)| WindowStats {
                sum_ns: acc.sum_ns.saturating_add(frame_ns),
                count: acc.count + 1,
            })
    }

    /// Average FPS over the window; 0 when it holds fewer than two samples.
    pub fn average_fps(&self, now: Instant, window: Duration) -> f64 {
        self.window_stats(now, window).fps()
    }

    /// Average FPS and frame time over the window.
    ///
    /// With fewer than two samples in the window, the newest sample's own
    /// rate is reported instead.
    pub fn smoothed(&self, now: Instant, window: Duration) -> Smoothed {
        let stats = self.window_stats(now, window);
        if stats.count >= 2 && stats.sum_ns > 0 {
            return Smoothed {
                fps: stats.fps(),
                frame_time_ms: stats.sum_ns as f64 / stats.count as f64 / NS_PER_MS as f64,
            };
        }

        match self.newest() {
            Some((_, frame_ns)) => Smoothed {
                fps: ns_to_fps(frame_ns),
                frame_time_ms: ns_to_ms(frame_ns),
            },
            None => Smoothed::default(),
        }
    }

    /// FPS of the worst `worst_fraction` of frames in the window, 0 if empty.
    pub fn low_fps(
        &mut self,
        now: Instant,
        window: Duration,
        method: LowMethod,
        worst_fraction: f64,
    ) -> f64 {
        let mut scratch = std::mem::take(&mut self.scratch);
        scratch.clear();
        scratch.extend(self.in_window(now, window).map(|(_, frame_ns)| frame_ns));

        let low_ns = low_frame_ns(&mut scratch, method, worst_fraction);
        self.scratch = scratch;
        ns_to_fps(low_ns)
    }

    /// Number of frames in the window lasting at least `threshold_ns`.
    pub fn count_at_or_above(&self, now: Instant, window: Duration, threshold_ns: u64) -> usize {
        self.in_window(now, window)
            .filter(|&(_, frame_ns)| frame_ns >= threshold_ns)
            .count()
    }

    /// Longest frame in the window, 0 if empty.
    pub fn max_in_window(&self, now: Instant, window: Duration) -> u64 {
        self.in_window(now, window)
            .map(|(_, frame_ns)| frame_ns)
            .max()
            .unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FRAME_60: u64 = 16_670_000;
    const FRAME_10: u64 = 100_000_000;

    /// Push frames back to back starting at `base`, returning the last timestamp.
    fn feed(history: &mut FrameHistory, mut at: Instant, frames: &[u64]) -> Instant {
        for &frame_ns in frames {
            at += Duration::from_nanos(frame_ns);
            history.push(at, frame_ns);
        }
        at
    }

    #[test]
    fn test_constant_frame_time_is_exact() {
        for frame_ns in [1_000_000u64, 4_000_000, 16_000_000, 20_000_000, 40_000_000] {
            let mut h = FrameHistory::new(1024);
            let now = feed(&mut h, Instant::now(), &vec![frame_ns; 50]);
            let fps = h.average_fps(now, Duration::from_secs(60));
            assert_eq!(fps, NS_PER_SEC as f64 / frame_ns as f64, "frame_ns={frame_ns}");
        }
    }

    #[test]
    fn test_average_needs_two_samples() {
        let mut h = FrameHistory::new(16);
        let base = Instant::now();
        assert_eq!(h.average_fps(base, Duration::from_secs(1)), 0.0);

        let now = feed(&mut h, base, &[FRAME_60]);
        assert_eq!(h.average_fps(now, Duration::from_secs(1)), 0.0);
    }

    #[test]
    fn test_window_excludes_older_samples() {
        let mut h = FrameHistory::new(64);
        let base = Instant::now();
        // 10 frames of 100 ms: stamped at 100, 200, ..., 1000 ms
        let now = feed(&mut h, base, &[FRAME_10; 10]);

        let stats = h.window_stats(now, Duration::from_millis(300));
        // 700, 800, 900, 1000 ms; the 700 ms frame sits exactly on the boundary
        assert_eq!(stats.count, 4);
        assert_eq!(stats.sum_ns, 4 * FRAME_10);
    }

    #[test]
    fn test_smoothed_falls_back_to_newest() {
        let mut h = FrameHistory::new(16);
        let base = Instant::now();
        let now = feed(&mut h, base, &[FRAME_60, FRAME_10]);

        // Only the newest frame is inside a 50 ms window
        let s = h.smoothed(now, Duration::from_millis(50));
        assert_eq!(s.fps, 10.0);
        assert_eq!(s.frame_time_ms, 100.0);

        let s = h.smoothed(now, Duration::from_secs(1));
        let expected_ms = (FRAME_60 + FRAME_10) as f64 / 2.0 / NS_PER_MS as f64;
        assert!((s.frame_time_ms - expected_ms).abs() < 1e-9);
    }

    #[test]
    fn test_smoothed_empty_is_zero() {
        let h = FrameHistory::new(4);
        assert_eq!(h.smoothed(Instant::now(), Duration::from_secs(1)), Smoothed::default());
    }

    #[test]
    fn test_low_percentile_distinct() {
        let mut h = FrameHistory::new(256);
        // 1 ms .. 100 ms in shuffled-ish order
        let frames: Vec<u64> = (0..100u64).map(|i| ((i * 37) % 100 + 1) * NS_PER_MS).collect();
        let now = feed(&mut h, Instant::now(), &frames);

        let low = h.low_fps(now, Duration::from_secs(60), LowMethod::Percentile, 0.01);
        // 99th smallest duration is 99 ms
        assert_eq!(low, NS_PER_SEC as f64 / (99 * NS_PER_MS) as f64);
    }

    #[test]
    fn test_low_mean_worst_ties_independent_of_order() {
        let frames_a = [10, 30, 30, 30, 50].map(|ms| ms * NS_PER_MS);
        let frames_b = [30, 50, 30, 10, 30].map(|ms| ms * NS_PER_MS);

        let mut results = Vec::new();
        for frames in [frames_a, frames_b] {
            let mut h = FrameHistory::new(16);
            let now = feed(&mut h, Instant::now(), &frames);
            // k = ceil(5 * 0.5) = 3
            results.push(h.low_fps(now, Duration::from_secs(60), LowMethod::MeanWorst, 0.5));
        }

        let expected = NS_PER_SEC as f64 / ((50 + 30 + 30) * NS_PER_MS / 3) as f64;
        assert_eq!(results, vec![expected, expected]);
    }

    #[test]
    fn test_low_empty_window_is_zero() {
        let mut h = FrameHistory::new(16);
        assert_eq!(
            h.low_fps(Instant::now(), Duration::from_secs(1), LowMethod::Percentile, 0.01),
            0.0
        );
    }

    #[test]
    fn test_low_leaves_history_untouched() {
        let mut h = FrameHistory::new(16);
        let frames = [5, 1, 4, 2, 3].map(|ms| ms * NS_PER_MS);
        let now = feed(&mut h, Instant::now(), &frames);

        h.low_fps(now, Duration::from_secs(60), LowMethod::Percentile, 0.5);
        let kept: Vec<u64> = h.iter_newest_first().map(|s| s.1).collect();
        assert_eq!(kept, frames.iter().rev().copied().collect::<Vec<_>>());
    }

    #[test]
    fn test_stutter_scenario() {
        let mut h = FrameHistory::new(4096);
        let base = Instant::now();
        let mut frames = vec![FRAME_60; 1000];
        frames.extend([FRAME_10; 10]);
        let now = feed(&mut h, base, &frames);

        let one_sec = Duration::from_secs(1);
        let threshold_ns = 40 * NS_PER_MS;
        assert_eq!(h.count_at_or_above(now, one_sec, threshold_ns), 10);
        assert_eq!(ns_to_ms(h.max_in_window(now, one_sec)), 100.0);

        // A window covering all 1010 frames averages the mix, not the slow tail
        let avg = h.average_fps(now, Duration::from_secs(30));
        let total_ns = 1000 * FRAME_60 + 10 * FRAME_10;
        let expected = 1010.0 * NS_PER_SEC as f64 / total_ns as f64;
        assert!((avg - expected).abs() < 1e-9);
        assert!(avg > 10.0 && avg < 60.0);
    }

    #[test]
    fn test_threshold_is_inclusive() {
        let mut h = FrameHistory::new(16);
        let frames = [39, 40, 41].map(|ms| ms * NS_PER_MS);
        let now = feed(&mut h, Instant::now(), &frames);
        assert_eq!(h.count_at_or_above(now, Duration::from_secs(1), 40 * NS_PER_MS), 2);
    }
}
