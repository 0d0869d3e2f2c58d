//! Frame-time statistics
//!
//! - [`FrameHistory`] - bounded circular store of `(timestamp, duration)` samples
//! - window queries on [`FrameHistory`] - trailing sums, lows, stutters, spikes
//! - [`select`] - quickselect used by every percentile / worst-K computation

mod history;
pub mod select;
mod window;

pub use history::{
    FrameHistory, MAX_HISTORY_CAPACITY, MIN_HISTORY_CAPACITY, SAMPLES_PER_WINDOW_SECOND,
    history_capacity_for,
};
pub use window::{Smoothed, WindowStats};

/// Nanoseconds per second.
pub const NS_PER_SEC: u64 = 1_000_000_000;
/// Nanoseconds per millisecond.
pub const NS_PER_MS: u64 = 1_000_000;

/// Frames per second for a single frame duration; 0 for a zero duration.
pub fn ns_to_fps(frame_ns: u64) -> f64 {
    if frame_ns == 0 {
        return 0.0;
    }
    NS_PER_SEC as f64 / frame_ns as f64
}

/// Nanoseconds to fractional milliseconds.
pub fn ns_to_ms(ns: u64) -> f64 {
    ns as f64 / NS_PER_MS as f64
}

/// Duration in nanoseconds, saturating at `u64::MAX`.
pub(crate) fn duration_ns(d: std::time::Duration) -> u64 {
    u64::try_from(d.as_nanos()).unwrap_or(u64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_conversions() {
        assert_eq!(ns_to_fps(0), 0.0);
        assert_eq!(ns_to_fps(NS_PER_SEC / 100), 100.0);
        assert_eq!(ns_to_ms(2_500_000), 2.5);
        assert_eq!(ns_to_ms(0), 0.0);
    }
}
