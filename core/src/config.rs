//! Telemetry configuration
//!
//! The engine never observes a half-edited configuration: hosts build a
//! [`TelemetryConfig`] value and hand it over whole through
//! [`FrameTracker::apply_config`](crate::FrameTracker::apply_config).
//! Every numeric knob has an engine-enforced range, see
//! [`TelemetryConfig::clamped`]. Out-of-range values are clamped, never
//! rejected.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Engine configuration snapshot.
///
/// Organized into sections, each of which may be omitted from a TOML
/// document and falls back to its defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TelemetryConfig {
    /// Master switch (default: true)
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Last applied preset (default: Default)
    #[serde(default)]
    pub preset: Preset,
    /// How 1% / 0.1% lows are derived (default: Percentile)
    #[serde(default)]
    pub low_method: LowMethod,
    /// What happens to sampling while the host is paused (default: Freeze)
    #[serde(default)]
    pub pause_handling: PauseHandling,
    /// Which metrics are shown, and how they are laid out
    #[serde(default)]
    pub display: DisplayConfig,
    /// Per-metric refresh intervals
    #[serde(default)]
    pub update: UpdateIntervals,
    /// Aggregation windows
    #[serde(default)]
    pub windows: WindowConfig,
    /// Stutter detection
    #[serde(default)]
    pub stutter: StutterConfig,
    /// Text color thresholds
    #[serde(default)]
    pub color: ColorConfig,
    /// Benchmark recording
    #[serde(default)]
    pub benchmark: BenchmarkConfig,
}

/// Method used for the 1% / 0.1% low metrics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum LowMethod {
    /// FPS of the frame at the (1 - fraction) percentile of frame time
    #[default]
    Percentile,
    /// FPS of the mean of exactly the K worst frames
    MeanWorst,
}

/// Pause policy applied once per frame, before sampling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum PauseHandling {
    /// Clear all history on the pause edge
    Reset,
    /// Suspend sampling and refresh entirely while paused
    #[default]
    Freeze,
    /// Keep sampling through pauses
    Track,
}

/// Metric that drives the text color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum ColorTarget {
    Fps,
    Low1,
    #[default]
    Low01,
}

/// Arrangement of metrics into snapshot lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum TextLayout {
    /// Everything on a single line
    #[default]
    OneLine,
    /// Rates, lows and stutters, then runtime stats
    ThreeLines,
    /// One metric per line
    Column,
}

/// Named bundles of refresh intervals and windows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum Preset {
    #[default]
    Default,
    Responsive,
    Smooth,
    /// Hand-tuned values; applying it changes nothing
    Custom,
}

/// Show flags and layout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DisplayConfig {
    #[serde(default = "default_true")]
    pub fps: bool,
    #[serde(default = "default_true")]
    pub avg: bool,
    #[serde(default = "default_true")]
    pub low1: bool,
    #[serde(default = "default_true")]
    pub low01: bool,
    #[serde(default = "default_true")]
    pub frametime: bool,
    #[serde(default = "default_true")]
    pub stutters: bool,
    #[serde(default = "default_true")]
    pub max_spike: bool,
    #[serde(default = "default_true")]
    pub gc: bool,
    #[serde(default = "default_true")]
    pub memory: bool,
    #[serde(default)]
    pub text_layout: TextLayout,
}

/// Refresh intervals in milliseconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdateIntervals {
    /// Smoothed FPS (default: 250, range: 50-5000)
    #[serde(default = "default_fast_update")]
    pub fps_ms: u32,
    /// Smoothed frame time (default: 250, range: 50-5000)
    #[serde(default = "default_fast_update")]
    pub frametime_ms: u32,
    /// Average FPS (default: 1000, range: 100-10000)
    #[serde(default = "default_slow_update")]
    pub avg_ms: u32,
    /// 1% low (default: 1000, range: 100-10000)
    #[serde(default = "default_slow_update")]
    pub low1_ms: u32,
    /// 0.1% low (default: 1500, range: 100-10000)
    #[serde(default = "default_low01_update")]
    pub low01_ms: u32,
    /// Stutters and max spike (default: 1000, range: 100-10000)
    #[serde(default = "default_slow_update")]
    pub stutters_ms: u32,
}

/// Aggregation windows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WindowConfig {
    /// Smoothing window for FPS / frame time (default: 500, range: 50-2000 ms)
    #[serde(default = "default_fps_window")]
    pub fps_window_ms: u32,
    /// Average FPS window (default: 10, range: 1-30 s)
    #[serde(default = "default_window_sec")]
    pub avg_window_sec: u32,
    /// 1% low window (default: 10, range: 1-60 s)
    #[serde(default = "default_window_sec")]
    pub low1_window_sec: u32,
    /// 0.1% low window (default: 10, range: 1-60 s)
    #[serde(default = "default_window_sec")]
    pub low01_window_sec: u32,
    /// Stutter / max spike window (default: 10, range: 1-60 s)
    #[serde(default = "default_window_sec")]
    pub stutter_window_sec: u32,
}

/// Stutter detection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StutterConfig {
    /// Frames at or above this duration count as stutters (default: 40, range: 5-500 ms)
    #[serde(default = "default_stutter_threshold")]
    pub threshold_ms: u32,
}

/// Color thresholds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColorConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default)]
    pub target: ColorTarget,
    /// Below this the text turns yellow (default: 50, range: 1-500)
    #[serde(default = "default_warning_fps")]
    pub warning_fps: u32,
    /// Below this the text turns red (default: 25, range: 1-500)
    #[serde(default = "default_danger_fps")]
    pub danger_fps: u32,
}

/// Benchmark recording.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BenchmarkConfig {
    /// Run length before auto-stop; 0 = manual stop only (default: 30, range: 0-3600 s)
    #[serde(default = "default_auto_duration")]
    pub auto_duration_sec: u32,
}

/// Error parsing a configuration document.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid telemetry config: {0}")]
    Parse(#[from] toml::de::Error),
}

fn default_true() -> bool {
    true
}
fn default_fast_update() -> u32 {
    250
}
fn default_slow_update() -> u32 {
    1000
}
fn default_low01_update() -> u32 {
    1500
}
fn default_fps_window() -> u32 {
    500
}
fn default_window_sec() -> u32 {
    10
}
fn default_stutter_threshold() -> u32 {
    40
}
fn default_warning_fps() -> u32 {
    50
}
fn default_danger_fps() -> u32 {
    25
}
fn default_auto_duration() -> u32 {
    30
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            enabled: default_true(),
            preset: Preset::default(),
            low_method: LowMethod::default(),
            pause_handling: PauseHandling::default(),
            display: DisplayConfig::default(),
            update: UpdateIntervals::default(),
            windows: WindowConfig::default(),
            stutter: StutterConfig::default(),
            color: ColorConfig::default(),
            benchmark: BenchmarkConfig::default(),
        }
    }
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            fps: true,
            avg: true,
            low1: true,
            low01: true,
            frametime: true,
            stutters: true,
            max_spike: true,
            gc: true,
            memory: true,
            text_layout: TextLayout::default(),
        }
    }
}

impl Default for UpdateIntervals {
    fn default() -> Self {
        Self {
            fps_ms: default_fast_update(),
            frametime_ms: default_fast_update(),
            avg_ms: default_slow_update(),
            low1_ms: default_slow_update(),
            low01_ms: default_low01_update(),
            stutters_ms: default_slow_update(),
        }
    }
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            fps_window_ms: default_fps_window(),
            avg_window_sec: default_window_sec(),
            low1_window_sec: default_window_sec(),
            low01_window_sec: default_window_sec(),
            stutter_window_sec: default_window_sec(),
        }
    }
}

impl Default for StutterConfig {
    fn default() -> Self {
        Self {
            threshold_ms: default_stutter_threshold(),
        }
    }
}

impl Default for ColorConfig {
    fn default() -> Self {
        Self {
            enabled: default_true(),
            target: ColorTarget::default(),
            warning_fps: default_warning_fps(),
            danger_fps: default_danger_fps(),
        }
    }
}

impl Default for BenchmarkConfig {
    fn default() -> Self {
        Self {
            auto_duration_sec: default_auto_duration(),
        }
    }
}

impl TelemetryConfig {
    /// Parses a TOML document. Missing sections and keys take their defaults.
    ///
    /// The result is not clamped; the engine clamps on apply.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(s)?)
    }

    /// Returns a copy with every numeric knob forced into its supported range.
    pub fn clamped(&self) -> Self {
        let mut c = self.clone();

        c.update.fps_ms = c.update.fps_ms.clamp(50, 5000);
        c.update.frametime_ms = c.update.frametime_ms.clamp(50, 5000);
        c.update.avg_ms = c.update.avg_ms.clamp(100, 10_000);
        c.update.low1_ms = c.update.low1_ms.clamp(100, 10_000);
        c.update.low01_ms = c.update.low01_ms.clamp(100, 10_000);
        c.update.stutters_ms = c.update.stutters_ms.clamp(100, 10_000);

        c.windows.fps_window_ms = c.windows.fps_window_ms.clamp(50, 2000);
        c.windows.avg_window_sec = c.windows.avg_window_sec.clamp(1, 30);
        c.windows.low1_window_sec = c.windows.low1_window_sec.clamp(1, 60);
        c.windows.low01_window_sec = c.windows.low01_window_sec.clamp(1, 60);
        c.windows.stutter_window_sec = c.windows.stutter_window_sec.clamp(1, 60);

        c.stutter.threshold_ms = c.stutter.threshold_ms.clamp(5, 500);

        c.color.warning_fps = c.color.warning_fps.clamp(1, 500);
        c.color.danger_fps = c.color.danger_fps.clamp(1, 500);

        c.benchmark.auto_duration_sec = c.benchmark.auto_duration_sec.min(3600);

        c
    }

    /// Overwrites refresh intervals, the rate and low windows, and pause
    /// handling with the values of `preset`, then records it as active.
    pub fn apply_preset(&mut self, preset: Preset) {
        let (update, fps_window_ms, avg_sec, low_sec) = match preset {
            Preset::Default => ([250, 250, 1000, 1000, 1500, 1000], 500, 3, 10),
            Preset::Responsive => ([100, 100, 500, 750, 1000, 500], 250, 2, 8),
            Preset::Smooth => ([500, 500, 2000, 2000, 2500, 2000], 1000, 5, 15),
            Preset::Custom => {
                self.preset = Preset::Custom;
                return;
            }
        };

        let [fps, frametime, avg, low1, low01, stutters] = update;
        self.update = UpdateIntervals {
            fps_ms: fps,
            frametime_ms: frametime,
            avg_ms: avg,
            low1_ms: low1,
            low01_ms: low01,
            stutters_ms: stutters,
        };
        self.windows.fps_window_ms = fps_window_ms;
        self.windows.avg_window_sec = avg_sec;
        self.windows.low1_window_sec = low_sec;
        self.windows.low01_window_sec = low_sec;
        self.pause_handling = PauseHandling::Freeze;
        self.preset = preset;
    }

    /// Largest trailing window any metric looks at, in whole seconds (at least 1).
    pub fn max_window_secs(&self) -> u64 {
        let w = &self.windows;
        let fps_secs = u64::from(w.fps_window_ms).div_ceil(1000);
        [
            1,
            u64::from(w.avg_window_sec),
            u64::from(w.low1_window_sec),
            u64::from(w.low01_window_sec),
            u64::from(w.stutter_window_sec),
            fps_secs,
        ]
        .into_iter()
        .max()
        .unwrap_or(1)
    }

    /// Smoothing window for instantaneous FPS and frame time.
    pub fn fps_window(&self) -> Duration {
        Duration::from_millis(u64::from(self.windows.fps_window_ms))
    }

    /// Stutter threshold in nanoseconds.
    pub fn stutter_threshold_ns(&self) -> u64 {
        u64::from(self.stutter.threshold_ms.max(1)) * 1_000_000
    }

    /// True when no metric is shown at all.
    pub fn shows_nothing(&self) -> bool {
        let d = &self.display;
        !(d.fps
            || d.avg
            || d.low1
            || d.low01
            || d.frametime
            || d.stutters
            || d.max_spike
            || d.gc
            || d.memory)
    }
}

/// Converts a whole-seconds window to a [`Duration`].
pub(crate) fn secs(window_sec: u32) -> Duration {
    Duration::from_secs(u64::from(window_sec))
}

/// Converts a millisecond interval to a [`Duration`].
pub(crate) fn millis(interval_ms: u32) -> Duration {
    Duration::from_millis(u64::from(interval_ms))
}

impl LowMethod {
    /// Name written into benchmark headers.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Percentile => "PERCENTILE",
            Self::MeanWorst => "MEAN_WORST",
        }
    }
}

impl PauseHandling {
    /// Name written into benchmark headers.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Reset => "RESET",
            Self::Freeze => "FREEZE",
            Self::Track => "TRACK",
        }
    }
}

impl TextLayout {
    /// Next layout in the cycle OneLine -> ThreeLines -> Column -> OneLine.
    pub fn next(self) -> Self {
        match self {
            Self::OneLine => Self::ThreeLines,
            Self::ThreeLines => Self::Column,
            Self::Column => Self::OneLine,
        }
    }

    /// Human-readable label.
    pub fn label(self) -> &'static str {
        match self {
            Self::OneLine => "One line",
            Self::ThreeLines => "Three lines",
            Self::Column => "Column",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // =============================================================
    // Default value tests
    // =============================================================

    #[test]
    fn test_config_default() {
        let config = TelemetryConfig::default();
        assert!(config.enabled);
        assert_eq!(config.low_method, LowMethod::Percentile);
        assert_eq!(config.pause_handling, PauseHandling::Freeze);
        assert_eq!(config.update.fps_ms, 250);
        assert_eq!(config.update.low01_ms, 1500);
        assert_eq!(config.windows.fps_window_ms, 500);
        assert_eq!(config.windows.avg_window_sec, 10);
        assert_eq!(config.stutter.threshold_ms, 40);
        assert_eq!(config.color.target, ColorTarget::Low01);
        assert_eq!(config.benchmark.auto_duration_sec, 30);
    }

    // =============================================================
    // TOML tests
    // =============================================================

    #[test]
    fn test_config_deserialize_empty() {
        let config = TelemetryConfig::from_toml_str("").unwrap();
        assert_eq!(config, TelemetryConfig::default());
    }

    #[test]
    fn test_config_deserialize_partial_sections() {
        let toml_str = r#"
low_method = "MeanWorst"

[windows]
avg_window_sec = 5

[display]
gc = false
text_layout = "Column"
"#;
        let config = TelemetryConfig::from_toml_str(toml_str).unwrap();
        assert_eq!(config.low_method, LowMethod::MeanWorst);
        assert_eq!(config.windows.avg_window_sec, 5);
        assert_eq!(config.windows.low1_window_sec, 10); // default
        assert!(!config.display.gc);
        assert!(config.display.memory); // default
        assert_eq!(config.display.text_layout, TextLayout::Column);
    }

    #[test]
    fn test_config_serialize_roundtrip() {
        let mut config = TelemetryConfig::default();
        config.pause_handling = PauseHandling::Track;
        config.stutter.threshold_ms = 70;

        let toml_str = toml::to_string(&config).unwrap();
        let parsed = TelemetryConfig::from_toml_str(&toml_str).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_config_rejects_bad_enum() {
        let err = TelemetryConfig::from_toml_str("pause_handling = \"Sometimes\"").unwrap_err();
        assert!(err.to_string().contains("invalid telemetry config"));
    }

    // =============================================================
    // Clamping tests
    // =============================================================

    #[test]
    fn test_clamped_forces_ranges() {
        let mut config = TelemetryConfig::default();
        config.update.fps_ms = 1;
        config.update.avg_ms = 99_999;
        config.windows.fps_window_ms = 10;
        config.windows.low01_window_sec = 0;
        config.windows.avg_window_sec = 300;
        config.stutter.threshold_ms = 0;
        config.color.danger_fps = 9000;
        config.benchmark.auto_duration_sec = 100_000;

        let c = config.clamped();
        assert_eq!(c.update.fps_ms, 50);
        assert_eq!(c.update.avg_ms, 10_000);
        assert_eq!(c.windows.fps_window_ms, 50);
        assert_eq!(c.windows.low01_window_sec, 1);
        assert_eq!(c.windows.avg_window_sec, 30);
        assert_eq!(c.stutter.threshold_ms, 5);
        assert_eq!(c.color.danger_fps, 500);
        assert_eq!(c.benchmark.auto_duration_sec, 3600);
    }

    #[test]
    fn test_clamped_keeps_valid_values() {
        let config = TelemetryConfig::default();
        assert_eq!(config.clamped(), config);
    }

    #[test]
    fn test_max_window_secs() {
        let mut config = TelemetryConfig::default();
        assert_eq!(config.max_window_secs(), 10);

        config.windows.low01_window_sec = 45;
        assert_eq!(config.max_window_secs(), 45);

        config.windows = WindowConfig {
            fps_window_ms: 1500,
            avg_window_sec: 1,
            low1_window_sec: 1,
            low01_window_sec: 1,
            stutter_window_sec: 1,
        };
        // 1500 ms rounds up to 2 s
        assert_eq!(config.max_window_secs(), 2);
    }

    // =============================================================
    // Preset / layout tests
    // =============================================================

    #[test]
    fn test_apply_preset_responsive() {
        let mut config = TelemetryConfig::default();
        config.pause_handling = PauseHandling::Track;
        config.apply_preset(Preset::Responsive);

        assert_eq!(config.preset, Preset::Responsive);
        assert_eq!(config.update.fps_ms, 100);
        assert_eq!(config.update.low1_ms, 750);
        assert_eq!(config.windows.fps_window_ms, 250);
        assert_eq!(config.windows.avg_window_sec, 2);
        assert_eq!(config.windows.low01_window_sec, 8);
        assert_eq!(config.pause_handling, PauseHandling::Freeze);
    }

    #[test]
    fn test_apply_preset_custom_changes_nothing_else() {
        let mut config = TelemetryConfig::default();
        config.update.fps_ms = 777;
        config.apply_preset(Preset::Custom);
        assert_eq!(config.preset, Preset::Custom);
        assert_eq!(config.update.fps_ms, 777);
    }

    #[test]
    fn test_text_layout_cycle() {
        let start = TextLayout::OneLine;
        assert_eq!(start.next(), TextLayout::ThreeLines);
        assert_eq!(start.next().next(), TextLayout::Column);
        assert_eq!(start.next().next().next(), TextLayout::OneLine);
    }
}
