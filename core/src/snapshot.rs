//! Immutable display snapshots
//!
//! A [`Snapshot`] is the text and color the host draws. It is rebuilt from the
//! [`MetricCache`] only when a cached metric changed.

use crate::cache::MetricCache;
use crate::config::{ColorConfig, ColorTarget, DisplayConfig, TextLayout};
use crate::format::{fixed1, whole};

/// Text color tier.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OverlayColor {
    #[default]
    Normal,
    Warning,
    Danger,
}

impl OverlayColor {
    /// Packed ARGB value.
    pub fn argb(self) -> u32 {
        match self {
            Self::Normal => 0xFFFF_FFFF,
            Self::Warning => 0xFFFF_FF55,
            Self::Danger => 0xFFFF_5555,
        }
    }
}

/// Lines of overlay text plus their color.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Snapshot {
    pub lines: Vec<String>,
    pub color: OverlayColor,
}

impl Snapshot {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// All lines joined with newlines.
    pub fn text(&self) -> String {
        self.lines.join("\n")
    }
}

const SEPARATOR: &str = " | ";

#[derive(Debug, Clone, Copy)]
enum Field {
    Fps,
    Avg,
    Low1,
    Low01,
    FrameTime,
    Stutters,
    MaxSpike,
    Gc,
    Memory,
}

const ONE_LINE: &[Field] = &[
    Field::Fps,
    Field::Avg,
    Field::Low1,
    Field::Low01,
    Field::FrameTime,
    Field::Stutters,
    Field::MaxSpike,
    Field::Gc,
    Field::Memory,
];

const THREE_LINES: [&[Field]; 3] = [
    &[Field::Fps, Field::Avg, Field::FrameTime],
    &[Field::Low1, Field::Low01, Field::Stutters, Field::MaxSpike],
    &[Field::Gc, Field::Memory],
];

const COLUMN: &[Field] = &[
    Field::Fps,
    Field::Avg,
    Field::Low1,
    Field::Low01,
    Field::Stutters,
    Field::MaxSpike,
    Field::FrameTime,
    Field::Gc,
    Field::Memory,
];

impl Field {
    fn shown(self, display: &DisplayConfig) -> bool {
        match self {
            Self::Fps => display.fps,
            Self::Avg => display.avg,
            Self::Low1 => display.low1,
            Self::Low01 => display.low01,
            Self::FrameTime => display.frametime,
            Self::Stutters => display.stutters,
            Self::MaxSpike => display.max_spike,
            Self::Gc => display.gc,
            Self::Memory => display.memory,
        }
    }

    fn render(self, m: &MetricCache) -> String {
        match self {
            Self::Fps => format!("FPS: {}", whole(m.fps)),
            Self::Avg => format!("Avg: {}", whole(m.avg_fps)),
            Self::Low1 => format!("1%: {}", whole(m.low1_fps)),
            Self::Low01 => format!("0.1%: {}", whole(m.low01_fps)),
            Self::FrameTime => format!("FT: {}ms", fixed1(m.frame_time_ms)),
            Self::Stutters => format!("St: {} ({}%)", m.stutters, m.stutter_percent),
            Self::MaxSpike => format!("Spike: {}ms", fixed1(m.max_spike_ms)),
            Self::Gc => match m.gc_pause_ms {
                Some(ms) => format!("GC: {ms}ms"),
                None => "GC: NaN".to_string(),
            },
            Self::Memory => format!("Mem: {} / {}M", m.memory.used_mb, m.memory.max_mb),
        }
    }
}

/// Shown fields of `fields` joined on one line; `None` if nothing is shown.
fn join_line(fields: &[Field], display: &DisplayConfig, metrics: &MetricCache) -> Option<String> {
    let parts: Vec<String> = fields
        .iter()
        .filter(|f| f.shown(display))
        .map(|f| f.render(metrics))
        .collect();
    (!parts.is_empty()).then(|| parts.join(SEPARATOR))
}

/// Lays out the shown metrics according to `display.text_layout`.
pub fn build_snapshot(display: &DisplayConfig, metrics: &MetricCache, color: OverlayColor) -> Snapshot {
    let lines: Vec<String> = match display.text_layout {
        TextLayout::OneLine => join_line(ONE_LINE, display, metrics).into_iter().collect(),
        TextLayout::ThreeLines => THREE_LINES
            .iter()
            .filter_map(|group| join_line(group, display, metrics))
            .collect(),
        TextLayout::Column => COLUMN
            .iter()
            .filter(|f| f.shown(display))
            .map(|f| f.render(metrics))
            .collect(),
    };

    if lines.is_empty() {
        return Snapshot::empty();
    }
    Snapshot { lines, color }
}

/// Color tier for the configured target metric.
///
/// A 1% low target falls back to FPS while the low is still 0; a 0.1% low
/// target falls back to the 1% low, then FPS.
pub fn pick_color(color: &ColorConfig, metrics: &MetricCache) -> OverlayColor {
    if !color.enabled {
        return OverlayColor::Normal;
    }

    let fallback = |primary: f64, secondary: f64| if primary > 0.0 { primary } else { secondary };
    let value = match color.target {
        ColorTarget::Fps => metrics.fps,
        ColorTarget::Low1 => fallback(metrics.low1_fps, metrics.fps),
        ColorTarget::Low01 => fallback(
            metrics.low01_fps,
            fallback(metrics.low1_fps, metrics.fps),
        ),
    };

    if !(value.is_finite() && value > 0.0) {
        return OverlayColor::Normal;
    }
    if value < f64::from(color.danger_fps) {
        OverlayColor::Danger
    } else if value < f64::from(color.warning_fps) {
        OverlayColor::Warning
    } else {
        OverlayColor::Normal
    }
}
