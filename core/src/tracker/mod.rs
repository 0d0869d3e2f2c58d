//! Frame driver
//!
//! [`FrameTracker`] is the engine's single entry point. The host calls
//! [`FrameTracker::on_frame`] once per rendered frame; each call
//!
//! 1. applies the pause policy,
//! 2. turns the time since the previous call into a sample,
//! 3. evicts samples older than the largest window,
//! 4. refreshes every metric whose interval elapsed,
//! 5. writes a benchmark row if a run is active,
//! 6. samples the host probe, and
//! 7. rebuilds the [`Snapshot`] if any cached value changed.


use std::path::PathBuf;
use std::time::{Duration, Instant};

use chrono::Local;

use crate::benchmark::csv::RunSettings;
use crate::benchmark::{
    BenchmarkError, BenchmarkProgress, BenchmarkRecorder, BenchmarkStatus, BenchmarkSummary,
    DirectorySinks, RecorderState, SinkFactory, default_benchmark_dir,
};
use crate::cache::{
    GC_SAMPLE_INTERVAL, MEMORY_SAMPLE_INTERVAL, MetricCache, RefreshGates, stutter_percent,
};
use crate::config::{ColorTarget, PauseHandling, TelemetryConfig, millis, secs};
use crate::host::{HostProbe, NullProbe};
use crate::snapshot::{OverlayColor, Snapshot, build_snapshot, pick_color};
use crate::stats::{FrameHistory, duration_ns, history_capacity_for, ns_to_ms};

/// Fraction of frames behind the 1% low.
const LOW1_FRACTION: f64 = 0.01;
/// Fraction of frames behind the 0.1% low.
const LOW01_FRACTION: f64 = 0.001;

/// Frame-timing telemetry engine.
pub struct FrameTracker {
    config: TelemetryConfig,
    history: FrameHistory,
    gates: RefreshGates,
    metrics: MetricCache,
    snapshot: Snapshot,
    probe: Box<dyn HostProbe>,
    recorder: BenchmarkRecorder,
    last_frame: Option<Instant>,
    was_paused: bool,
}

impl FrameTracker {
    /// Creates a tracker writing benchmarks to [`default_benchmark_dir`].
    pub fn new(config: TelemetryConfig) -> Self {
        let dir = default_benchmark_dir().unwrap_or_else(|| PathBuf::from("benchmarks"));
        let config = config.clamped();
        let capacity = history_capacity_for(config.max_window_secs());

        let mut tracker = Self {
            config: config.clone(),
            history: FrameHistory::new(capacity),
            gates: RefreshGates::default(),
            metrics: MetricCache::default(),
            snapshot: Snapshot::empty(),
            probe: Box::new(NullProbe),
            recorder: BenchmarkRecorder::new(Box::new(DirectorySinks::new(dir))),
            last_frame: None,
            was_paused: false,
        };
        tracker.apply_config(config, true);
        tracker
    }

    /// Replaces the host probe.
    pub fn with_probe(mut self, probe: impl HostProbe + 'static) -> Self {
        self.probe = Box::new(probe);
        self
    }

    /// Replaces where benchmark artifacts are written.
    pub fn with_sinks(self, sinks: impl SinkFactory + 'static) -> Self {
        self.with_recorder(BenchmarkRecorder::new(Box::new(sinks)))
    }

    /// Replaces the benchmark recorder. Must be called before a run starts.
    pub fn with_recorder(mut self, recorder: BenchmarkRecorder) -> Self {
        self.recorder = recorder;
        self
    }

    // =========================================================================
    // Configuration
    // =========================================================================

    /// Replaces the configuration. Values are clamped into range.
    ///
    /// History is dropped when the largest window needs a different capacity,
    /// when `force_reset` is set, or when the tracker is being re-enabled.
    /// Disabling the tracker stops an active benchmark run.
    pub fn apply_config(&mut self, config: TelemetryConfig, force_reset: bool) {
        let config = config.clamped();
        let enabling = config.enabled && !self.config.enabled;
        self.config = config;

        let capacity = history_capacity_for(self.config.max_window_secs());
        if capacity != self.history.capacity() {
            tracing::debug!(
                from = self.history.capacity(),
                to = capacity,
                "Reallocating frame history"
            );
            self.history = FrameHistory::new(capacity);
            self.reset_metrics();
        }

        if force_reset || enabling {
            self.reset();
        }

        if !self.config.enabled {
            self.snapshot = Snapshot::empty();
            if self.recorder.is_recording() {
                if let Err(err) = self.recorder.stop() {
                    tracing::warn!(%err, "Failed to stop benchmark on disable");
                }
            }
        } else {
            self.rebuild_snapshot();
        }
    }

    pub fn config(&self) -> &TelemetryConfig {
        &self.config
    }

    // =========================================================================
    // Per-frame driver
    // =========================================================================

    /// Drops all samples and cached values, and clears a failed benchmark
    /// state. An active benchmark run keeps recording.
    pub fn reset(&mut self) {
        self.reset_metrics();
        self.recorder.clear_error();
    }

    fn reset_metrics(&mut self) {
        self.history.clear();
        self.gates = RefreshGates::default();
        self.metrics = MetricCache::default();
        self.last_frame = None;
        self.was_paused = false;
        self.rebuild_snapshot();
    }

    /// Processes one rendered frame that started at `now`.
    pub fn on_frame(&mut self, now: Instant, paused: bool) {
        if !self.config.enabled {
            self.last_frame = Some(now);
            self.was_paused = paused;
            return;
        }

        if paused {
            match self.config.pause_handling {
                PauseHandling::Reset => {
                    if !self.was_paused {
                        tracing::debug!("Pause started; dropping frame history");
                        self.reset_metrics();
                    }
                    self.was_paused = true;
                    self.last_frame = Some(now);
                    return;
                }
                PauseHandling::Freeze => {
                    self.was_paused = true;
                    self.last_frame = Some(now);
                    return;
                }
                PauseHandling::Track => self.was_paused = true,
            }
        } else {
            self.was_paused = false;
        }

        let Some(previous) = self.last_frame.replace(now) else {
            return;
        };
        let frame_ns = duration_ns(now.saturating_duration_since(previous));
        if frame_ns == 0 {
            return;
        }

        self.history.push(now, frame_ns);
        if let Some(cutoff) = now.checked_sub(Duration::from_secs(self.config.max_window_secs())) {
            self.history.prune_older_than(cutoff);
        }

        let before = self.metrics;
        self.refresh_metrics(now);

        if let Err(err) = self.recorder.record_frame(now, frame_ns, &self.metrics) {
            tracing::warn!(%err, "Benchmark recording aborted");
        }

        self.sample_host(now);

        if self.metrics != before {
            self.rebuild_snapshot();
        }
    }

    fn refresh_metrics(&mut self, now: Instant) {
        let cfg = &self.config;
        let display = &cfg.display;
        let color_target = cfg.color.enabled.then_some(cfg.color.target);
        let gates = &mut self.gates;
        let history = &mut self.history;
        let m = &mut self.metrics;

        let due_fps = (display.fps || color_target == Some(ColorTarget::Fps))
            && gates.fps.is_due(now, millis(cfg.update.fps_ms));
        let due_frame_time = display.frametime && gates.frame_time.is_due(now, millis(cfg.update.frametime_ms));
        if due_fps || due_frame_time {
            let smoothed = history.smoothed(now, cfg.fps_window());
            if due_fps {
                m.fps = smoothed.fps;
                gates.fps.mark(now);
            }
            if due_frame_time {
                m.frame_time_ms = smoothed.frame_time_ms;
                gates.frame_time.mark(now);
            }
        }

        if display.avg && gates.avg.fire(now, millis(cfg.update.avg_ms)) {
            m.avg_fps = history.average_fps(now, secs(cfg.windows.avg_window_sec));
        }

        if (display.low1 || color_target == Some(ColorTarget::Low1))
            && gates.low1.fire(now, millis(cfg.update.low1_ms))
        {
            let window = secs(cfg.windows.low1_window_sec);
            m.low1_fps = history.low_fps(now, window, cfg.low_method, LOW1_FRACTION);
        }

        if (display.low01 || color_target == Some(ColorTarget::Low01))
            && gates.low01.fire(now, millis(cfg.update.low01_ms))
        {
            let window = secs(cfg.windows.low01_window_sec);
            m.low01_fps = history.low_fps(now, window, cfg.low_method, LOW01_FRACTION);
        }

        if (display.stutters || display.max_spike)
            && gates.stutters.fire(now, millis(cfg.update.stutters_ms))
        {
            let window = secs(cfg.windows.stutter_window_sec);
            let frames = history.window_stats(now, window).count;
            m.stutters = history.count_at_or_above(now, window, cfg.stutter_threshold_ns());
            m.stutter_percent = stutter_percent(m.stutters, frames);
            m.max_spike_ms = ns_to_ms(history.max_in_window(now, window));
        }
    }

    fn sample_host(&mut self, now: Instant) {
        if self.config.display.gc && self.gates.gc.fire(now, GC_SAMPLE_INTERVAL) {
            let pause_ms = self.probe.gc_pause_ms();
            self.metrics.gc_pause_ms = (pause_ms > 0).then_some(pause_ms);
        }
        if self.config.display.memory && self.gates.memory.fire(now, MEMORY_SAMPLE_INTERVAL) {
            self.metrics.memory = self.probe.memory();
        }
    }

    fn rebuild_snapshot(&mut self) {
        if !self.config.enabled {
            self.snapshot = Snapshot::empty();
            return;
        }
        let color = pick_color(&self.config.color, &self.metrics);
        self.snapshot = build_snapshot(&self.config.display, &self.metrics, color);
    }

    // =========================================================================
    // Read side
    // =========================================================================

    /// Latest snapshot; empty when nothing is shown or the tracker is disabled.
    pub fn snapshot(&self) -> &Snapshot {
        &self.snapshot
    }

    /// Snapshot lines joined with newlines.
    pub fn text(&self) -> String {
        self.snapshot.text()
    }

    /// Current color of the snapshot text.
    pub fn color(&self) -> OverlayColor {
        self.snapshot.color
    }

    pub fn metrics(&self) -> &MetricCache {
        &self.metrics
    }

    pub fn history(&self) -> &FrameHistory {
        &self.history
    }

    // =========================================================================
    // Benchmark
    // =========================================================================

    /// Starts a run when idle, stops the active one otherwise.
    ///
    /// The run captures the current configuration; later config changes do
    /// not affect its header or summary.
    pub fn toggle_benchmark(&mut self, now: Instant) -> Result<BenchmarkStatus, BenchmarkError> {
        if self.recorder.is_recording() {
            return self.recorder.stop();
        }
        let settings = RunSettings::from_config(&self.config, Local::now(), self.probe.host_version());
        self.recorder.start(now, settings)
    }

    pub fn is_benchmark_active(&self) -> bool {
        self.recorder.is_recording()
    }

    pub fn benchmark_state(&self) -> RecorderState {
        self.recorder.state()
    }

    /// Summary of the last successfully stopped run.
    pub fn last_summary(&self) -> BenchmarkSummary {
        self.recorder.last_summary()
    }

    pub fn benchmark_progress(&self, now: Instant) -> Option<BenchmarkProgress> {
        self.recorder.progress(now)
    }

    /// Stops the active run once its configured duration has elapsed.
    ///
    /// Returns `None` when nothing was stopped.
    pub fn poll_auto_stop(&mut self, now: Instant) -> Option<Result<BenchmarkStatus, BenchmarkError>> {
        self.recorder
            .auto_stop_due(now)
            .then(|| self.recorder.stop())
    }
}
