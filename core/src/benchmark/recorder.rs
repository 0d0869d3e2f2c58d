//! Benchmark session state machine
//!
//! ```text
//!            start ok                    stop ok
//!   Idle ---------------> Recording ---------------> Idle
//!    ^  \                    |
//!    |   \ start fails       | write / stop fails
//!    |    v                  v
//!    +---- Errored <---------+
//!   (next start reports AlreadyErrored, or clear_error)
//! ```

use std::io::Write;
use std::time::Instant;

use super::csv::{self, FrameRow, RunSettings};
use super::retained::RetainedFrames;
use super::sink::{BenchmarkSink, SinkFactory};
use super::summary::{BenchmarkSummary, RunTotals, summarize_run};
use super::{BenchmarkError, BenchmarkProgress, BenchmarkStatus};
use crate::cache::MetricCache;
use crate::stats::duration_ns;

/// Rows written between flushes.
pub const FLUSH_EVERY_ROWS: u32 = 120;

/// Externally visible session state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecorderState {
    Idle,
    Recording,
    Errored,
}

struct ActiveRun {
    sink: BenchmarkSink,
    settings: RunSettings,
    started: Instant,
    totals: RunTotals,
    rows_since_flush: u32,
    cap_reported: bool,
}

enum Session {
    Idle,
    Recording(Box<ActiveRun>),
    Errored,
}

/// Records benchmark runs through a [`SinkFactory`].
pub struct BenchmarkRecorder {
    sinks: Box<dyn SinkFactory>,
    session: Session,
    frames: RetainedFrames,
    scratch: Vec<u64>,
    last_summary: BenchmarkSummary,
}

impl BenchmarkRecorder {
    pub fn new(sinks: Box<dyn SinkFactory>) -> Self {
        Self::with_retained(sinks, RetainedFrames::new())
    }

    /// Recorder with custom full-run storage limits.
    pub fn with_retained(sinks: Box<dyn SinkFactory>, frames: RetainedFrames) -> Self {
        Self {
            sinks,
            session: Session::Idle,
            frames,
            scratch: Vec::new(),
            last_summary: BenchmarkSummary::default(),
        }
    }

    pub fn state(&self) -> RecorderState {
        match self.session {
            Session::Idle => RecorderState::Idle,
            Session::Recording(_) => RecorderState::Recording,
            Session::Errored => RecorderState::Errored,
        }
    }

    pub fn is_recording(&self) -> bool {
        matches!(self.session, Session::Recording(_))
    }

    /// Summary of the last run that stopped successfully.
    pub fn last_summary(&self) -> BenchmarkSummary {
        self.last_summary
    }

    /// Opens a new artifact and writes its header.
    ///
    /// From `Errored` this fails with [`BenchmarkError::AlreadyErrored`]
    /// without touching the sink factory and returns the recorder to `Idle`.
    pub fn start(&mut self, now: Instant, settings: RunSettings) -> Result<BenchmarkStatus, BenchmarkError> {
        match self.session {
            Session::Recording(_) => return Err(BenchmarkError::AlreadyRecording),
            Session::Errored => {
                self.session = Session::Idle;
                return Err(BenchmarkError::AlreadyErrored);
            }
            Session::Idle => {}
        }

        let sink = match self.open(&settings) {
            Ok(sink) => sink,
            Err(e) => {
                self.session = Session::Errored;
                return Err(e);
            }
        };

        let status = BenchmarkStatus::Started {
            file_name: sink.file_name.clone(),
            path: sink.path.clone(),
        };
        tracing::info!(
            path = %sink.path.display(),
            low_method = settings.low_method.as_str(),
            "Benchmark started"
        );

        self.frames.clear();
        self.session = Session::Recording(Box::new(ActiveRun {
            sink,
            settings,
            started: now,
            totals: RunTotals::default(),
            rows_since_flush: 0,
            cap_reported: false,
        }));
        Ok(status)
    }

    fn open(&mut self, settings: &RunSettings) -> Result<BenchmarkSink, BenchmarkError> {
        let mut sink = self
            .sinks
            .create(settings.started_at)
            .map_err(BenchmarkError::io("start"))?;
        csv::write_header(&mut sink.writer, settings).map_err(BenchmarkError::io("start"))?;
        sink.writer.flush().map_err(BenchmarkError::io("start"))?;
        Ok(sink)
    }

    /// Appends one frame to the active run; does nothing when not recording.
    ///
    /// A write failure discards the run and leaves the recorder `Errored`.
    /// The previous summary is kept.
    pub fn record_frame(&mut self, now: Instant, frame_ns: u64, metrics: &MetricCache) -> Result<(), BenchmarkError> {
        let Session::Recording(run) = &mut self.session else {
            return Ok(());
        };

        let elapsed_ns = duration_ns(now.saturating_duration_since(run.started));
        let row = FrameRow::new(elapsed_ns, frame_ns, metrics);

        run.totals.add(frame_ns);
        if !self.frames.push(frame_ns) && !run.cap_reported {
            run.cap_reported = true;
            tracing::warn!(
                retained = self.frames.len(),
                "Benchmark frame storage full; summary lows will cover the retained frames only"
            );
        }

        let written = writeln!(run.sink.writer, "{}", row.to_csv_line()).and_then(|()| {
            run.rows_since_flush += 1;
            if run.rows_since_flush >= FLUSH_EVERY_ROWS {
                run.rows_since_flush = 0;
                run.sink.writer.flush()
            } else {
                Ok(())
            }
        });

        if let Err(source) = written {
            self.abort();
            return Err(BenchmarkError::Io {
                action: "write",
                source,
            });
        }
        Ok(())
    }

    /// Writes the summary trailer, closes the artifact and returns to `Idle`.
    ///
    /// On failure the recorder is left `Errored` and the previous summary is
    /// kept.
    pub fn stop(&mut self) -> Result<BenchmarkStatus, BenchmarkError> {
        let run = match std::mem::replace(&mut self.session, Session::Idle) {
            Session::Recording(run) => run,
            other => {
                self.session = other;
                return Err(BenchmarkError::NotRecording);
            }
        };
        let ActiveRun {
            mut sink,
            settings,
            totals,
            ..
        } = *run;

        let summary = summarize_run(
            self.frames.as_slice(),
            &mut self.scratch,
            &totals,
            settings.low_method,
            settings.stutter_threshold_ms,
        );
        self.frames.clear();
        self.scratch = Vec::new();

        let finished = csv::write_summary(&mut sink.writer, &summary).and_then(|()| sink.writer.flush());
        if let Err(source) = finished {
            self.session = Session::Errored;
            return Err(BenchmarkError::Io {
                action: "stop",
                source,
            });
        }

        tracing::info!(
            path = %sink.path.display(),
            frames_logged = summary.frames_logged,
            frames_retained = summary.frames_retained,
            avg_fps = summary.avg_fps,
            "Benchmark stopped"
        );

        self.last_summary = summary;
        Ok(BenchmarkStatus::Stopped {
            file_name: sink.file_name,
            path: sink.path,
            summary,
        })
    }

    /// Leaves `Errored` without starting a run.
    pub fn clear_error(&mut self) {
        if matches!(self.session, Session::Errored) {
            self.session = Session::Idle;
        }
    }

    /// Drops the active run after a write failure.
    fn abort(&mut self) {
        // Dropping the sink closes it
        self.session = Session::Errored;
        self.frames.clear();
    }

    /// Progress of the active run.
    pub fn progress(&self, now: Instant) -> Option<BenchmarkProgress> {
        let Session::Recording(run) = &self.session else {
            return None;
        };

        let elapsed_secs = now.saturating_duration_since(run.started).as_secs_f64();
        let duration_secs = run.settings.duration_sec;
        let percent = if duration_secs == 0 {
            0.0
        } else {
            (elapsed_secs / f64::from(duration_secs) * 100.0).min(100.0)
        };

        Some(BenchmarkProgress {
            elapsed_secs,
            duration_secs,
            percent,
        })
    }

    /// True once an active run with a configured duration has lasted that long.
    pub fn auto_stop_due(&self, now: Instant) -> bool {
        match &self.session {
            Session::Recording(run) if run.settings.duration_sec > 0 => {
                now.saturating_duration_since(run.started).as_secs()
                    >= u64::from(run.settings.duration_sec)
            }
            _ => false,
        }
    }

    /// Frames logged so far in the active run.
    pub fn frames_logged(&self) -> u64 {
        match &self.session {
            Session::Recording(run) => run.totals.frames_logged,
            _ => 0,
        }
    }
}
