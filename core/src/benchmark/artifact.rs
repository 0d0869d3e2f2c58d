//! Benchmark artifact reader
//!
//! Parses artifacts written by [`csv`](super::csv), including logs from
//! interrupted runs that never got a summary trailer.

use std::io::{self, BufRead};

use super::csv::{COLUMNS, FrameRow, SUMMARY_MARKER};
use super::summary::BenchmarkSummary;
use crate::stats::NS_PER_MS;

/// Errors reading an artifact. Line numbers are 1-based.
#[derive(Debug, thiserror::Error)]
pub enum ArtifactError {
    #[error("failed to read line {line}: {source}")]
    Io { line: usize, source: io::Error },
    #[error("line {line}: expected the column header")]
    MissingHeader { line: usize },
    #[error("line {line}: expected {expected} fields, found {found}", expected = COLUMNS.len())]
    FieldCount { line: usize, found: usize },
    #[error("line {line}: invalid {column} value {value:?}")]
    BadNumber {
        line: usize,
        column: &'static str,
        value: String,
    },
}

/// Contents of an artifact.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BenchmarkLog {
    /// `# Key: Value` lines from header and trailer, in file order
    pub metadata: Vec<(String, String)>,
    pub rows: Vec<FrameRow>,
    /// Whether the run was stopped cleanly and has a summary trailer
    pub has_summary: bool,
}

impl BenchmarkLog {
    /// First metadata value stored under `key`.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.metadata
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Per-frame durations recovered from the `frame_ms` column.
    pub fn frame_durations_ns(&self) -> Vec<u64> {
        self.rows
            .iter()
            .map(|row| (row.frame_ms * NS_PER_MS as f64).round() as u64)
            .collect()
    }

    /// Summary stored in the trailer, if the run was stopped cleanly.
    ///
    /// Values are as precise as the trailer: one decimal for rates.
    pub fn stored_summary(&self) -> Option<BenchmarkSummary> {
        if !self.has_summary {
            return None;
        }
        let num = |key: &str| self.get(key).and_then(|v| v.parse::<f64>().ok());
        let int = |key: &str| self.get(key).and_then(|v| v.parse::<u64>().ok());

        Some(BenchmarkSummary {
            avg_fps: num("AvgFPS")?,
            low1_fps: num("Low1FPS")?,
            low01_fps: num("Low01FPS")?,
            stutter_count: int("Stutters")?,
            stutter_percent: int("StutterPercent")
                .and_then(|p| u32::try_from(p).ok())
                .unwrap_or(0),
            max_spike_ms: num("MaxSpikeMs")?,
            frames_logged: int("FramesLogged")?,
            frames_retained: int("FramesSummary")?,
        })
    }
}

/// Reads an artifact.
pub fn read_artifact<R: BufRead>(reader: R) -> Result<BenchmarkLog, ArtifactError> {
    let mut log = BenchmarkLog::default();
    let mut seen_header = false;
    let mut line_no = 0;

    for line in reader.lines() {
        line_no += 1;
        let line = line.map_err(|source| ArtifactError::Io {
            line: line_no,
            source,
        })?;
        let line = line.trim_end();
        if line.is_empty() {
            continue;
        }

        if let Some(comment) = line.strip_prefix('#') {
            if line == SUMMARY_MARKER {
                log.has_summary = true;
            } else if let Some((key, value)) = comment.split_once(':') {
                log.metadata
                    .push((key.trim().to_string(), value.trim().to_string()));
            }
            continue;
        }

        if !seen_header {
            if line.split(',').map(str::trim).ne(COLUMNS) {
                return Err(ArtifactError::MissingHeader { line: line_no });
            }
            seen_header = true;
            continue;
        }

        log.rows.push(parse_row(line, line_no)?);
    }

    if !seen_header {
        return Err(ArtifactError::MissingHeader { line: line_no + 1 });
    }
    Ok(log)
}

fn parse_row(line: &str, line_no: usize) -> Result<FrameRow, ArtifactError> {
    let fields: Vec<&str> = line.split(',').map(str::trim).collect();
    if fields.len() != COLUMNS.len() {
        return Err(ArtifactError::FieldCount {
            line: line_no,
            found: fields.len(),
        });
    }

    fn field<T: std::str::FromStr>(fields: &[&str], index: usize, line: usize) -> Result<T, ArtifactError> {
        fields[index].parse().map_err(|_| ArtifactError::BadNumber {
            line,
            column: COLUMNS[index],
            value: fields[index].to_string(),
        })
    }

    Ok(FrameRow {
        elapsed_ms: field(&fields, 0, line_no)?,
        frame_ms: field(&fields, 1, line_no)?,
        inst_fps: field(&fields, 2, line_no)?,
        fps_smoothed: field(&fields, 3, line_no)?,
        avg_fps: field(&fields, 4, line_no)?,
        low1_fps: field(&fields, 5, line_no)?,
        low01_fps: field(&fields, 6, line_no)?,
        stutters: field(&fields, 7, line_no)?,
        stutter_percent: field(&fields, 8, line_no)?,
        max_spike_ms: field(&fields, 9, line_no)?,
        gc_pause_ms: field(&fields, 10, line_no)?,
        mem_used_mb: field(&fields, 11, line_no)?,
        mem_max_mb: field(&fields, 12, line_no)?,
    })
}
