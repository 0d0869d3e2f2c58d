//! Artifact destinations

use std::fs::{self, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};

/// An open artifact.
pub struct BenchmarkSink {
    pub writer: Box<dyn Write>,
    /// File name shown to the user
    pub file_name: String,
    pub path: PathBuf,
}

impl std::fmt::Debug for BenchmarkSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BenchmarkSink")
            .field("file_name", &self.file_name)
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}

/// Opens a new artifact for each benchmark run.
pub trait SinkFactory {
    fn create(&mut self, started: DateTime<Local>) -> io::Result<BenchmarkSink>;
}

/// Most same-second name collisions tried before giving up.
const MAX_NAME_ATTEMPTS: u32 = 1000;

/// Writes `benchmark_YYYYMMDD_HHMMSS.csv` files into a directory.
///
/// Existing files are never overwritten: a run starting in the same second as
/// an earlier one gets a `_2`, `_3`, ... suffix.
#[derive(Debug, Clone)]
pub struct DirectorySinks {
    dir: PathBuf,
}

impl DirectorySinks {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl SinkFactory for DirectorySinks {
    fn create(&mut self, started: DateTime<Local>) -> io::Result<BenchmarkSink> {
        fs::create_dir_all(&self.dir)?;

        let stem = format!("benchmark_{}", started.format("%Y%m%d_%H%M%S"));
        for attempt in 1..=MAX_NAME_ATTEMPTS {
            let file_name = match attempt {
                1 => format!("{stem}.csv"),
                n => format!("{stem}_{n}.csv"),
            };
            let path = self.dir.join(&file_name);

            match OpenOptions::new().write(true).create_new(true).open(&path) {
                Ok(file) => {
                    let path = std::path::absolute(&path).unwrap_or(path);
                    return Ok(BenchmarkSink {
                        writer: Box::new(BufWriter::new(file)),
                        file_name,
                        path,
                    });
                }
                Err(e) if e.kind() == io::ErrorKind::AlreadyExists => continue,
                Err(e) => return Err(e),
            }
        }

        Err(io::Error::new(
            io::ErrorKind::AlreadyExists,
            format!("no free file name for {stem}.csv"),
        ))
    }
}

/// Platform data directory for benchmark artifacts, if one can be resolved.
pub fn default_benchmark_dir() -> Option<PathBuf> {
    directories::ProjectDirs::from("io.framepulse", "", "FramePulse")
        .map(|dirs| dirs.data_dir().join("benchmarks"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn started() -> DateTime<Local> {
        Local
            .with_ymd_and_hms(2026, 3, 14, 9, 26, 53)
            .single()
            .unwrap()
    }

    #[test]
    fn test_creates_directory_and_file() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join("nested").join("benchmarks");
        let mut sinks = DirectorySinks::new(&dir);

        let mut sink = sinks.create(started()).unwrap();
        assert_eq!(sink.file_name, "benchmark_20260314_092653.csv");
        assert!(sink.path.is_absolute());

        sink.writer.write_all(b"hello\n").unwrap();
        sink.writer.flush().unwrap();
        drop(sink);

        let written = fs::read_to_string(dir.join("benchmark_20260314_092653.csv")).unwrap();
        assert_eq!(written, "hello\n");
    }

    #[test]
    fn test_never_overwrites() {
        let tmp = tempfile::tempdir().unwrap();
        let mut sinks = DirectorySinks::new(tmp.path());

        let first = sinks.create(started()).unwrap();
        let second = sinks.create(started()).unwrap();
        let third = sinks.create(started()).unwrap();

        assert_eq!(first.file_name, "benchmark_20260314_092653.csv");
        assert_eq!(second.file_name, "benchmark_20260314_092653_2.csv");
        assert_eq!(third.file_name, "benchmark_20260314_092653_3.csv");
    }

    #[test]
    fn test_directory_is_a_file() {
        let tmp = tempfile::tempdir().unwrap();
        let blocker = tmp.path().join("blocker");
        fs::write(&blocker, b"x").unwrap();

        let mut sinks = DirectorySinks::new(blocker.join("benchmarks"));
        assert!(sinks.create(started()).is_err());
    }
}
