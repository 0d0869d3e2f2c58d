//! Shared test utilities for unit tests

use std::cell::{Cell, RefCell};
use std::io::{self, Write};
use std::path::PathBuf;
use std::rc::Rc;

use chrono::{DateTime, Local};

use crate::benchmark::{BenchmarkSink, SinkFactory};
use crate::host::{HostProbe, MemoryUsage};

// ============================================================================
// In-memory sinks
// ============================================================================

#[derive(Debug, Default)]
struct SinkState {
    buffers: RefCell<Vec<Rc<RefCell<Vec<u8>>>>>,
    fail_create: Cell<bool>,
    fail_writes: Cell<bool>,
    flushes: Cell<u32>,
}

/// Sink factory keeping every artifact in memory.
///
/// Clones share state, so a test can hand one clone to the engine and keep
/// another to inspect what was written or to inject failures.
#[derive(Debug, Clone, Default)]
pub struct MemorySinks {
    state: Rc<SinkState>,
}

impl MemorySinks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of artifacts opened so far.
    pub fn created(&self) -> usize {
        self.state.buffers.borrow().len()
    }

    /// Text of the `index`-th artifact.
    pub fn contents(&self, index: usize) -> String {
        let buffers = self.state.buffers.borrow();
        let bytes = buffers[index].borrow();
        String::from_utf8_lossy(&bytes).into_owned()
    }

    /// Makes opening new artifacts fail.
    pub fn fail_create(&self, fail: bool) {
        self.state.fail_create.set(fail);
    }

    /// Makes every write and flush on any artifact fail.
    pub fn fail_writes(&self, fail: bool) {
        self.state.fail_writes.set(fail);
    }

    /// Successful flushes across all artifacts.
    pub fn flushes(&self) -> u32 {
        self.state.flushes.get()
    }
}

impl SinkFactory for MemorySinks {
    fn create(&mut self, _started: DateTime<Local>) -> io::Result<BenchmarkSink> {
        if self.state.fail_create.get() {
            return Err(io::Error::new(io::ErrorKind::PermissionDenied, "read-only disk"));
        }

        let buffer = Rc::new(RefCell::new(Vec::new()));
        self.state.buffers.borrow_mut().push(Rc::clone(&buffer));
        let n = self.created();

        Ok(BenchmarkSink {
            writer: Box::new(MemoryWriter {
                buffer,
                state: Rc::clone(&self.state),
            }),
            file_name: format!("benchmark_{n}.csv"),
            path: PathBuf::from(format!("/memory/benchmark_{n}.csv")),
        })
    }
}

struct MemoryWriter {
    buffer: Rc<RefCell<Vec<u8>>>,
    state: Rc<SinkState>,
}

impl MemoryWriter {
    fn check(&self) -> io::Result<()> {
        if self.state.fail_writes.get() {
            return Err(io::Error::other("disk full"));
        }
        Ok(())
    }
}

impl Write for MemoryWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.check()?;
        self.buffer.borrow_mut().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.check()?;
        self.state.flushes.set(self.state.flushes.get() + 1);
        Ok(())
    }
}

// ============================================================================
// Host probe
// ============================================================================

/// Probe returning fixed values and counting how often it is sampled.
#[derive(Debug, Clone, Default)]
pub struct FixedProbe {
    pub gc_pause_ms: u64,
    pub memory: MemoryUsage,
    gc_calls: Rc<Cell<u32>>,
    memory_calls: Rc<Cell<u32>>,
}

impl FixedProbe {
    pub fn new(gc_pause_ms: u64, used_mb: u64, max_mb: u64) -> Self {
        Self {
            gc_pause_ms,
            memory: MemoryUsage { used_mb, max_mb },
            ..Self::default()
        }
    }

    pub fn gc_calls(&self) -> u32 {
        self.gc_calls.get()
    }

    pub fn memory_calls(&self) -> u32 {
        self.memory_calls.get()
    }
}

impl HostProbe for FixedProbe {
    fn gc_pause_ms(&mut self) -> u64 {
        self.gc_calls.set(self.gc_calls.get() + 1);
        self.gc_pause_ms
    }

    fn memory(&mut self) -> MemoryUsage {
        self.memory_calls.set(self.memory_calls.get() + 1);
        self.memory
    }

    fn host_version(&self) -> String {
        "test-host 1.0".to_string()
    }
}
