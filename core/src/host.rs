//! Host runtime probes
//!
//! The engine never measures the host runtime itself. GC pauses, memory
//! usage and the host version string come through a [`HostProbe`].

use serde::{Deserialize, Serialize};

/// Heap usage in megabytes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoryUsage {
    pub used_mb: u64,
    pub max_mb: u64,
}

/// Runtime statistics supplied by the host.
pub trait HostProbe {
    /// Longest GC pause observed since the previous call, in milliseconds.
    ///
    /// 0 means no pause was observed.
    fn gc_pause_ms(&mut self) -> u64;

    /// Current heap usage.
    fn memory(&mut self) -> MemoryUsage;

    /// Opaque host version, written into benchmark headers.
    fn host_version(&self) -> String;
}

/// Probe for hosts without a managed runtime.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullProbe;

impl HostProbe for NullProbe {
    fn gc_pause_ms(&mut self) -> u64 {
        0
    }

    fn memory(&mut self) -> MemoryUsage {
        MemoryUsage::default()
    }

    fn host_version(&self) -> String {
        "unknown".to_string()
    }
}
