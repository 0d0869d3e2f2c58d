//! Bounded circular sample store
//!
//! Two parallel arrays (timestamps, durations) addressed through a head index
//! and a length, plus a scratch array of the same capacity that selection
//! routines reorder freely. Entries are ordered oldest to newest; the caller
//! pushes non-decreasing timestamps.

use std::time::Instant;

/// Smallest history capacity, in samples.
pub const MIN_HISTORY_CAPACITY: usize = 6_000;
/// Largest history capacity, in samples.
pub const MAX_HISTORY_CAPACITY: usize = 240_000;
/// Samples reserved per second of the largest window (1200 FPS headroom).
pub const SAMPLES_PER_WINDOW_SECOND: usize = 1_200;

/// Capacity needed to hold `max_window_secs` of frames.
pub fn history_capacity_for(max_window_secs: u64) -> usize {
    let secs = usize::try_from(max_window_secs).unwrap_or(usize::MAX);
    secs.saturating_mul(SAMPLES_PER_WINDOW_SECOND)
        .clamp(MIN_HISTORY_CAPACITY, MAX_HISTORY_CAPACITY)
}

/// Fixed-capacity ring of frame samples.
#[derive(Debug, Clone)]
pub struct FrameHistory {
    timestamps: Vec<Instant>,
    durations: Vec<u64>,
    pub(super) scratch: Vec<u64>,
    capacity: usize,
    head: usize,
    len: usize,
}

impl FrameHistory {
    /// Create an empty history holding at most `capacity` samples (minimum 1).
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            timestamps: Vec::with_capacity(capacity),
            durations: Vec::with_capacity(capacity),
            scratch: Vec::with_capacity(capacity),
            capacity,
            head: 0,
            len: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Drop every sample. Storage is kept.
    pub fn clear(&mut self) {
        self.head = 0;
        self.len = 0;
    }

    /// Append a sample, evicting the oldest one when full.
    pub fn push(&mut self, at: Instant, frame_ns: u64) {
        if self.len == self.capacity {
            self.head = (self.head + 1) % self.capacity;
            self.len -= 1;
        }

        let tail = (self.head + self.len) % self.capacity;
        // Slots are materialized lazily; the tail is never past the filled prefix.
        if tail == self.timestamps.len() {
            self.timestamps.push(at);
            self.durations.push(frame_ns);
        } else {
            self.timestamps[tail] = at;
            self.durations[tail] = frame_ns;
        }
        self.len += 1;
    }

    /// Evict samples from the old end while their timestamp is before `cutoff`.
    ///
    /// Returns the number of samples removed.
    pub fn prune_older_than(&mut self, cutoff: Instant) -> usize {
        let mut removed = 0;
        while self.len > 0 && self.timestamps[self.head] < cutoff {
            self.head = (self.head + 1) % self.capacity;
            self.len -= 1;
            removed += 1;
        }
        removed
    }

    /// Oldest sample, if any.
    pub fn oldest(&self) -> Option<(Instant, u64)> {
        (self.len > 0).then(|| self.sample(self.head))
    }

    /// Newest sample, if any.
    pub fn newest(&self) -> Option<(Instant, u64)> {
        (self.len > 0).then(|| self.sample(self.slot(self.len - 1)))
    }

    /// Samples from newest to oldest.
    pub fn iter_newest_first(&self) -> impl Iterator<Item = (Instant, u64)> + '_ {
        (0..self.len).rev().map(|i| self.sample(self.slot(i)))
    }

    /// Physical slot of the `logical`-th oldest sample.
    pub(super) fn slot(&self, logical: usize) -> usize {
        (self.head + logical) % self.capacity
    }

    pub(super) fn sample(&self, slot: usize) -> (Instant, u64) {
        (self.timestamps[slot], self.durations[slot])
    }
}
