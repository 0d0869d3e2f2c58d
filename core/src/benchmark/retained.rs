//! Full-run frame storage
//!
//! Frames of a benchmark run are kept individually so the end-of-run lows
//! are computed over the whole run. Storage starts small and doubles up to a
//! hard limit. Frames past the limit are dropped here; the recorder still
//! counts them in its running totals.

/// Initial number of retained frames.
pub const INITIAL_RETAINED_FRAMES: usize = 6_000;
/// Hard limit on retained frames per run.
pub const MAX_RETAINED_FRAMES: usize = 5_000_000;

#[derive(Debug, Clone)]
pub struct RetainedFrames {
    frames: Vec<u64>,
    capacity: usize,
    initial: usize,
    limit: usize,
}

impl Default for RetainedFrames {
    fn default() -> Self {
        Self::new()
    }
}

impl RetainedFrames {
    pub fn new() -> Self {
        Self::with_limits(INITIAL_RETAINED_FRAMES, MAX_RETAINED_FRAMES)
    }

    /// Storage starting at `initial` frames and never growing past `limit`.
    pub fn with_limits(initial: usize, limit: usize) -> Self {
        let limit = limit.max(1);
        let initial = initial.clamp(1, limit);
        Self {
            frames: Vec::with_capacity(initial),
            capacity: initial,
            initial,
            limit,
        }
    }

    /// Stores `frame_ns`, growing if needed.
    ///
    /// Returns false once the limit is reached and the frame was not kept.
    pub fn push(&mut self, frame_ns: u64) -> bool {
        if self.frames.len() >= self.capacity {
            let next = self.capacity.saturating_mul(2).min(self.limit);
            if next <= self.capacity {
                return false;
            }
            self.frames.reserve_exact(next - self.frames.len());
            self.capacity = next;
        }
        self.frames.push(frame_ns);
        true
    }

    /// Empties the store and shrinks back to the initial size.
    pub fn clear(&mut self) {
        self.frames.clear();
        if self.capacity > self.initial {
            self.frames.shrink_to(self.initial);
            self.capacity = self.initial;
        }
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Current logical capacity.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn as_slice(&self) -> &[u64] {
        &self.frames
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_doubles_until_limit() {
        let mut frames = RetainedFrames::with_limits(4, 10);
        for i in 0..4 {
            assert!(frames.push(i));
        }
        assert_eq!(frames.capacity(), 4);

        assert!(frames.push(4));
        assert_eq!(frames.capacity(), 8);

        for i in 5..8 {
            assert!(frames.push(i));
        }
        assert!(frames.push(8));
        assert_eq!(frames.capacity(), 10);
        assert!(frames.push(9));

        // Full at the limit: further frames are not kept
        assert!(!frames.push(10));
        assert!(!frames.push(11));
        assert_eq!(frames.len(), 10);
        assert_eq!(frames.as_slice(), &[0, 1, 2, 3, 4, 5, 6, 7, 8, 9]);
    }

    #[test]
    fn test_clear_resets_capacity() {
        let mut frames = RetainedFrames::with_limits(2, 100);
        for i in 0..20 {
            frames.push(i);
        }
        assert!(frames.capacity() > 2);

        frames.clear();
        assert!(frames.is_empty());
        assert_eq!(frames.capacity(), 2);
    }

    #[test]
    fn test_default_limits() {
        let frames = RetainedFrames::new();
        assert_eq!(frames.capacity(), INITIAL_RETAINED_FRAMES);
        assert!(frames.is_empty());
    }
}
