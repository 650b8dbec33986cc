//! Fixed-capacity sample history for a single analog channel.

use heapless::HistoryBuf;

/// Sliding window of the most recent admitted raw samples.
///
/// Samples are kept oldest first. Once the window holds `CAP` samples every
/// insertion evicts the oldest one, so `len()` never exceeds `CAP`.
///
/// The window also carries the mean computed on the last admission. It reads
/// as 0 until the first sample is admitted.
#[derive(Debug, Clone)]
pub struct HistoryBuffer<const CAP: usize> {
    samples: HistoryBuf<u16, CAP>,
    cached_mean: u16,
}

impl<const CAP: usize> HistoryBuffer<CAP> {
    /// Create an empty window.
    pub const fn new() -> Self {
        Self {
            samples: HistoryBuf::new(),
            cached_mean: 0,
        }
    }

    /// Fixed capacity of the window.
    pub const fn capacity(&self) -> usize {
        CAP
    }

    /// Number of samples currently held.
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// True once the window holds `CAP` samples.
    pub fn is_full(&self) -> bool {
        self.samples.is_full()
    }

    /// The most recently inserted sample.
    pub fn last(&self) -> Option<u16> {
        self.samples.recent().copied()
    }

    /// Iterate samples oldest to newest.
    pub fn iter(&self) -> impl Iterator<Item = u16> + '_ {
        self.samples.oldest_ordered().copied()
    }

    /// Append a sample, evicting the oldest one when the window is full.
    pub fn insert(&mut self, value: u16) {
        self.samples.write(value);
    }

    /// Truncating integer mean of the held samples, 0 when empty.
    pub fn mean(&self) -> u16 {
        let count = self.samples.len() as u32;
        if count == 0 {
            return 0;
        }
        let sum: u32 = self.samples.as_slice().iter().map(|&s| u32::from(s)).sum();
        (sum / count) as u16
    }

    /// Mean stored by the last call to [`refresh_mean`](Self::refresh_mean).
    pub fn cached_mean(&self) -> u16 {
        self.cached_mean
    }

    /// Recompute the mean and store it as the cached value.
    pub fn refresh_mean(&mut self) -> u16 {
        self.cached_mean = self.mean();
        self.cached_mean
    }
}

impl<const CAP: usize> Default for HistoryBuffer<CAP> {
    fn default() -> Self {
        Self::new()
    }
}
