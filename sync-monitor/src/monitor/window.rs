//! Fixed-capacity history of a node's most recent height samples.

use std::collections::VecDeque;

/// Sliding window over the last `capacity` height samples, oldest first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryWindow {
    samples: VecDeque<u64>,
    capacity: usize,
}

impl HistoryWindow {
    /// Create an empty window holding at most `capacity` samples.
    pub fn new(capacity: usize) -> Self {
        Self {
            samples: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Record a sample, evicting the oldest one when the window is full.
    pub fn push(&mut self, height: u64) {
        if self.capacity == 0 {
            return;
        }
        if self.samples.len() == self.capacity {
            self.samples.pop_front();
        }
        self.samples.push_back(height);
    }

    /// Whether exactly `capacity` samples have been recorded.
    pub fn is_full(&self) -> bool {
        self.capacity > 0 && self.samples.len() == self.capacity
    }

    /// The earliest sample still in the window.
    pub fn oldest(&self) -> Option<u64> {
        self.samples.front().copied()
    }

    /// The most recent sample.
    pub fn newest(&self) -> Option<u64> {
        self.samples.back().copied()
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Samples from oldest to newest.
    pub fn samples(&self) -> impl Iterator<Item = u64> + '_ {
        self.samples.iter().copied()
    }
}
