//! Bounded ring buffer for in-memory record retention
//!
//! Keeps the most recent `capacity` items, dropping the oldest on overflow.

use std::collections::VecDeque;

/// A ring buffer that maintains a fixed maximum number of items
#[derive(Debug, Clone)]
pub struct RingBuffer<T> {
    buffer: VecDeque<T>,
    capacity: usize,
    total_written: usize,
}

impl<T> RingBuffer<T> {
    /// Create a new ring buffer holding at most `capacity` items
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            buffer: VecDeque::with_capacity(capacity.min(1024)),
            capacity,
            total_written: 0,
        }
    }

    /// Push an item, evicting the oldest one if the buffer is full
    pub fn push(&mut self, item: T) {
        self.total_written += 1;
        if self.capacity == 0 {
            return;
        }
        if self.buffer.len() >= self.capacity {
            self.buffer.pop_front();
        }
        self.buffer.push_back(item);
    }

    /// Number of retained items
    #[must_use]
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Total number of items pushed (including evicted ones)
    #[must_use]
    pub const fn total_written(&self) -> usize {
        self.total_written
    }

    /// Check if any item was evicted
    #[must_use]
    pub const fn was_truncated(&self) -> bool {
        self.total_written > self.capacity
    }

    /// Iterate retained items from oldest to newest
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.buffer.iter()
    }

    /// Most recently pushed item
    #[must_use]
    pub fn latest(&self) -> Option<&T> {
        self.buffer.back()
    }
}
