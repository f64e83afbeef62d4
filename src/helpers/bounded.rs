//! Bounded deque for notice buffering
//!
//! Fixed capacity; pushing past capacity evicts the oldest item.

use std::collections::VecDeque;

/// A bounded deque with FIFO eviction
#[derive(Clone, Debug)]
pub struct BoundedDeque<T> {
    cap: usize,
    buf: VecDeque<T>,
}

impl<T> BoundedDeque<T> {
    /// Create a deque holding at most `cap` items (0 disables storage)
    pub fn new(cap: usize) -> Self {
        Self {
            cap,
            buf: VecDeque::with_capacity(cap.min(1024)),
        }
    }

    /// Push a value, returning the evicted oldest item if any
    pub fn push(&mut self, value: T) -> Option<T> {
        if self.cap == 0 {
            return Some(value);
        }
        let evicted = if self.buf.len() == self.cap {
            self.buf.pop_front()
        } else {
            None
        };
        self.buf.push_back(value);
        evicted
    }

    /// Newest to oldest
    pub fn iter_rev(&self) -> impl Iterator<Item = &T> {
        self.buf.iter().rev()
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.cap
    }

    /// Most recent item
    pub fn last(&self) -> Option<&T> {
        self.buf.back()
    }

    pub fn clear(&mut self) {
        self.buf.clear();
    }
}
