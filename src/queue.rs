//! Shared reading queue between the sampling thread and the file writer.
//!
//! A mutex-guarded deque with no capacity bound: the producer appends one
//! reading at a time, the consumer drains everything in one locked
//! operation. At the expected production rate (tens of readings per
//! second) an unbounded queue is an intentional simplification; a stalled
//! writer grows memory instead of losing data.

use std::collections::VecDeque;

use parking_lot::Mutex;

use crate::reading::Reading;

/// Insertion-ordered handoff queue for readings.
///
/// Every access holds the lock for its full duration and never across a
/// blocking call, so a drain observes a consistent snapshot: each reading
/// appended before the drain appears exactly once, in append order.
#[derive(Debug, Default)]
pub struct ReadingQueue {
    inner: Mutex<VecDeque<Reading>>,
}

impl ReadingQueue {
    /// Create an empty queue.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one reading at the tail. Amortized O(1).
    pub fn append(&self, reading: Reading) {
        self.inner.lock().push_back(reading);
    }

    /// Atomically remove and return all queued readings in append order.
    pub fn drain_all(&self) -> Vec<Reading> {
        let mut guard = self.inner.lock();
        guard.drain(..).collect()
    }

    /// Put a batch suffix back at the head of the queue, preserving global
    /// order. Used when a write cycle fails partway so the unwritten
    /// remainder is retried on the next drain.
    pub fn requeue_front(&self, readings: &[Reading]) {
        let mut guard = self.inner.lock();
        for reading in readings.iter().rev() {
            guard.push_front(*reading);
        }
    }

    /// Number of queued readings.
    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    /// Whether the queue is empty.
    pub fn is_empty(&self) -> bool {
        self.inner.lock().is_empty()
    }
}
