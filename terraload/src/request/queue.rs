//! Bounded priority queue for requests awaiting admission.
//!
//! Requests are ordered by priority value (lower values first), then by
//! insertion order. The queue never grows past its capacity: inserting into a
//! full queue pushes out the single worst entry, which may be the request
//! just inserted.
//!
//! # Example
//!
//! ```ignore
//! use terraload::request::PriorityRequestQueue;
//!
//! let mut queue = PriorityRequestQueue::new(2);
//!
//! assert!(queue.insert(near_tile).is_none());
//! assert!(queue.insert(far_tile).is_none());
//!
//! // Full: the worst of the three comes back for cancellation
//! let evicted = queue.insert(mid_tile);
//! assert_eq!(evicted.unwrap().url(), far_tile_url);
//! ```

use super::handle::Request;
use crate::config::DEFAULT_REQUEST_QUEUE_LENGTH;
use std::cmp::Ordering;
use std::collections::VecDeque;

// =============================================================================
// Queued Request
// =============================================================================

/// A request plus its insertion sequence for stable ordering.
struct QueuedRequest {
    request: Request,
    sequence: u64,
}

impl QueuedRequest {
    fn cmp_priority(&self, other: &Self) -> Ordering {
        self.request
            .priority()
            .total_cmp(&other.request.priority())
            .then_with(|| self.sequence.cmp(&other.sequence))
    }
}

// =============================================================================
// Priority Request Queue
// =============================================================================

/// Fixed-capacity queue of requests sorted by ascending priority value.
///
/// Priorities may change after insertion (see
/// [`Request::with_priority_function`]); call [`sort`](Self::sort) after
/// mutating them. Not thread-safe; the scheduler owns it exclusively.
pub struct PriorityRequestQueue {
    entries: VecDeque<QueuedRequest>,
    capacity: usize,
    next_sequence: u64,
}

impl PriorityRequestQueue {
    /// Creates an empty queue holding at most `capacity` requests.
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
            next_sequence: 0,
        }
    }

    /// Maximum number of queued requests.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Inserts a request in priority order.
    ///
    /// If the queue was already full, removes and returns the entry with the
    /// highest priority value among the existing entries and the new one. On a
    /// tie with the current worst entry, the new request is the one returned.
    pub fn insert(&mut self, request: Request) -> Option<Request> {
        if self.capacity == 0 {
            return Some(request);
        }

        if self.entries.len() >= self.capacity {
            let worst = self
                .entries
                .back()
                .map(|entry| entry.request.priority())
                .unwrap_or(f64::NEG_INFINITY);
            if request.priority().total_cmp(&worst) != Ordering::Less {
                return Some(request);
            }
        }

        let entry = QueuedRequest {
            sequence: self.take_sequence(),
            request,
        };
        let index = self
            .entries
            .partition_point(|existing| existing.cmp_priority(&entry) == Ordering::Less);
        self.entries.insert(index, entry);

        if self.entries.len() > self.capacity {
            return self.entries.pop_back().map(|entry| entry.request);
        }
        None
    }

    /// Returns the request at `index` in priority order.
    pub fn get(&self, index: usize) -> Option<&Request> {
        self.entries.get(index).map(|entry| &entry.request)
    }

    /// Number of queued requests.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if nothing is queued.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates requests in priority order.
    pub fn iter(&self) -> impl Iterator<Item = &Request> {
        self.entries.iter().map(|entry| &entry.request)
    }

    /// Iterates requests mutably. Call [`sort`](Self::sort) afterwards if
    /// priorities changed.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Request> {
        self.entries.iter_mut().map(|entry| &mut entry.request)
    }

    /// Restores priority order after priorities were mutated.
    pub fn sort(&mut self) {
        self.entries
            .make_contiguous()
            .sort_by(|a, b| a.cmp_priority(b));
    }

    /// Removes and returns the first `count` requests (most urgent first).
    pub fn remove(&mut self, count: usize) -> Vec<Request> {
        let count = count.min(self.entries.len());
        self.entries
            .drain(..count)
            .map(|entry| entry.request)
            .collect()
    }

    /// Removes and returns the most urgent request.
    pub fn pop_front(&mut self) -> Option<Request> {
        self.entries.pop_front().map(|entry| entry.request)
    }

    /// Removes every request, most urgent first.
    pub fn drain(&mut self) -> Vec<Request> {
        self.entries.drain(..).map(|entry| entry.request).collect()
    }

    fn take_sequence(&mut self) -> u64 {
        let sequence = self.next_sequence;
        self.next_sequence = self.next_sequence.wrapping_add(1);
        sequence
    }
}

impl Default for PriorityRequestQueue {
    fn default() -> Self {
        Self::new(DEFAULT_REQUEST_QUEUE_LENGTH)
    }
}

impl std::fmt::Debug for PriorityRequestQueue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PriorityRequestQueue")
            .field("len", &self.entries.len())
            .field("capacity", &self.capacity)
            .finish()
    }
}
