//! # Bounded Queue
//!
//! Fixed-capacity FIFO with blocking `push`/`pop` and an explicit close.
//!
//! Blocking and wakeup are the only signaling mechanism: a full queue parks
//! pushers, an empty queue parks poppers, and closing wakes everyone.
//!
//! Two ways to stop a queue:
//!
//! - [`BoundedQueue::close`] discards whatever is buffered. Pops return `None`
//!   immediately afterwards.
//! - [`BoundedQueue::seal`] only refuses new pushes. Elements already queued
//!   stay poppable until drained.

use parking_lot::{Condvar, Mutex};
use std::collections::VecDeque;
use thiserror::Error;

/// Error returned by [`BoundedQueue::try_push`]. Carries the rejected value.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TryPushError<T> {
    /// The queue is at capacity.
    #[error("queue is full")]
    Full(T),

    /// The queue no longer accepts values.
    #[error("queue is closed")]
    Closed(T),
}

impl<T> TryPushError<T> {
    /// Recover the value that could not be enqueued.
    pub fn into_inner(self) -> T {
        match self {
            Self::Full(value) | Self::Closed(value) => value,
        }
    }
}

/// Upper bound on storage reserved up front. Larger queues grow on demand.
const PREALLOCATE_LIMIT: usize = 64;

struct QueueState<T> {
    items: VecDeque<T>,
    closed: bool,
}

/// Fixed-capacity blocking FIFO.
pub struct BoundedQueue<T> {
    state: Mutex<QueueState<T>>,
    not_empty: Condvar,
    not_full: Condvar,
    capacity: usize,
}

impl<T> BoundedQueue<T> {
    /// Create a queue holding at most `capacity` elements.
    ///
    /// A capacity of zero is normalized to one. Storage is reserved lazily,
    /// so a very large capacity costs nothing until it is filled.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            state: Mutex::new(QueueState {
                items: VecDeque::with_capacity(capacity.min(PREALLOCATE_LIMIT)),
                closed: false,
            }),
            not_empty: Condvar::new(),
            not_full: Condvar::new(),
            capacity,
        }
    }

    /// Enqueue `value`, blocking while the queue is full.
    ///
    /// Returns `false` without enqueuing if the queue is closed, or becomes
    /// closed while waiting for space.
    pub fn push(&self, value: T) -> bool {
        let mut state = self.state.lock();
        while state.items.len() >= self.capacity && !state.closed {
            self.not_full.wait(&mut state);
        }
        if state.closed {
            return false;
        }
        state.items.push_back(value);
        drop(state);

        self.not_empty.notify_one();
        true
    }

    /// Enqueue `value` without blocking.
    pub fn try_push(&self, value: T) -> Result<(), TryPushError<T>> {
        let mut state = self.state.lock();
        if state.closed {
            return Err(TryPushError::Closed(value));
        }
        if state.items.len() >= self.capacity {
            return Err(TryPushError::Full(value));
        }
        state.items.push_back(value);
        drop(state);

        self.not_empty.notify_one();
        Ok(())
    }

    /// Dequeue the head, blocking while the queue is empty.
    ///
    /// Returns `None` once the queue is closed and empty.
    pub fn pop(&self) -> Option<T> {
        let mut state = self.state.lock();
        while state.items.is_empty() && !state.closed {
            self.not_empty.wait(&mut state);
        }
        let value = state.items.pop_front()?;
        drop(state);

        self.not_full.notify_one();
        Some(value)
    }

    /// Dequeue the head if one is available.
    pub fn try_pop(&self) -> Option<T> {
        let value = self.state.lock().items.pop_front()?;
        self.not_full.notify_one();
        Some(value)
    }

    /// Close the queue and discard buffered elements. Idempotent.
    pub fn close(&self) {
        self.shutdown(true);
    }

    /// Stop accepting pushes but keep buffered elements poppable. Idempotent.
    ///
    /// Sealing an already sealed queue does not discard anything; closing a
    /// sealed queue does.
    pub fn seal(&self) {
        self.shutdown(false);
    }

    fn shutdown(&self, discard: bool) {
        let mut state = self.state.lock();
        if discard {
            state.items.clear();
        }
        if state.closed && !discard {
            return;
        }
        state.closed = true;
        drop(state);

        self.not_empty.notify_all();
        self.not_full.notify_all();
    }

    /// Whether pushes are refused.
    pub fn is_closed(&self) -> bool {
        self.state.lock().closed
    }

    /// Number of buffered elements.
    pub fn len(&self) -> usize {
        self.state.lock().items.len()
    }

    /// Whether nothing is buffered.
    pub fn is_empty(&self) -> bool {
        self.state.lock().items.is_empty()
    }

    /// Maximum number of buffered elements.
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl<T> std::fmt::Debug for BoundedQueue<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.lock();
        f.debug_struct("BoundedQueue")
            .field("len", &state.items.len())
            .field("capacity", &self.capacity)
            .field("closed", &state.closed)
            .finish()
    }
}
