//! Bounded work queue for pipeline flow control.
//!
//! This module provides [`WorkQueue`], a capacity-bounded multi-producer,
//! multi-consumer queue that carries ownership of work items between pipeline
//! stages. Bounding the capacity is deliberate backpressure: a producer that
//! outruns its consumers blocks in [`WorkQueue::submit`] instead of growing an
//! unbounded buffer, capping pipeline memory regardless of input rate.
//!
//! # Shutdown protocol
//!
//! Two distinct shutdown signals are supported:
//!
//! - [`WorkQueue::finalize`]: "no further submissions; drain what remains."
//!   Queued items stay retrievable; once the queue is empty, consumers observe
//!   completion as `None` from [`WorkQueue::take_next`].
//! - [`WorkQueue::poison`]: fail-fast abort. Queued items are discarded and
//!   every blocked producer and consumer is woken so all threads can exit
//!   promptly, even a producer parked on a full queue.
//!
//! Internal state is a single mutex guarding the buffer plus two condition
//! variables (not-full for producers, not-empty for consumers); there is no
//! busy-waiting.

use crate::errors::{FgalignError, Result};
use parking_lot::{Condvar, Mutex};
use std::collections::VecDeque;

struct QueueState<T> {
    items: VecDeque<T>,
    finalized: bool,
    poisoned: bool,
}

/// A thread-safe, capacity-bounded work queue with drain and abort shutdown.
///
/// Ownership of an item transfers into the queue at [`WorkQueue::submit`] and
/// out exactly once at [`WorkQueue::take_next`]; items are never duplicated or
/// dropped while the queue is live (poisoning discards what remains, which is
/// only reachable on the error path).
pub struct WorkQueue<T> {
    state: Mutex<QueueState<T>>,
    capacity: usize,
    not_full: Condvar,
    not_empty: Condvar,
}

impl<T> WorkQueue<T> {
    /// Create a queue holding at most `capacity` items.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is zero.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        assert!(capacity > 0, "queue capacity must be at least 1");
        Self {
            state: Mutex::new(QueueState {
                items: VecDeque::with_capacity(capacity),
                finalized: false,
                poisoned: false,
            }),
            capacity,
            not_full: Condvar::new(),
            not_empty: Condvar::new(),
        }
    }

    /// Submit an item, blocking while the queue is at capacity.
    ///
    /// # Errors
    ///
    /// Returns [`FgalignError::QueueClosed`] if the queue has been finalized
    /// or poisoned, including while blocked waiting for a free slot.
    pub fn submit(&self, item: T) -> Result<()> {
        let mut state = self.state.lock();
        loop {
            if state.finalized || state.poisoned {
                return Err(FgalignError::QueueClosed);
            }
            if state.items.len() < self.capacity {
                break;
            }
            self.not_full.wait(&mut state);
        }
        state.items.push_back(item);
        drop(state);
        self.not_empty.notify_one();
        Ok(())
    }

    /// Take the next item, blocking until one is available.
    ///
    /// Returns `None` once the queue is finalized and fully drained, or
    /// immediately after the queue is poisoned. `None` means "no more work",
    /// not an error.
    pub fn take_next(&self) -> Option<T> {
        let mut state = self.state.lock();
        loop {
            if state.poisoned {
                return None;
            }
            if let Some(item) = state.items.pop_front() {
                drop(state);
                self.not_full.notify_one();
                return Some(item);
            }
            if state.finalized {
                return None;
            }
            self.not_empty.wait(&mut state);
        }
    }

    /// Signal that no further items will be submitted.
    ///
    /// Idempotent. Items already queued remain retrievable; consumers observe
    /// completion once the queue drains.
    pub fn finalize(&self) {
        let mut state = self.state.lock();
        state.finalized = true;
        drop(state);
        self.not_full.notify_all();
        self.not_empty.notify_all();
    }

    /// Abort the queue: discard queued items and wake all blocked threads.
    ///
    /// Used for fail-fast shutdown. After poisoning, `submit` fails and
    /// `take_next` returns `None` without draining.
    pub fn poison(&self) {
        let mut state = self.state.lock();
        state.poisoned = true;
        state.items.clear();
        drop(state);
        self.not_full.notify_all();
        self.not_empty.notify_all();
    }

    /// Number of items currently queued.
    #[must_use]
    pub fn len(&self) -> usize {
        self.state.lock().items.len()
    }

    /// Whether the queue is currently empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.state.lock().items.is_empty()
    }

    /// The fixed capacity this queue was created with.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
