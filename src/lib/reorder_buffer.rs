//! Reordering of out-of-sequence results back into submission order.
//!
//! The worker pool completes batches in an arbitrary order. When the caller
//! asks for output in submission order, the sink parks each completed result
//! in a [`ReorderBuffer`] keyed by its batch serial and releases results only
//! when the next expected serial is present.
//!
//! The buffer is sparse: a slot exists for every serial between the next
//! expected one and the highest inserted one, so memory is proportional to
//! how far ahead the fastest worker runs.

use std::collections::VecDeque;

/// Buffer that releases items strictly in serial order.
#[derive(Debug, Default)]
pub struct ReorderBuffer<T> {
    // slots[0] corresponds to next_seq; empty slots are gaps still in flight
    slots: VecDeque<Option<T>>,
    next_seq: u64,
    len: usize,
}

impl<T> ReorderBuffer<T> {
    /// Create an empty buffer expecting serial 0 first.
    #[must_use]
    pub fn new() -> Self {
        Self { slots: VecDeque::new(), next_seq: 0, len: 0 }
    }

    /// Insert an item with the given serial.
    ///
    /// # Panics
    ///
    /// Panics if `seq` was already released or already inserted; each serial
    /// is produced exactly once upstream.
    pub fn insert(&mut self, seq: u64, item: T) {
        assert!(seq >= self.next_seq, "serial {seq} already released");
        let index = (seq - self.next_seq) as usize;
        if index >= self.slots.len() {
            self.slots.resize_with(index + 1, || None);
        }
        assert!(self.slots[index].is_none(), "serial {seq} inserted twice");
        self.slots[index] = Some(item);
        self.len += 1;
    }

    /// Pop the next item in serial order, if it has arrived.
    pub fn try_pop_next(&mut self) -> Option<T> {
        if self.slots.front()?.is_some() {
            let item = self.slots.pop_front().flatten();
            self.next_seq += 1;
            self.len -= 1;
            item
        } else {
            None
        }
    }

    /// Drain every item that is ready for release, in order.
    pub fn drain_ready(&mut self) -> impl Iterator<Item = T> + '_ {
        std::iter::from_fn(move || self.try_pop_next())
    }

    /// The next serial the buffer will release.
    #[must_use]
    pub fn next_seq(&self) -> u64 {
        self.next_seq
    }

    /// Number of items currently parked in the buffer.
    #[must_use]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether the buffer holds no items.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}
