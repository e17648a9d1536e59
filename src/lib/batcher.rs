//! Grouping of a record stream into fixed-size batches.
//!
//! The [`Batcher`] pulls records one at a time from a fallible input cursor
//! and groups them into [`Batch`]es of a configured capacity (the final batch
//! may be short). It is lazy: the next batch is not allocated until the
//! previous one has been handed off, so the batcher itself holds at most one
//! batch in memory.

use anyhow::{Context, Result};

/// Default number of records per batch.
pub const DEFAULT_BATCH_SIZE: usize = 100;

/// A fixed-capacity group of records processed as one scheduling unit.
///
/// Each batch carries a monotonically increasing `serial` assigned at
/// creation, used for ordered output and diagnostics. A batch is handed to
/// exactly one worker and never mutated after submission.
#[derive(Debug)]
pub struct Batch<T> {
    /// Submission sequence number, starting at zero.
    pub serial: u64,
    /// The records in this batch, in input order.
    pub records: Vec<T>,
}

impl<T> Batch<T> {
    /// Number of records in the batch.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the batch holds no records. Never true for batches produced
    /// by a [`Batcher`].
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Groups records from an input cursor into fixed-size batches.
pub struct Batcher<I> {
    source: I,
    capacity: usize,
    next_serial: u64,
}

impl<T, I: Iterator<Item = Result<T>>> Batcher<I> {
    /// Create a batcher over `source` emitting batches of `capacity` records.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is zero.
    pub fn new(source: I, capacity: usize) -> Self {
        assert!(capacity > 0, "batch capacity must be at least 1");
        Self { source, capacity, next_serial: 0 }
    }

    /// Build the next batch, reading up to `capacity` records.
    ///
    /// Returns `Ok(None)` at input exhaustion. Every batch except possibly
    /// the last holds exactly `capacity` records; the last holds at least
    /// one.
    ///
    /// # Errors
    ///
    /// Returns the first error raised by the input cursor; reading stops at
    /// that point and no partial batch is emitted.
    pub fn next_batch(&mut self) -> Result<Option<Batch<T>>> {
        let mut records = Vec::with_capacity(self.capacity);
        while records.len() < self.capacity {
            match self.source.next() {
                Some(Ok(record)) => records.push(record),
                Some(Err(e)) => return Err(e).context("Failed to read input record"),
                None => break,
            }
        }
        if records.is_empty() {
            return Ok(None);
        }
        let serial = self.next_serial;
        self.next_serial += 1;
        Ok(Some(Batch { serial, records }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;

    fn batch_up(num_records: usize, capacity: usize) -> Vec<Batch<usize>> {
        let mut batcher = Batcher::new((0..num_records).map(Ok), capacity);
        let mut batches = Vec::new();
        while let Some(batch) = batcher.next_batch().unwrap() {
            batches.push(batch);
        }
        batches
    }

    #[test]
    fn test_batch_count_is_ceiling_of_records_over_capacity() {
        let capacity = 100;
        for num_records in [0, 1, capacity, capacity + 1, 10 * capacity + 3] {
            let batches = batch_up(num_records, capacity);
            assert_eq!(batches.len(), num_records.div_ceil(capacity), "R={num_records}");
        }
    }

    #[test]
    fn test_all_but_last_batch_are_full() {
        let batches = batch_up(1003, 100);
        assert_eq!(batches.len(), 11);
        for batch in &batches[..10] {
            assert_eq!(batch.len(), 100);
        }
        assert_eq!(batches[10].len(), 3);
    }

    #[test]
    fn test_exact_multiple_has_no_short_batch() {
        let batches = batch_up(300, 100);
        assert_eq!(batches.len(), 3);
        assert!(batches.iter().all(|b| b.len() == 100));
    }

    #[test]
    fn test_records_preserved_without_loss_or_duplication() {
        let capacity = 100;
        for num_records in [0, 1, capacity, capacity + 1, 10 * capacity + 3] {
            let batches = batch_up(num_records, capacity);
            let flattened: Vec<usize> =
                batches.into_iter().flat_map(|b| b.records).collect();
            assert_eq!(flattened, (0..num_records).collect::<Vec<_>>());
        }
    }

    #[test]
    fn test_serials_are_sequential_from_zero() {
        let batches = batch_up(250, 100);
        let serials: Vec<u64> = batches.iter().map(|b| b.serial).collect();
        assert_eq!(serials, vec![0, 1, 2]);
    }

    #[test]
    fn test_source_error_is_propagated() {
        let source = vec![Ok(1), Ok(2), Err(anyhow!("disk on fire"))].into_iter();
        let mut batcher = Batcher::new(source, 10);
        let err = batcher.next_batch().unwrap_err();
        assert!(err.to_string().contains("Failed to read input record"));
    }

    #[test]
    fn test_empty_input_yields_no_batches() {
        let mut batcher = Batcher::new(std::iter::empty::<Result<u8>>(), 5);
        assert!(batcher.next_batch().unwrap().is_none());
        // Repeated calls keep reporting exhaustion.
        assert!(batcher.next_batch().unwrap().is_none());
    }
}
