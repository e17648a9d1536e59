//! Parallel chunked alignment pipeline.
//!
//! # Architecture
//!
//! ```text
//!                 batch queue                 result queue
//! Batcher ──────▶ (bounded) ──▶ worker pool ──▶ (bounded) ──▶ sink thread
//! (driver thread)               (N threads)                   (1 thread)
//! ```
//!
//! The driver thread batches the input stream and submits each [`Batch`] to a
//! bounded queue feeding `N` symmetric worker threads. Each worker applies
//! the caller-supplied transform (alignment plus filtering) and submits the
//! resulting records to a second bounded queue drained by a single sink
//! thread, which writes records to the output and folds statistics into a
//! [`RunningSummary`]. Both queues are capacity-bounded, so the pipeline's
//! memory stays bounded no matter how far the input runs ahead of the
//! workers.
//!
//! # Shutdown
//!
//! On input exhaustion the driver finalizes the batch queue; workers drain it
//! and exit. Once every worker has joined, the driver finalizes the result
//! queue and joins the sink. The driver never returns before the sink has
//! joined, so the output is fully written when [`run_pipeline`] returns.
//!
//! # Failure
//!
//! Any fatal error aborts the whole run. A failing worker poisons the batch
//! queue, which discards pending batches and unblocks the producer; other
//! workers finish at most their current batch, the sink drains what was
//! already submitted, and the first error is surfaced. A sink write error
//! poisons both queues. No record from a failing batch is ever written.
//!
//! # Ordering
//!
//! Workers complete batches in arbitrary order, and the baseline contract
//! ([`OutputOrder::Completion`]) writes results as they arrive.
//! [`OutputOrder::Submission`] adds a sink-side [`ReorderBuffer`] keyed by
//! batch serial so output order matches input order.

use crate::batcher::{Batch, Batcher, DEFAULT_BATCH_SIZE};
use crate::filter::AlignmentMetrics;
use crate::progress::ProgressTracker;
use crate::queue::WorkQueue;
use crate::reorder_buffer::ReorderBuffer;
use crate::summary::RunningSummary;
use anyhow::{anyhow, Result};
use log::debug;
use std::thread;

/// Ordering of results in the output stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputOrder {
    /// Write results in worker completion order (the default). Records
    /// within one batch stay in order, but batches may interleave
    /// arbitrarily.
    Completion,
    /// Buffer and reorder results so output order matches batch submission
    /// order.
    Submission,
}

/// The records surviving the transform of one batch, tagged with the batch's
/// submission serial. An empty record set is a legitimate result.
#[derive(Debug)]
pub struct AlignmentResult<U> {
    serial: u64,
    records: Vec<U>,
}

/// Configuration for one pipeline run.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Number of worker threads applying the transform.
    pub worker_threads: usize,
    /// Records per batch.
    pub batch_size: usize,
    /// Capacity of each of the two bounded queues.
    pub queue_capacity: usize,
    /// Ordering of results in the output stream.
    pub output_order: OutputOrder,
}

impl PipelineConfig {
    /// Create a configuration for `worker_threads` workers with the default
    /// batch size and a queue capacity of twice the worker count.
    #[must_use]
    pub fn new(worker_threads: usize) -> Self {
        let workers = worker_threads.max(1);
        Self {
            worker_threads: workers,
            batch_size: DEFAULT_BATCH_SIZE,
            queue_capacity: workers * 2,
            output_order: OutputOrder::Completion,
        }
    }

    /// Override the number of records per batch.
    #[must_use]
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    /// Override the capacity of the two bounded queues.
    #[must_use]
    pub fn with_queue_capacity(mut self, queue_capacity: usize) -> Self {
        self.queue_capacity = queue_capacity;
        self
    }

    /// Select the output ordering mode.
    #[must_use]
    pub fn with_output_order(mut self, output_order: OutputOrder) -> Self {
        self.output_order = output_order;
        self
    }
}

/// Run the pipeline to completion.
///
/// `source` yields input records on the calling thread; `transform` is
/// applied to whole batches concurrently from the worker threads, so it must
/// be re-entrant (`Sync`, no interior mutation per call); `write` appends one
/// surviving record to the output and is only ever called from the sink
/// thread, in result order. `progress` is notified with the cumulative
/// written-record count.
///
/// Returns the final [`RunningSummary`] once every thread has joined.
///
/// # Errors
///
/// Returns the first fatal error raised by any stage, identifying the stage
/// in its context. Worker errors take precedence over producer errors, which
/// take precedence over sink errors.
pub fn run_pipeline<T, U, I, F, W>(
    config: &PipelineConfig,
    source: I,
    transform: F,
    mut write: W,
    progress: &ProgressTracker,
) -> Result<RunningSummary>
where
    T: Send,
    U: AlignmentMetrics + Send,
    I: Iterator<Item = Result<T>>,
    F: Fn(Batch<T>) -> Result<Vec<U>> + Sync,
    W: FnMut(&U) -> Result<()> + Send,
{
    let workers = config.worker_threads.max(1);
    let capacity = config.queue_capacity.max(1);
    let batch_queue: WorkQueue<Batch<T>> = WorkQueue::with_capacity(capacity);
    let result_queue: WorkQueue<AlignmentResult<U>> = WorkQueue::with_capacity(capacity);
    let mut batcher = Batcher::new(source, config.batch_size);
    let output_order = config.output_order;

    let (producer_result, worker_error, sink_result) = thread::scope(|scope| {
        let sink = scope.spawn(|| {
            run_sink(&batch_queue, &result_queue, &mut write, progress, output_order)
        });

        let worker_handles: Vec<_> = (0..workers)
            .map(|_| scope.spawn(|| run_worker(&batch_queue, &result_queue, &transform)))
            .collect();

        let producer_result = run_producer(&mut batcher, &batch_queue);
        batch_queue.finalize();

        let mut worker_error = None;
        for handle in worker_handles {
            let outcome = handle
                .join()
                .unwrap_or_else(|_| Err(anyhow!("Alignment worker thread panicked")));
            if let Err(e) = outcome {
                worker_error.get_or_insert(e);
            }
        }
        result_queue.finalize();

        let sink_result = sink
            .join()
            .unwrap_or_else(|_| Err(anyhow!("Writer thread panicked")));
        (producer_result, worker_error, sink_result)
    });

    if let Some(e) = worker_error {
        return Err(e);
    }
    producer_result?;
    sink_result
}

/// Batch the input stream and feed the batch queue, blocking on backpressure.
fn run_producer<T, I>(batcher: &mut Batcher<I>, batches: &WorkQueue<Batch<T>>) -> Result<()>
where
    I: Iterator<Item = Result<T>>,
{
    loop {
        match batcher.next_batch() {
            Ok(Some(batch)) => {
                if batches.submit(batch).is_err() {
                    // Queue poisoned by a failing stage; that stage reports
                    // the error.
                    return Ok(());
                }
            }
            Ok(None) => return Ok(()),
            Err(e) => {
                batches.poison();
                return Err(e.context("Batch producer failed"));
            }
        }
    }
}

/// Poisons a queue unless disarmed, covering both error returns and panics
/// in the owning thread. Without it a failing worker could leave the
/// producer parked forever on a full queue.
struct PoisonGuard<'a, T> {
    queue: &'a WorkQueue<T>,
    armed: bool,
}

impl<T> Drop for PoisonGuard<'_, T> {
    fn drop(&mut self) {
        if self.armed {
            self.queue.poison();
        }
    }
}

/// Worker loop: take a batch, transform it, submit the surviving records.
fn run_worker<T, U, F>(
    batches: &WorkQueue<Batch<T>>,
    results: &WorkQueue<AlignmentResult<U>>,
    transform: &F,
) -> Result<()>
where
    F: Fn(Batch<T>) -> Result<Vec<U>>,
{
    let mut guard = PoisonGuard { queue: batches, armed: true };
    while let Some(batch) = batches.take_next() {
        let serial = batch.serial;
        match transform(batch) {
            Ok(records) => {
                if results.submit(AlignmentResult { serial, records }).is_err() {
                    // Sink has shut down; it reports the error.
                    break;
                }
            }
            Err(e) => {
                // The guard poisons the batch queue on the way out.
                return Err(e.context(format!("Alignment worker failed on batch {serial}")));
            }
        }
    }
    guard.armed = false;
    Ok(())
}

/// Sink loop: drain results, write surviving records, accumulate statistics.
///
/// The summary and the output writer are owned exclusively by this thread
/// while the pipeline runs.
fn run_sink<T, U, W>(
    batches: &WorkQueue<Batch<T>>,
    results: &WorkQueue<AlignmentResult<U>>,
    write: &mut W,
    progress: &ProgressTracker,
    output_order: OutputOrder,
) -> Result<RunningSummary>
where
    U: AlignmentMetrics,
    W: FnMut(&U) -> Result<()>,
{
    let mut summary = RunningSummary::new();
    let drained = drain_results(results, write, &mut summary, progress, output_order);
    if let Err(e) = drained {
        batches.poison();
        results.poison();
        return Err(e.context("Output writer failed"));
    }
    Ok(summary)
}

fn drain_results<U, W>(
    results: &WorkQueue<AlignmentResult<U>>,
    write: &mut W,
    summary: &mut RunningSummary,
    progress: &ProgressTracker,
    output_order: OutputOrder,
) -> Result<()>
where
    U: AlignmentMetrics,
    W: FnMut(&U) -> Result<()>,
{
    match output_order {
        OutputOrder::Completion => {
            while let Some(result) = results.take_next() {
                write_records(&result.records, write, summary, progress)?;
            }
        }
        OutputOrder::Submission => {
            let mut pending = ReorderBuffer::new();
            while let Some(result) = results.take_next() {
                pending.insert(result.serial, result.records);
                while let Some(records) = pending.try_pop_next() {
                    write_records(&records, write, summary, progress)?;
                }
            }
            // On a clean run every serial arrives and the buffer drains
            // empty. After an abort, results past the lost batch are dropped
            // along with it.
            if !pending.is_empty() {
                debug!("Discarding {} reordered result(s) after abort", pending.len());
            }
        }
    }
    Ok(())
}

fn write_records<U, W>(
    records: &[U],
    write: &mut W,
    summary: &mut RunningSummary,
    progress: &ProgressTracker,
) -> Result<()>
where
    U: AlignmentMetrics,
    W: FnMut(&U) -> Result<()>,
{
    for record in records {
        write(record)?;
        summary.record(record);
    }
    progress.record(records.len() as u64);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::bail;
    use std::time::Duration;

    #[derive(Debug, Clone, PartialEq, Eq)]
    struct TestAln {
        id: usize,
        span: i64,
        errors: i64,
    }

    impl AlignmentMetrics for TestAln {
        fn reference_span(&self) -> i64 {
            self.span
        }

        fn edit_errors(&self) -> i64 {
            self.errors
        }
    }

    fn identity_transform(batch: Batch<usize>) -> Result<Vec<TestAln>> {
        Ok(batch
            .records
            .into_iter()
            .map(|id| TestAln { id, span: 100, errors: 0 })
            .collect())
    }

    /// Transform that sleeps longer for earlier batches, so later batches
    /// complete first when workers run in parallel.
    fn skewed_transform(batch: Batch<usize>) -> Result<Vec<TestAln>> {
        let delay = match batch.serial % 3 {
            0 => 30,
            1 => 10,
            _ => 0,
        };
        std::thread::sleep(Duration::from_millis(delay));
        identity_transform(batch)
    }

    fn collect_run(
        num_records: usize,
        config: &PipelineConfig,
        transform: fn(Batch<usize>) -> Result<Vec<TestAln>>,
    ) -> Result<(Vec<usize>, RunningSummary)> {
        let mut written = Vec::new();
        let progress = ProgressTracker::new("Wrote records");
        let summary = run_pipeline(
            config,
            (0..num_records).map(Ok),
            transform,
            |aln: &TestAln| {
                written.push(aln.id);
                Ok(())
            },
            &progress,
        )?;
        Ok((written, summary))
    }

    #[test]
    fn test_single_worker_preserves_submission_order() {
        let config = PipelineConfig::new(1).with_batch_size(10);
        let (written, summary) = collect_run(95, &config, identity_transform).unwrap();
        assert_eq!(written, (0..95).collect::<Vec<_>>());
        assert_eq!(summary.num_alignments(), 95);
    }

    #[test]
    fn test_skewed_delays_deliver_every_record_exactly_once() {
        let config = PipelineConfig::new(4).with_batch_size(10);
        let (mut written, summary) = collect_run(203, &config, skewed_transform).unwrap();
        written.sort_unstable();
        assert_eq!(written, (0..203).collect::<Vec<_>>());
        assert_eq!(summary.num_alignments(), 203);
    }

    #[test]
    fn test_submission_order_mode_restores_input_order() {
        let config = PipelineConfig::new(4)
            .with_batch_size(10)
            .with_output_order(OutputOrder::Submission);
        let (written, _) = collect_run(203, &config, skewed_transform).unwrap();
        assert_eq!(written, (0..203).collect::<Vec<_>>());
    }

    #[test]
    fn test_empty_input_completes_with_empty_summary() {
        let config = PipelineConfig::new(2);
        let (written, summary) = collect_run(0, &config, identity_transform).unwrap();
        assert!(written.is_empty());
        assert_eq!(summary.num_alignments(), 0);
        assert_eq!(summary.mean_concordance_percent(), None);
    }

    #[test]
    fn test_transform_error_aborts_and_identifies_batch() {
        fn failing_transform(batch: Batch<usize>) -> Result<Vec<TestAln>> {
            if batch.serial == 2 {
                bail!("alignment blew up");
            }
            identity_transform(batch)
        }

        let config = PipelineConfig::new(4).with_batch_size(10);
        let mut written = Vec::new();
        let progress = ProgressTracker::new("Wrote records");
        let err = run_pipeline(
            &config,
            (0..100).map(Ok),
            failing_transform,
            |aln: &TestAln| {
                written.push(aln.id);
                Ok(())
            },
            &progress,
        )
        .unwrap_err();

        let chain = format!("{err:#}");
        assert!(chain.contains("batch 2"), "unexpected error: {chain}");
        assert!(chain.contains("alignment blew up"));
        // Records 20..30 belong to the failing batch and must never be
        // written.
        assert!(written.iter().all(|id| !(20..30).contains(id)));
    }

    #[test]
    fn test_source_error_aborts_pipeline() {
        let source = (0..25).map(|i| {
            if i == 23 {
                bail!("truncated input")
            } else {
                Ok(i)
            }
        });
        let config = PipelineConfig::new(2).with_batch_size(10);
        let progress = ProgressTracker::new("Wrote records");
        let err = run_pipeline(
            &config,
            source,
            identity_transform,
            |_: &TestAln| Ok(()),
            &progress,
        )
        .unwrap_err();
        assert!(format!("{err:#}").contains("Batch producer failed"));
    }

    #[test]
    fn test_write_error_aborts_pipeline() {
        let config = PipelineConfig::new(2).with_batch_size(5);
        let progress = ProgressTracker::new("Wrote records");
        let mut writes = 0u32;
        let err = run_pipeline(
            &config,
            (0..1000).map(Ok),
            identity_transform,
            |_: &TestAln| {
                writes += 1;
                if writes > 7 {
                    bail!("disk full")
                }
                Ok(())
            },
            &progress,
        )
        .unwrap_err();
        assert!(format!("{err:#}").contains("Output writer failed"));
    }

    #[test]
    fn test_summary_accumulates_written_metrics() {
        fn mixed_transform(batch: Batch<usize>) -> Result<Vec<TestAln>> {
            Ok(batch
                .records
                .into_iter()
                .map(|id| {
                    if id % 2 == 0 {
                        TestAln { id, span: 100, errors: 0 }
                    } else {
                        TestAln { id, span: 50, errors: 5 }
                    }
                })
                .collect())
        }

        let config = PipelineConfig::new(1).with_batch_size(2);
        let (_, summary) = collect_run(2, &config, mixed_transform).unwrap();
        assert_eq!(summary.num_alignments(), 2);
        assert_eq!(summary.num_bases(), 150);
        assert_eq!(summary.mean_concordance_percent(), Some(95.0));
    }
}
