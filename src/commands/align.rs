//! Align command: stream reads through the parallel alignment pipeline.

use crate::commands::command::Command;
use crate::commands::common::{BamIoOptions, FilterOptions, ThreadingOptions};
use anyhow::{bail, Result};
use clap::Parser;
use fgalign_lib::aligner::{BatchAligner, SeedAligner, DEFAULT_SEED_LENGTH};
use fgalign_lib::bam_io::{create_bam_reader, create_bam_writer, finish_bam_writer};
use fgalign_lib::batcher::DEFAULT_BATCH_SIZE;
use fgalign_lib::header::{add_pg_record, set_reference_dictionary};
use fgalign_lib::logging::OperationTimer;
use fgalign_lib::pipeline::{run_pipeline, OutputOrder, PipelineConfig};
use fgalign_lib::progress::ProgressTracker;
use fgalign_lib::validation::validate_file_exists;
use log::info;
use noodles::sam::alignment::io::Write as _;
use noodles::sam::alignment::record_buf::RecordBuf;
use std::path::PathBuf;

/// Number of written records between progress log lines.
const PROGRESS_INTERVAL: u64 = 1000;

#[derive(Parser, Debug)]
#[command(
    name = "align",
    about = "\x1b[38;5;166m[ALIGNMENT]\x1b[0m      \x1b[36mAlign BAM reads to a reference with a parallel chunked pipeline\x1b[0m",
    long_about = r#"
Align reads from a BAM file against a FASTA reference and write the surviving
alignments to an output BAM.

Reads are grouped into fixed-size chunks and distributed to a pool of worker
threads. Each worker aligns its chunk and applies the span and concordance
filters; a single writer thread drains completed chunks, writes records, and
accumulates summary statistics. Both hand-off queues are bounded, so memory
stays bounded regardless of how far the reader runs ahead of the workers.

By default records are written in chunk completion order. Pass
--preserve-input-order to buffer and reorder output so it matches the input
record order.

Example usage:
  fgalign align -i reads.bam -r ref.fa -o aligned.bam
  fgalign align -i reads.bam -r ref.fa -o aligned.bam -t 8 --min-length 100
  fgalign align -i reads.bam -r ref.fa -o aligned.bam --preserve-input-order
"#
)]
pub struct Align {
    /// Input/output BAM options
    #[command(flatten)]
    pub io: BamIoOptions,

    /// Reference FASTA file
    #[arg(short = 'r', long = "reference")]
    pub reference: PathBuf,

    /// Threading options
    #[command(flatten)]
    pub threading: ThreadingOptions,

    /// Alignment quality filters
    #[command(flatten)]
    pub filter: FilterOptions,

    /// Number of records per chunk handed to a worker
    #[arg(long = "chunk-size", default_value_t = DEFAULT_BATCH_SIZE)]
    pub chunk_size: usize,

    /// Seed length for the reference index (1-31)
    #[arg(long = "seed-length", default_value_t = DEFAULT_SEED_LENGTH)]
    pub seed_length: usize,

    /// Write output in input order instead of completion order
    #[arg(long = "preserve-input-order")]
    pub preserve_input_order: bool,
}

impl Align {
    fn validate(&self) -> Result<()> {
        self.io.validate()?;
        validate_file_exists(&self.reference, "Reference FASTA")?;
        if self.chunk_size == 0 {
            bail!("--chunk-size must be at least 1");
        }
        Ok(())
    }

    fn output_order(&self) -> OutputOrder {
        if self.preserve_input_order {
            OutputOrder::Submission
        } else {
            OutputOrder::Completion
        }
    }
}

impl Command for Align {
    fn execute(&self, command_line: &str) -> Result<()> {
        self.validate()?;
        let timer = OperationTimer::new("align");

        let threads = self.threading.num_threads();
        info!("Worker threads: {threads}");
        info!("Chunk size: {} records", self.chunk_size);
        info!(
            "Filters: min length {} bases, min concordance {}",
            self.filter.min_length, self.filter.min_concordance
        );

        let filter = self.filter.to_filter()?;
        let aligner = SeedAligner::with_seed_length(&self.reference, self.seed_length)?;

        let (mut reader, input_header) = create_bam_reader(&self.io.input)?;
        let mut output_header = input_header.clone();
        set_reference_dictionary(&mut output_header, &aligner.reference_dictionary())?;
        let output_header =
            add_pg_record(output_header, crate::version::VERSION, command_line)?;

        let mut writer = create_bam_writer(&self.io.output, &output_header)?;

        let config = PipelineConfig::new(threads)
            .with_batch_size(self.chunk_size)
            .with_queue_capacity(self.threading.queue_capacity())
            .with_output_order(self.output_order());
        let progress =
            ProgressTracker::new("Wrote alignments").with_interval(PROGRESS_INTERVAL);

        let summary = run_pipeline(
            &config,
            reader.record_bufs(&input_header).map(|r| r.map_err(anyhow::Error::from)),
            |batch| aligner.align_batch(&batch.records, &filter),
            |record: &RecordBuf| {
                writer.write_alignment_record(&output_header, record).map_err(Into::into)
            },
            &progress,
        )?;

        finish_bam_writer(writer)?;
        progress.log_final();
        summary.log();
        timer.log_completion(summary.num_alignments());
        Ok(())
    }
}
