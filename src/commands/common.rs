//! Shared command-line option structs.

use anyhow::{bail, Result};
use clap::Args;
use fgalign_lib::filter::AlignmentFilter;
use fgalign_lib::validation::validate_file_exists;
use std::path::PathBuf;

/// Input and output BAM paths.
#[derive(Debug, Clone, Args)]
pub struct BamIoOptions {
    /// Input BAM file
    #[arg(short = 'i', long = "input")]
    pub input: PathBuf,

    /// Output BAM file
    #[arg(short = 'o', long = "output")]
    pub output: PathBuf,
}

impl BamIoOptions {
    /// Validate that the input exists and the paths are distinct.
    ///
    /// # Errors
    ///
    /// Returns an error if the input BAM is missing or equals the output.
    pub fn validate(&self) -> Result<()> {
        validate_file_exists(&self.input, "Input BAM")?;
        if self.input == self.output {
            bail!("Input and output BAM paths must differ");
        }
        Ok(())
    }
}

/// Worker threading options.
#[derive(Debug, Clone, Args)]
pub struct ThreadingOptions {
    /// Number of worker threads (default: available parallelism)
    #[arg(short = 't', long = "threads")]
    pub threads: Option<usize>,
}

impl ThreadingOptions {
    /// The effective worker count, always at least one.
    #[must_use]
    pub fn num_threads(&self) -> usize {
        self.threads
            .unwrap_or_else(|| std::thread::available_parallelism().map_or(1, usize::from))
            .max(1)
    }

    /// Capacity for the pipeline's bounded queues: twice the worker count.
    #[must_use]
    pub fn queue_capacity(&self) -> usize {
        self.num_threads() * 2
    }
}

/// Alignment quality filtering options.
#[derive(Debug, Clone, Args)]
pub struct FilterOptions {
    /// Minimum reference span (bases) for an alignment to be kept
    #[arg(long = "min-length", default_value_t = 50)]
    pub min_length: i64,

    /// Minimum alignment concordance, between 0 and 1
    #[arg(long = "min-concordance", default_value_t = 0.75)]
    pub min_concordance: f64,
}

impl FilterOptions {
    /// Build the filter, validating the thresholds.
    ///
    /// # Errors
    ///
    /// Returns an error if either threshold is out of range.
    pub fn to_filter(&self) -> Result<AlignmentFilter> {
        Ok(AlignmentFilter::new(self.min_length, self.min_concordance)?)
    }
}
