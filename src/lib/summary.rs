//! Running aggregate statistics over written alignments.
//!
//! [`RunningSummary`] is owned exclusively by the sink thread. No other
//! thread may read or update it while the pipeline runs; keeping that
//! ownership rule means the accumulator needs no lock.

use crate::filter::AlignmentMetrics;
use crate::logging::format_count;
use log::info;

/// Accumulator for count, aligned bases, and similarity of written records.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunningSummary {
    num_alignments: u64,
    num_bases: i64,
    similarity_sum: f64,
}

impl RunningSummary {
    /// Create an empty summary.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one written alignment into the summary.
    pub fn record(&mut self, alignment: &impl AlignmentMetrics) {
        self.num_alignments += 1;
        self.num_bases += alignment.reference_span();
        self.similarity_sum += alignment.similarity();
    }

    /// Number of alignments written.
    #[must_use]
    pub fn num_alignments(&self) -> u64 {
        self.num_alignments
    }

    /// Total reference bases covered by written alignments.
    #[must_use]
    pub fn num_bases(&self) -> i64 {
        self.num_bases
    }

    /// Mean concordance as a percentage rounded to one decimal place, or
    /// `None` when no alignments were written (the mean is undefined and must
    /// never surface as NaN).
    #[must_use]
    pub fn mean_concordance_percent(&self) -> Option<f64> {
        if self.num_alignments == 0 {
            return None;
        }
        Some((1000.0 * self.similarity_sum / self.num_alignments as f64).round() / 10.0)
    }

    /// Log the final statistics block.
    pub fn log(&self) {
        info!("=== Summary ===");
        info!("Alignments written: {}", format_count(self.num_alignments));
        info!("Aligned bases: {}", format_count(self.num_bases.max(0) as u64));
        match self.mean_concordance_percent() {
            Some(concordance) => info!("Mean concordance: {concordance}%"),
            None => info!("Mean concordance: no alignments"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct TestAlignment {
        span: i64,
        errors: i64,
    }

    impl AlignmentMetrics for TestAlignment {
        fn reference_span(&self) -> i64 {
            self.span
        }

        fn edit_errors(&self) -> i64 {
            self.errors
        }
    }

    #[test]
    fn test_known_synthetic_set() {
        let mut summary = RunningSummary::new();
        summary.record(&TestAlignment { span: 100, errors: 0 });
        summary.record(&TestAlignment { span: 50, errors: 5 });

        assert_eq!(summary.num_alignments(), 2);
        assert_eq!(summary.num_bases(), 150);
        // round(1000 * (1.0 + 0.9) / 2) / 10 = 95.0
        assert_eq!(summary.mean_concordance_percent(), Some(95.0));
    }

    #[test]
    fn test_empty_summary_has_no_mean() {
        let summary = RunningSummary::new();
        assert_eq!(summary.num_alignments(), 0);
        assert_eq!(summary.mean_concordance_percent(), None);
    }

    #[test]
    fn test_rounding_to_one_decimal() {
        let mut summary = RunningSummary::new();
        // similarity = 1 - 1/3 = 0.666..., mean concordance rounds to 66.7
        summary.record(&TestAlignment { span: 3, errors: 1 });
        assert_eq!(summary.mean_concordance_percent(), Some(66.7));
    }
}
