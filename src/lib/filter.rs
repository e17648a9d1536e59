//! Quality filtering of candidate alignments.
//!
//! Workers apply an [`AlignmentFilter`] to every candidate record produced by
//! the alignment transform. Records failing the filter are dropped from the
//! result set, never reported as errors.

use crate::errors::{FgalignError, Result};

/// Minimal view of an alignment needed for filtering and summary statistics.
///
/// `reference_span` is the number of reference bases the alignment covers
/// (reference end minus reference start); `edit_errors` is the combined count
/// of deleted, inserted, and mismatching bases.
pub trait AlignmentMetrics {
    /// Reference bases covered by the alignment. Zero or negative means the
    /// record is not usefully aligned.
    fn reference_span(&self) -> i64;

    /// Deletions + insertions + mismatches for the alignment.
    fn edit_errors(&self) -> i64;

    /// Fraction of the reference span free of edit errors, in `[0, 1]` for
    /// any sane alignment. Zero when the span is not positive.
    fn similarity(&self) -> f64 {
        let span = self.reference_span();
        if span <= 0 {
            return 0.0;
        }
        1.0 - self.edit_errors() as f64 / span as f64
    }
}

/// Predicate deciding which candidate alignments survive into the output.
#[derive(Debug, Clone, Copy)]
pub struct AlignmentFilter {
    min_span: i64,
    min_similarity: f64,
}

impl AlignmentFilter {
    /// Create a filter with the given span and similarity thresholds.
    ///
    /// # Errors
    ///
    /// Returns an error if `min_similarity` is outside `[0, 1]` or not
    /// finite, or if `min_span` is negative.
    pub fn new(min_span: i64, min_similarity: f64) -> Result<Self> {
        if min_span < 0 {
            return Err(FgalignError::InvalidParameter {
                parameter: "min-length".to_string(),
                reason: format!("must be non-negative, got {min_span}"),
            });
        }
        if !min_similarity.is_finite() || !(0.0..=1.0).contains(&min_similarity) {
            return Err(FgalignError::InvalidParameter {
                parameter: "min-concordance".to_string(),
                reason: format!("must be between 0 and 1, got {min_similarity}"),
            });
        }
        Ok(Self { min_span, min_similarity })
    }

    /// Whether `alignment` survives both the span and similarity checks.
    pub fn passes(&self, alignment: &impl AlignmentMetrics) -> bool {
        let span = alignment.reference_span();
        if span <= 0 || span < self.min_span {
            return false;
        }
        alignment.similarity() >= self.min_similarity
    }

    /// The configured minimum reference span.
    #[must_use]
    pub fn min_span(&self) -> i64 {
        self.min_span
    }

    /// The configured minimum similarity.
    #[must_use]
    pub fn min_similarity(&self) -> f64 {
        self.min_similarity
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
    fn test_rejects_non_positive_span() {
        let filter = AlignmentFilter::new(0, 0.0).unwrap();
        assert!(!filter.passes(&TestAlignment { span: 0, errors: 0 }));
        assert!(!filter.passes(&TestAlignment { span: -10, errors: 0 }));
    }

    #[test]
    fn test_rejects_span_below_threshold() {
        let filter = AlignmentFilter::new(50, 0.0).unwrap();
        assert!(!filter.passes(&TestAlignment { span: 49, errors: 0 }));
        assert!(filter.passes(&TestAlignment { span: 50, errors: 0 }));
    }

    #[test]
    fn test_rejects_similarity_below_threshold() {
        let filter = AlignmentFilter::new(0, 0.9).unwrap();
        // 1 - 15/100 = 0.85
        assert!(!filter.passes(&TestAlignment { span: 100, errors: 15 }));
        // 1 - 10/100 = 0.90, equal to the threshold so it survives
        assert!(filter.passes(&TestAlignment { span: 100, errors: 10 }));
    }

    #[test]
    fn test_passing_alignment_is_included() {
        let filter = AlignmentFilter::new(50, 0.75).unwrap();
        assert!(filter.passes(&TestAlignment { span: 100, errors: 5 }));
    }

    #[test]
    fn test_similarity_of_non_positive_span_is_zero() {
        assert_eq!(TestAlignment { span: 0, errors: 0 }.similarity(), 0.0);
        assert_eq!(TestAlignment { span: -5, errors: 2 }.similarity(), 0.0);
    }

    #[test]
    fn test_invalid_thresholds_are_rejected() {
        assert!(AlignmentFilter::new(-1, 0.5).is_err());
        assert!(AlignmentFilter::new(0, -0.1).is_err());
        assert!(AlignmentFilter::new(0, 1.5).is_err());
        assert!(AlignmentFilter::new(0, f64::NAN).is_err());
    }
}
