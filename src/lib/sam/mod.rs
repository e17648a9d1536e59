//! SAM record utilities.
//!
//! Extracts the reference span and edit-error counts the pipeline's filter
//! and summary need from `noodles` [`RecordBuf`] values.

use crate::filter::AlignmentMetrics;
use noodles::sam::alignment::record::cigar::op::Kind;
use noodles::sam::alignment::record::data::field::Tag;
use noodles::sam::alignment::record_buf::RecordBuf;

pub mod builder;

/// The NM tag (edit distance to the reference).
#[must_use]
pub fn nm_tag() -> Tag {
    Tag::from([b'N', b'M'])
}

/// Number of reference bases consumed by the record's CIGAR.
///
/// Zero for unmapped records or records without a CIGAR, which the filter
/// treats as "not usefully aligned".
#[must_use]
pub fn reference_span(record: &RecordBuf) -> i64 {
    record
        .cigar()
        .as_ref()
        .iter()
        .map(|op| match op.kind() {
            Kind::Match
            | Kind::Deletion
            | Kind::Skip
            | Kind::SequenceMatch
            | Kind::SequenceMismatch => op.len() as i64,
            _ => 0,
        })
        .sum()
}

/// Deletions + insertions + mismatches for the record.
///
/// Uses the NM tag when present. Without NM, falls back to the indel and
/// explicit-mismatch operations in the CIGAR, which undercounts mismatches
/// hidden in `M` operations.
#[must_use]
pub fn edit_errors(record: &RecordBuf) -> i64 {
    if let Some(nm) = record.data().get(&nm_tag()).and_then(|value| value.as_int()) {
        return nm;
    }
    record
        .cigar()
        .as_ref()
        .iter()
        .map(|op| match op.kind() {
            Kind::Insertion | Kind::Deletion | Kind::SequenceMismatch => op.len() as i64,
            _ => 0,
        })
        .sum()
}

impl AlignmentMetrics for RecordBuf {
    fn reference_span(&self) -> i64 {
        reference_span(self)
    }

    fn edit_errors(&self) -> i64 {
        edit_errors(self)
    }
}
