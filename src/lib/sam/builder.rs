//! Fluent builder for synthetic SAM records.
//!
//! Intended for tests and simulations that need `RecordBuf` values without
//! hand-assembling every field.
//!
//! # Example
//!
//! ```
//! use fgalign_lib::sam::builder::RecordBuilder;
//!
//! let record = RecordBuilder::new()
//!     .name("read1")
//!     .sequence("ACGTACGTAC")
//!     .reference_sequence_id(0)
//!     .alignment_start(100)
//!     .cigar("10M")
//!     .nm(1)
//!     .build();
//! ```

use crate::sam::nm_tag;
use noodles::core::Position;
use noodles::sam::alignment::record::cigar::op::{Kind, Op};
use noodles::sam::alignment::record::data::field::Tag;
use noodles::sam::alignment::record::{Flags, MappingQuality};
use noodles::sam::alignment::record_buf::data::field::Value;
use noodles::sam::alignment::record_buf::{QualityScores, RecordBuf, Sequence};

/// Parse a CIGAR string into operations.
///
/// # Panics
///
/// Panics on malformed input; this is test support, not a production parser.
#[must_use]
pub fn parse_cigar(cigar: &str) -> Vec<Op> {
    let mut ops = Vec::new();
    let mut len = 0usize;
    for c in cigar.chars() {
        if let Some(digit) = c.to_digit(10) {
            len = len * 10 + digit as usize;
        } else {
            let kind = match c {
                'M' => Kind::Match,
                'I' => Kind::Insertion,
                'D' => Kind::Deletion,
                'N' => Kind::Skip,
                'S' => Kind::SoftClip,
                'H' => Kind::HardClip,
                'P' => Kind::Pad,
                '=' => Kind::SequenceMatch,
                'X' => Kind::SequenceMismatch,
                _ => panic!("unknown CIGAR operation: {c}"),
            };
            assert!(len > 0, "CIGAR operation without a length: {cigar}");
            ops.push(Op::new(kind, len));
            len = 0;
        }
    }
    ops
}

/// Builder for a single synthetic record.
///
/// Records start unmapped; setting an alignment start marks them mapped.
#[derive(Default)]
pub struct RecordBuilder {
    name: Option<String>,
    sequence: Vec<u8>,
    reference_sequence_id: Option<usize>,
    alignment_start: Option<usize>,
    mapping_quality: Option<u8>,
    cigar: Option<String>,
    tags: Vec<(Tag, Value)>,
}

impl RecordBuilder {
    /// Create a builder for an unmapped, unnamed record.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the read name.
    #[must_use]
    pub fn name(mut self, name: &str) -> Self {
        self.name = Some(name.to_string());
        self
    }

    /// Set the read bases.
    #[must_use]
    pub fn sequence(mut self, sequence: &str) -> Self {
        self.sequence = sequence.as_bytes().to_vec();
        self
    }

    /// Set the reference sequence index.
    #[must_use]
    pub fn reference_sequence_id(mut self, id: usize) -> Self {
        self.reference_sequence_id = Some(id);
        self
    }

    /// Set the 1-based alignment start and mark the record mapped.
    #[must_use]
    pub fn alignment_start(mut self, start: usize) -> Self {
        self.alignment_start = Some(start);
        self
    }

    /// Set the mapping quality.
    #[must_use]
    pub fn mapping_quality(mut self, mapq: u8) -> Self {
        self.mapping_quality = Some(mapq);
        self
    }

    /// Set the CIGAR string.
    #[must_use]
    pub fn cigar(mut self, cigar: &str) -> Self {
        self.cigar = Some(cigar.to_string());
        self
    }

    /// Add an NM (edit distance) tag.
    #[must_use]
    pub fn nm(mut self, nm: i32) -> Self {
        self.tags.push((nm_tag(), Value::from(nm)));
        self
    }

    /// Add an arbitrary data tag.
    #[must_use]
    pub fn tag<V: Into<Value>>(mut self, tag: Tag, value: V) -> Self {
        self.tags.push((tag, value.into()));
        self
    }

    /// Build the `RecordBuf`.
    ///
    /// # Panics
    ///
    /// Panics on an invalid CIGAR, a zero alignment start, or an invalid
    /// mapping quality.
    #[must_use]
    pub fn build(self) -> RecordBuf {
        let mut record = RecordBuf::default();

        if let Some(name) = self.name {
            *record.name_mut() = Some(name.into());
        }

        let mut flags = Flags::UNMAPPED;
        if let Some(start) = self.alignment_start {
            flags.remove(Flags::UNMAPPED);
            *record.alignment_start_mut() =
                Some(Position::try_from(start).expect("alignment_start must be >= 1"));
        }
        *record.flags_mut() = flags;

        if let Some(ref_id) = self.reference_sequence_id {
            *record.reference_sequence_id_mut() = Some(ref_id);
        }

        if let Some(mapq) = self.mapping_quality {
            *record.mapping_quality_mut() = Some(
                MappingQuality::try_from(mapq).expect("mapping_quality must be valid"),
            );
        }

        if let Some(cigar) = self.cigar {
            *record.cigar_mut() = parse_cigar(&cigar).into_iter().collect();
        }

        if !self.sequence.is_empty() {
            let qualities = vec![30u8; self.sequence.len()];
            *record.quality_scores_mut() = QualityScores::from(qualities);
            *record.sequence_mut() = Sequence::from(self.sequence);
        }

        for (tag, value) in self.tags {
            record.data_mut().insert(tag, value);
        }

        record
    }
}
