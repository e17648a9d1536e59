//! Alignment transform collaborators.
//!
//! The pipeline treats alignment as an opaque capability: a [`BatchAligner`]
//! consumes a batch of reads and returns the records that aligned and passed
//! the quality filter. Implementations must be re-entrant; the worker pool
//! calls [`BatchAligner::align_batch`] concurrently from several threads with
//! only a shared reference.
//!
//! [`SeedAligner`] is the built-in implementation: an ungapped seed-and-verify
//! aligner over an in-memory FASTA reference. It is deliberately simple
//! (exact k-mer seed at the start of the read, mismatch-counted extension,
//! no indels) but produces complete records with positions, CIGARs, and NM
//! tags, which is all the downstream filter and summary need.

use crate::errors::FgalignError;
use crate::filter::AlignmentFilter;
use crate::sam::nm_tag;
use anyhow::{bail, Context, Result};
use bstr::BString;
use log::{debug, info};
use noodles::core::Position;
use noodles::fasta;
use noodles::sam::alignment::record::cigar::op::{Kind, Op};
use noodles::sam::alignment::record::{Flags, MappingQuality};
use noodles::sam::alignment::record_buf::data::field::Value;
use noodles::sam::alignment::record_buf::RecordBuf;
use std::collections::HashMap;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// Aligns one batch of reads, applying the quality filter to every candidate.
///
/// Reads that fail to align or fail the filter are dropped from the result,
/// never reported as errors.
pub trait BatchAligner: Send + Sync {
    /// Align all reads in `records`, returning the surviving alignments.
    ///
    /// # Errors
    ///
    /// Returns an error only for fatal conditions; an unalignable read is not
    /// an error.
    fn align_batch(
        &self,
        records: &[RecordBuf],
        filter: &AlignmentFilter,
    ) -> Result<Vec<RecordBuf>>;
}

/// Default seed length for [`SeedAligner`].
pub const DEFAULT_SEED_LENGTH: usize = 21;

struct ReferenceContig {
    name: BString,
    bases: Vec<u8>,
}

#[derive(Clone, Copy)]
struct Hit {
    contig: usize,
    start: usize,
    mismatches: i64,
    unique: bool,
}

/// Ungapped seed-and-verify aligner over an in-memory reference.
///
/// The index maps every 2-bit-encodable k-mer in the reference to its
/// occurrences. A read is seeded by its first k bases, each seed hit is
/// verified by counting mismatches over the full read length, and the hit
/// with the fewest mismatches wins. Ties map with mapping quality zero.
pub struct SeedAligner {
    contigs: Vec<ReferenceContig>,
    seeds: HashMap<u64, Vec<(u32, u32)>>,
    seed_length: usize,
}

impl SeedAligner {
    /// Load a FASTA reference and index it with the default seed length.
    ///
    /// # Errors
    ///
    /// Returns an error if the FASTA cannot be read or contains no sequences.
    pub fn from_fasta<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::with_seed_length(path, DEFAULT_SEED_LENGTH)
    }

    /// Load a FASTA reference and index it with the given seed length.
    ///
    /// # Errors
    ///
    /// Returns an error if `seed_length` is not in `1..=31`, if the FASTA
    /// cannot be read, or if it contains no sequences.
    pub fn with_seed_length<P: AsRef<Path>>(path: P, seed_length: usize) -> Result<Self> {
        if seed_length == 0 || seed_length > 31 {
            bail!(FgalignError::InvalidParameter {
                parameter: "seed-length".to_string(),
                reason: format!("must be between 1 and 31, got {seed_length}"),
            });
        }

        let path = path.as_ref();
        let file = File::open(path)
            .with_context(|| format!("Failed to open reference FASTA: {}", path.display()))?;
        let mut reader = fasta::io::Reader::new(BufReader::new(file));

        let mut contigs = Vec::new();
        for result in reader.records() {
            let record = result.context("Failed to read FASTA record")?;
            let name = BString::from(record.name().to_vec());
            let bases: Vec<u8> =
                record.sequence().as_ref().iter().map(|&b| b.to_ascii_uppercase()).collect();
            contigs.push(ReferenceContig { name, bases });
        }
        if contigs.is_empty() {
            bail!(FgalignError::InvalidFileFormat {
                file_type: "FASTA".to_string(),
                path: path.display().to_string(),
                reason: "no sequences found".to_string(),
            });
        }

        let mut seeds: HashMap<u64, Vec<(u32, u32)>> = HashMap::new();
        for (contig_index, contig) in contigs.iter().enumerate() {
            if contig.bases.len() < seed_length {
                continue;
            }
            for start in 0..=(contig.bases.len() - seed_length) {
                // Windows containing ambiguous bases are not seedable.
                if let Some(code) = encode_kmer(&contig.bases[start..start + seed_length]) {
                    seeds.entry(code).or_default().push((contig_index as u32, start as u32));
                }
            }
        }

        info!(
            "Indexed {} reference sequence(s), {} distinct seed(s) of length {}",
            contigs.len(),
            seeds.len(),
            seed_length
        );
        Ok(Self { contigs, seeds, seed_length })
    }

    /// Names and lengths of the reference sequences, in index order.
    ///
    /// Alignment records refer to these by position, so the output header's
    /// reference dictionary must be built from this exact ordering.
    #[must_use]
    pub fn reference_dictionary(&self) -> Vec<(BString, usize)> {
        self.contigs.iter().map(|c| (c.name.clone(), c.bases.len())).collect()
    }

    fn align_read(&self, bases: &[u8]) -> Option<Hit> {
        if bases.len() < self.seed_length {
            return None;
        }
        let seed: Vec<u8> = bases[..self.seed_length].to_ascii_uppercase();
        let hits = self.seeds.get(&encode_kmer(&seed)?)?;

        let mut best: Option<Hit> = None;
        for &(contig_index, seed_start) in hits {
            let reference = &self.contigs[contig_index as usize].bases;
            let start = seed_start as usize;
            if start + bases.len() > reference.len() {
                continue;
            }
            let mismatches = bases
                .iter()
                .zip(&reference[start..start + bases.len()])
                .filter(|(a, b)| !a.eq_ignore_ascii_case(b))
                .count() as i64;
            match &mut best {
                Some(b) if mismatches > b.mismatches => {}
                // A tie keeps the first-seen position but loses uniqueness.
                Some(b) if mismatches == b.mismatches => b.unique = false,
                _ => {
                    best =
                        Some(Hit { contig: contig_index as usize, start, mismatches, unique: true });
                }
            }
        }

        if let Some(hit) = best {
            if !hit.unique {
                debug!("read maps equally well to multiple positions");
            }
        }
        best
    }
}

impl BatchAligner for SeedAligner {
    fn align_batch(
        &self,
        records: &[RecordBuf],
        filter: &AlignmentFilter,
    ) -> Result<Vec<RecordBuf>> {
        let mut out = Vec::with_capacity(records.len());
        for record in records {
            let bases: Vec<u8> = record.sequence().as_ref().to_vec();
            let Some(hit) = self.align_read(&bases) else { continue };

            let mut aligned = record.clone();
            aligned.flags_mut().remove(Flags::UNMAPPED);
            *aligned.reference_sequence_id_mut() = Some(hit.contig);
            *aligned.alignment_start_mut() =
                Some(Position::try_from(hit.start + 1).context("Invalid alignment start")?);
            // Reads tied across positions keep their first-seen placement
            // but are flagged with mapping quality zero.
            let mapq = if hit.unique { 60 } else { 0 };
            *aligned.mapping_quality_mut() = MappingQuality::try_from(mapq).ok();
            *aligned.cigar_mut() = [Op::new(Kind::Match, bases.len())].into_iter().collect();
            aligned.data_mut().insert(nm_tag(), Value::from(hit.mismatches as i32));

            if filter.passes(&aligned) {
                out.push(aligned);
            }
        }
        Ok(out)
    }
}

/// 2-bit encode a window of bases; `None` if any base is not ACGT.
fn encode_kmer(window: &[u8]) -> Option<u64> {
    let mut code = 0u64;
    for &base in window {
        let bits = match base {
            b'A' => 0,
            b'C' => 1,
            b'G' => 2,
            b'T' => 3,
            _ => return None,
        };
        code = (code << 2) | bits;
    }
    Some(code)
}
