//! BAM file I/O helpers.
//!
//! Thin construction helpers for `noodles` BAM readers and writers with
//! consistent error context. The pipeline's sink thread is the only owner of
//! a writer while a run is in progress.

use anyhow::{Context, Result};
use noodles::bam;
use noodles::bgzf;
use noodles::sam::Header;
use std::fs::File;
use std::path::Path;

/// A BAM reader over a BGZF-compressed file.
pub type BamReader = bam::io::Reader<bgzf::io::Reader<File>>;

/// A BAM writer over a BGZF-compressed file.
pub type BamWriter = bam::io::Writer<bgzf::io::Writer<File>>;

/// Open a BAM file and read its header.
///
/// # Errors
///
/// Returns an error if the file cannot be opened or its header is invalid.
pub fn create_bam_reader<P: AsRef<Path>>(path: P) -> Result<(BamReader, Header)> {
    let path = path.as_ref();
    let file = File::open(path)
        .with_context(|| format!("Failed to open input BAM: {}", path.display()))?;
    let mut reader = bam::io::Reader::new(file);
    let header = reader
        .read_header()
        .with_context(|| format!("Failed to read BAM header: {}", path.display()))?;
    Ok((reader, header))
}

/// Create a BAM file and write `header` to it.
///
/// # Errors
///
/// Returns an error if the file cannot be created or the header written.
pub fn create_bam_writer<P: AsRef<Path>>(path: P, header: &Header) -> Result<BamWriter> {
    let path = path.as_ref();
    let file = File::create(path)
        .with_context(|| format!("Failed to create output BAM: {}", path.display()))?;
    let mut writer = bam::io::Writer::new(file);
    writer
        .write_header(header)
        .with_context(|| format!("Failed to write BAM header: {}", path.display()))?;
    Ok(writer)
}

/// Flush a writer and append the BGZF end-of-file marker.
///
/// # Errors
///
/// Returns an error if the final blocks cannot be written.
pub fn finish_bam_writer(writer: BamWriter) -> Result<()> {
    writer.into_inner().finish().context("Failed to finish output BAM")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sam::builder::RecordBuilder;
    use noodles::sam::alignment::io::Write as _;
    use tempfile::TempDir;

    #[test]
    fn test_round_trip_header_and_records() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("test.bam");
        let header = Header::default();

        let mut writer = create_bam_writer(&path, &header).unwrap();
        let record = RecordBuilder::new().name("read1").sequence("ACGTACGT").build();
        writer.write_alignment_record(&header, &record).unwrap();
        finish_bam_writer(writer).unwrap();

        let (mut reader, read_header) = create_bam_reader(&path).unwrap();
        assert_eq!(read_header, header);
        let records: Vec<_> =
            reader.record_bufs(&read_header).collect::<std::io::Result<_>>().unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].sequence().as_ref(), b"ACGTACGT");
    }

    #[test]
    fn test_missing_input_reports_path() {
        let err = match create_bam_reader("/nonexistent/input.bam") {
            Err(e) => e,
            Ok(_) => panic!("expected missing input to fail"),
        };
        assert!(format!("{err:#}").contains("/nonexistent/input.bam"));
    }
}
