//! Output header construction: reference dictionary and @PG provenance.

use anyhow::Result;
use bstr::BString;
use noodles::sam::header::record::value::map::program::tag;
use noodles::sam::header::record::value::map::{Map, Program, ReferenceSequence};
use noodles::sam::Header;
use std::num::NonZeroUsize;

/// Program name recorded in @PG entries.
const PROGRAM_NAME: &str = "fgalign";

/// Replace the header's reference dictionary with the given sequences.
///
/// Alignment records index into this dictionary by position, so `sequences`
/// must be in the aligner's contig order.
///
/// # Errors
///
/// Returns an error if any sequence has zero length.
pub fn set_reference_dictionary(
    header: &mut Header,
    sequences: &[(BString, usize)],
) -> Result<()> {
    let reference_sequences = header.reference_sequences_mut();
    reference_sequences.clear();
    for (name, length) in sequences {
        let length = NonZeroUsize::try_from(*length)
            .map_err(|_| anyhow::anyhow!("Reference sequence '{name}' has zero length"))?;
        reference_sequences.insert(name.clone(), Map::<ReferenceSequence>::new(length));
    }
    Ok(())
}

fn last_program_id(header: &Header) -> Option<String> {
    header
        .programs()
        .as_ref()
        .keys()
        .last()
        .map(|id| String::from_utf8_lossy(id).into_owned())
}

fn unique_program_id(header: &Header) -> String {
    let programs = header.programs().as_ref();
    if !programs.contains_key(&BString::from(PROGRAM_NAME)) {
        return PROGRAM_NAME.to_string();
    }
    let mut suffix = 1;
    loop {
        let candidate = format!("{PROGRAM_NAME}.{suffix}");
        if !programs.contains_key(&BString::from(candidate.as_str())) {
            return candidate;
        }
        suffix += 1;
    }
}

/// Add a @PG record with automatic PP chaining to the previous program.
///
/// # Errors
///
/// Returns an error if the program record cannot be added to the header.
pub fn add_pg_record(mut header: Header, version: &str, command_line: &str) -> Result<Header> {
    let previous_program = last_program_id(&header);
    let id = unique_program_id(&header);

    let mut builder = Map::<Program>::builder()
        .insert(tag::NAME, PROGRAM_NAME)
        .insert(tag::VERSION, version)
        .insert(tag::COMMAND_LINE, command_line);
    if let Some(pp) = &previous_program {
        builder = builder.insert(tag::PREVIOUS_PROGRAM_ID, pp.as_str());
    }
    let record = builder.build()?;

    header.programs_mut().add(BString::from(id), record)?;
    Ok(header)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_reference_dictionary_replaces_existing() {
        let mut header = Header::default();
        let sequences =
            vec![(BString::from("chr1"), 1000usize), (BString::from("chr2"), 500usize)];
        set_reference_dictionary(&mut header, &sequences).unwrap();

        let dict = header.reference_sequences();
        assert_eq!(dict.len(), 2);
        let names: Vec<_> = dict.keys().collect();
        assert_eq!(names, vec![&BString::from("chr1"), &BString::from("chr2")]);
    }

    #[test]
    fn test_zero_length_sequence_is_rejected() {
        let mut header = Header::default();
        let sequences = vec![(BString::from("empty"), 0usize)];
        assert!(set_reference_dictionary(&mut header, &sequences).is_err());
    }

    #[test]
    fn test_add_pg_record_to_empty_header() {
        let header = add_pg_record(Header::default(), "0.1.0", "fgalign align -i in.bam").unwrap();
        let programs = header.programs().as_ref();
        assert_eq!(programs.len(), 1);
        assert!(programs.contains_key(&BString::from("fgalign")));
    }

    #[test]
    fn test_add_pg_record_chains_to_previous() {
        let mut header = Header::default();
        header
            .programs_mut()
            .add(BString::from("bwa"), Map::<Program>::default())
            .unwrap();
        let header = add_pg_record(header, "0.1.0", "fgalign align").unwrap();

        let programs = header.programs().as_ref();
        let record = programs.get(&BString::from("fgalign")).unwrap();
        let pp = record.other_fields().get(&tag::PREVIOUS_PROGRAM_ID).unwrap();
        assert_eq!(pp, &BString::from("bwa"));
    }

    #[test]
    fn test_repeated_runs_get_unique_ids() {
        let header = add_pg_record(Header::default(), "0.1.0", "run1").unwrap();
        let header = add_pg_record(header, "0.1.0", "run2").unwrap();
        let programs = header.programs().as_ref();
        assert!(programs.contains_key(&BString::from("fgalign")));
        assert!(programs.contains_key(&BString::from("fgalign.1")));
    }
}
