//! Output records and the per-fragment annotation that produces them.
//!
//! Input records are never mutated. Each emitted line is a fresh [`OutputRecord`] built from an
//! input record plus the fragment's emission state: which read ends have a surviving alignment,
//! which ends have already been written, and the fragment's alignment multiplicity.

use std::fmt;

use noodles::sam::alignment::record::Flags;

use crate::category::Category;
use crate::dna::{reverse_complement, reverse_qualities};
use crate::errors::{FragmergeError, Result};
use crate::record::{AlignmentRecord, UNMAPPED_REFERENCE};

/// Optional field tag carrying the alignment multiplicity.
pub const MULTIPLICITY_TAG: &str = "NH";

/// Where an output record came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RecordOrigin {
    /// Projected from the interval-overlap input.
    Computed,
    /// Taken from the alignment input.
    Original,
    /// Synthesized unmapped record for a read end with no surviving alignment.
    Default,
    /// Copied unchanged after the interval-overlap input ended.
    PassThrough,
}

/// One finished SAM line.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OutputRecord {
    pub query_name: String,
    pub flags: Flags,
    pub reference_name: String,
    pub position: i64,
    pub mapping_quality: u8,
    pub cigar: String,
    pub mate_reference_name: String,
    pub mate_position: i64,
    pub template_length: i64,
    pub sequence: String,
    pub quality: String,
    pub fields: Vec<String>,
    pub origin: RecordOrigin,
}

impl OutputRecord {
    /// Copies a record as-is.
    #[must_use]
    pub fn pass_through(record: &AlignmentRecord) -> Self {
        Self {
            query_name: record.query_name.clone(),
            flags: record.flags,
            reference_name: record.reference_name.clone(),
            position: record.position,
            mapping_quality: record.mapping_quality,
            cigar: record.cigar_string(),
            mate_reference_name: record.mate_reference_name.clone(),
            mate_position: record.mate_position,
            template_length: record.template_length,
            sequence: record.sequence.clone(),
            quality: record.quality.clone(),
            fields: record.fields.clone(),
            origin: RecordOrigin::PassThrough,
        }
    }

    #[must_use]
    pub fn is_secondary(&self) -> bool {
        self.flags.is_secondary()
    }

    #[must_use]
    pub fn is_unmapped(&self) -> bool {
        self.flags.is_unmapped()
    }

    /// Value of the multiplicity field, if present.
    #[must_use]
    pub fn multiplicity(&self) -> Option<usize> {
        self.fields
            .iter()
            .find_map(|f| f.strip_prefix(MULTIPLICITY_TAG)?.strip_prefix(":i:")?.parse().ok())
    }
}

impl fmt::Display for OutputRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}",
            self.query_name,
            self.flags.bits(),
            self.reference_name,
            self.position,
            self.mapping_quality,
            self.cigar,
            self.mate_reference_name,
            self.mate_position,
            self.template_length,
            self.sequence,
            self.quality
        )?;
        for field in &self.fields {
            write!(f, "\t{field}")?;
        }
        Ok(())
    }
}

/// Emission state for one fragment.
#[derive(Debug)]
pub struct FragmentAnnotator<'a> {
    fragment_id: &'a str,
    paired_end: bool,
    multiplicity: usize,
    /// Read ends with a surviving alignment in a considered bucket.
    found: [bool; 2],
    /// Read ends already written.
    printed: [bool; 2],
}

impl<'a> FragmentAnnotator<'a> {
    #[must_use]
    pub fn new(
        fragment_id: &'a str,
        paired_end: bool,
        found: [bool; 2],
        multiplicity: usize,
    ) -> Self {
        Self { fragment_id, paired_end, multiplicity, found, printed: [false; 2] }
    }

    #[must_use]
    pub fn printed(&self) -> [bool; 2] {
        self.printed
    }

    /// Builds the output line for a surviving alignment.
    ///
    /// The first record written for a read end is primary and every later one is secondary. The
    /// mate columns are only filled in when the other end also has a surviving alignment.
    ///
    /// # Errors
    ///
    /// Returns [`FragmergeError::InconsistentPair`] if a full-pair record has a surviving mate
    /// but is itself flagged as having an unmapped mate.
    pub fn annotate(
        &mut self,
        record: &AlignmentRecord,
        category: Category,
        origin: RecordOrigin,
    ) -> Result<OutputRecord> {
        let end = end_of(record);
        let other = 1 - end;

        let mut flags = record.flags;
        flags.set(Flags::SECONDARY, self.printed[end]);

        let (mate_reference_name, mate_position) = if self.paired_end && self.found[other] {
            if record.mate_is_mapped() {
                (mate_reference_for_output(record), record.mate_position)
            } else if category == Category::PairedOrAll {
                return Err(FragmergeError::InconsistentPair {
                    fragment_id: self.fragment_id.to_string(),
                    reason: format!(
                        "read {} at {}:{} has a surviving mate but is flagged mate-unmapped",
                        record.read_index, record.reference_name, record.position
                    ),
                });
            } else {
                (UNMAPPED_REFERENCE.to_string(), 0)
            }
        } else {
            if record.is_paired() && record.mate_is_mapped() {
                flags.insert(Flags::MATE_UNMAPPED);
            }
            (UNMAPPED_REFERENCE.to_string(), 0)
        };
        self.printed[end] = true;

        Ok(OutputRecord {
            query_name: record.query_name.clone(),
            flags,
            reference_name: record.reference_name.clone(),
            position: record.position,
            mapping_quality: record.mapping_quality,
            cigar: record.cigar_string(),
            mate_reference_name,
            mate_position,
            template_length: record.template_length,
            sequence: record.sequence.clone(),
            quality: record.quality.clone(),
            fields: with_multiplicity(&record.fields, self.multiplicity),
            origin,
        })
    }

    /// True when read 1, or read 2 of a paired-end run, has not been written.
    #[must_use]
    pub fn needs_default(&self) -> bool {
        !self.printed[0] || (self.paired_end && !self.printed[1])
    }

    /// Synthesizes unmapped records for the read ends that have not been written.
    ///
    /// The source of each default record is the first record of that read end in the fragment's
    /// alignment group, whatever its mapping state. Nothing is produced when every required end
    /// has been written.
    ///
    /// # Errors
    ///
    /// Returns [`FragmergeError::MissingReadEnd`] if a required read end has no record at all.
    pub fn default_records(&mut self, group: &[AlignmentRecord]) -> Result<Vec<OutputRecord>> {
        if !self.needs_default() {
            return Ok(Vec::new());
        }

        let source = |read_index: u8| -> Result<&AlignmentRecord> {
            group.iter().find(|r| r.read_index == read_index).ok_or_else(|| {
                FragmergeError::MissingReadEnd {
                    fragment_id: self.fragment_id.to_string(),
                    read_index,
                }
            })
        };
        let first = source(1)?;
        let second = if self.paired_end { Some(source(2)?) } else { None };

        let mut records = Vec::with_capacity(2);
        if !self.printed[0] {
            records.push(unmapped_record(first, self.paired_end, self.printed[1]));
        }
        if let Some(second) = second {
            if !self.printed[1] {
                records.push(unmapped_record(second, self.paired_end, self.printed[0]));
            }
        }
        self.printed = [true, true];
        Ok(records)
    }
}

/// 0 for read 1 and unpaired reads, 1 for read 2.
fn end_of(record: &AlignmentRecord) -> usize {
    usize::from(record.read_index == 2)
}

fn mate_reference_for_output(record: &AlignmentRecord) -> String {
    let mate_reference = record.mate_reference();
    if mate_reference == record.reference_name && mate_reference != UNMAPPED_REFERENCE {
        "=".to_string()
    } else {
        mate_reference.to_string()
    }
}

/// Copies optional fields with the multiplicity field set to `multiplicity`, in place of any
/// existing one.
fn with_multiplicity(fields: &[String], multiplicity: usize) -> Vec<String> {
    let stamp = format!("{MULTIPLICITY_TAG}:i:{multiplicity}");
    let mut stamped = false;
    let mut out = Vec::with_capacity(fields.len() + 1);
    for field in fields {
        if field.split(':').next() == Some(MULTIPLICITY_TAG) {
            if !stamped {
                out.push(stamp.clone());
                stamped = true;
            }
        } else {
            out.push(field.clone());
        }
    }
    if !stamped {
        out.push(stamp);
    }
    out
}

/// An unmapped placeholder for one read end.
fn unmapped_record(source: &AlignmentRecord, paired_end: bool, mate_printed: bool) -> OutputRecord {
    let mut flags = Flags::UNMAPPED;
    if !(source.has_mate() && mate_printed) {
        flags.insert(Flags::MATE_UNMAPPED);
    }
    if paired_end {
        flags.insert(Flags::SEGMENTED);
        if source.read_index == 2 {
            flags.insert(Flags::LAST_SEGMENT);
        } else {
            flags.insert(Flags::FIRST_SEGMENT);
        }
    }

    let (sequence, quality) = if source.is_reverse() {
        (reverse_complement(&source.sequence), reverse_qualities(&source.quality))
    } else {
        (source.sequence.clone(), source.quality.clone())
    };

    OutputRecord {
        query_name: source.query_name.clone(),
        flags,
        reference_name: UNMAPPED_REFERENCE.to_string(),
        position: 0,
        mapping_quality: 0,
        cigar: UNMAPPED_REFERENCE.to_string(),
        mate_reference_name: UNMAPPED_REFERENCE.to_string(),
        mate_position: 0,
        template_length: 0,
        sequence,
        quality,
        fields: Vec::new(),
        origin: RecordOrigin::Default,
    }
}
