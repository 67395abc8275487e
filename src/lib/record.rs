//! Alignment records parsed from SAM text lines.
//!
//! Each line is read through the lazy [`noodles::sam::Record`], which decodes the typed columns
//! (flags, positions, mapping quality, CIGAR, template length) on access. The input is a
//! headerless SAM body mixing genome, transcript and junction references, so references are kept
//! by name. SEQ, QUAL and the optional fields are copied verbatim because they are written back
//! unchanged.
//!
//! The fragment id of a record is its query name truncated at the first space with any `/1` or
//! `/2` suffix removed; the read index comes from that suffix or, when absent, from the flags.

use std::fmt;
use std::io;

use noodles::core::Position;
use noodles::sam::alignment::record::Flags;
use noodles::sam::alignment::record::cigar::Op;
use noodles::sam::alignment::record::cigar::op::Kind;
use noodles::sam::record::Cigar;

use crate::errors::{FragmergeError, Result};

/// Reference name used by SAM for unmapped records and absent mates.
pub const UNMAPPED_REFERENCE: &str = "*";

/// Name of the alignment input in diagnostics.
pub const ALIGNMENT_SOURCE: &str = "alignment";

/// Number of mandatory SAM columns.
const MANDATORY_COLUMNS: usize = 11;

/// MAPQ written when the mapping quality is unavailable.
const MISSING_MAPPING_QUALITY: u8 = 255;

/// Value-based identity of an alignment record within a fragment.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RecordKey {
    pub fragment_id: String,
    pub read_index: u8,
    pub reference_name: String,
    pub position: i64,
}

/// One SAM line for one read of one fragment.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AlignmentRecord {
    /// QNAME exactly as read.
    pub query_name: String,
    /// Fragment-level key derived from the query name.
    pub fragment_id: String,
    /// 1 or 2.
    pub read_index: u8,
    pub flags: Flags,
    pub reference_name: String,
    /// 1-based position, 0 when unmapped.
    pub position: i64,
    pub mapping_quality: u8,
    /// Empty when the CIGAR is `*`.
    pub cigar: Vec<Op>,
    /// RNEXT as read (`=` is kept, see [`AlignmentRecord::mate_reference`]).
    pub mate_reference_name: String,
    pub mate_position: i64,
    pub template_length: i64,
    pub sequence: String,
    pub quality: String,
    /// Optional `TAG:TYPE:VALUE` fields in input order.
    pub fields: Vec<String>,
}

impl AlignmentRecord {
    /// Parses one tab-separated SAM line.
    ///
    /// # Errors
    ///
    /// Returns [`FragmergeError::MalformedLine`] if a mandatory column is missing or unparsable,
    /// or if the read index encoded in the query name contradicts the flags.
    pub fn parse(line: &str, line_number: u64) -> Result<Self> {
        let malformed = |reason: String| {
            FragmergeError::malformed(ALIGNMENT_SOURCE, line_number, line, reason)
        };
        let invalid =
            |column: &str, error: io::Error| malformed(format!("invalid {column}: {error}"));

        let columns: Vec<&str> = line.split('\t').collect();
        if columns.len() < MANDATORY_COLUMNS {
            return Err(malformed(format!(
                "expected at least {MANDATORY_COLUMNS} columns, found {}",
                columns.len()
            )));
        }

        let record = noodles::sam::Record::try_from(line.as_bytes())
            .map_err(|e| invalid("SAM record", e))?;
        let flags = record.flags().map_err(|e| invalid("flag", e))?;
        let position =
            position_or_zero(record.alignment_start()).map_err(|e| invalid("position", e))?;
        let mapping_quality = record
            .mapping_quality()
            .transpose()
            .map_err(|e| invalid("mapping quality", e))?
            .map_or(MISSING_MAPPING_QUALITY, |mapping_quality| mapping_quality.get());
        let cigar = parse_cigar(columns[5]).map_err(|e| invalid("CIGAR", e))?;
        let mate_position = position_or_zero(record.mate_alignment_start())
            .map_err(|e| invalid("mate position", e))?;
        let template_length =
            i64::from(record.template_length().map_err(|e| invalid("template length", e))?);

        let query_name =
            record.name().map_or_else(|| UNMAPPED_REFERENCE.to_string(), |name| name.to_string());
        let reference_name = record
            .reference_sequence_name()
            .map_or_else(|| UNMAPPED_REFERENCE.to_string(), |name| name.to_string());
        let mate_reference_name = record
            .mate_reference_sequence_name()
            .map_or_else(|| UNMAPPED_REFERENCE.to_string(), |name| name.to_string());

        let (fragment_id, name_index) = split_query_name(&query_name);
        let flag_index = read_index_from_flags(flags);
        let read_index = match (name_index, flag_index) {
            (Some(from_name), Some(from_flags)) if from_name != from_flags => {
                return Err(malformed(format!(
                    "query name suffix says read {from_name} but flags say read {from_flags}"
                )));
            }
            (Some(index), _) | (None, Some(index)) => index,
            (None, None) => 1,
        };
        let fragment_id = fragment_id.to_string();

        Ok(Self {
            query_name,
            fragment_id,
            read_index,
            flags,
            reference_name,
            position,
            mapping_quality,
            cigar,
            mate_reference_name,
            mate_position,
            template_length,
            sequence: columns[9].to_string(),
            quality: columns[10].to_string(),
            fields: columns[MANDATORY_COLUMNS..].iter().map(|f| (*f).to_string()).collect(),
        })
    }

    /// True when the record has a position and the unmapped flag is clear.
    #[must_use]
    pub fn is_mapped(&self) -> bool {
        self.position > 0 && !self.flags.is_unmapped()
    }

    /// True when the mate-unmapped flag is clear.
    #[must_use]
    pub fn mate_is_mapped(&self) -> bool {
        !self.flags.is_mate_unmapped()
    }

    /// True when the read was sequenced as part of a pair.
    #[must_use]
    pub fn is_paired(&self) -> bool {
        self.flags.is_segmented()
    }

    #[must_use]
    pub fn is_first_read(&self) -> bool {
        self.is_paired() && self.flags.is_first_segment()
    }

    #[must_use]
    pub fn is_second_read(&self) -> bool {
        self.is_paired() && self.flags.is_last_segment()
    }

    /// True when the record is paired and flagged as properly paired.
    #[must_use]
    pub fn has_mate(&self) -> bool {
        self.is_paired() && self.flags.is_properly_segmented()
    }

    #[must_use]
    pub fn is_reverse(&self) -> bool {
        self.flags.is_reverse_complemented()
    }

    /// Mate reference with `=` resolved to this record's reference.
    #[must_use]
    pub fn mate_reference(&self) -> &str {
        if self.mate_reference_name == "=" {
            &self.reference_name
        } else {
            &self.mate_reference_name
        }
    }

    /// Last reference position covered by the alignment (1-based, inclusive).
    #[must_use]
    pub fn alignment_end(&self) -> i64 {
        let reference_length: usize = self
            .cigar
            .iter()
            .filter(|op| op.kind().consumes_reference())
            .map(|op| op.len())
            .sum();
        if reference_length == 0 {
            self.position
        } else {
            self.position + reference_length as i64 - 1
        }
    }

    /// Number of reference bases between alignment start and end.
    #[must_use]
    pub fn span_length(&self) -> i64 {
        self.alignment_end() - self.position + 1
    }

    /// Length of the read: the sequence when present, otherwise what the CIGAR consumes.
    #[must_use]
    pub fn read_length(&self) -> usize {
        if self.sequence == UNMAPPED_REFERENCE {
            self.cigar.iter().filter(|op| op.kind().consumes_read()).map(|op| op.len()).sum()
        } else {
            self.sequence.len()
        }
    }

    /// Reference intervals covered by the alignment, split at skipped regions (`N`).
    #[must_use]
    pub fn aligned_blocks(&self) -> Vec<(i64, i64)> {
        let mut blocks = Vec::new();
        let mut cursor = self.position;
        let mut block_start: Option<i64> = None;
        for op in &self.cigar {
            let len = op.len() as i64;
            match op.kind() {
                Kind::Skip => {
                    if let Some(start) = block_start.take() {
                        blocks.push((start, cursor - 1));
                    }
                    cursor += len;
                }
                kind if kind.consumes_reference() => {
                    block_start.get_or_insert(cursor);
                    cursor += len;
                }
                _ => {}
            }
        }
        if let Some(start) = block_start {
            blocks.push((start, cursor - 1));
        }
        blocks
    }

    /// Value of the first optional field with the given two-letter tag.
    #[must_use]
    pub fn field(&self, tag: &str) -> Option<&str> {
        self.fields.iter().find_map(|field| {
            let (name, rest) = field.split_once(':')?;
            if name != tag {
                return None;
            }
            rest.split_once(':').map(|(_, value)| value)
        })
    }

    /// Hit index from an `HI:i` field.
    #[must_use]
    pub fn hit_index(&self) -> Option<i64> {
        self.field("HI").and_then(|value| value.parse().ok())
    }

    #[must_use]
    pub fn key(&self) -> RecordKey {
        RecordKey {
            fragment_id: self.fragment_id.clone(),
            read_index: self.read_index,
            reference_name: self.reference_name.clone(),
            position: self.position,
        }
    }

    #[must_use]
    pub fn cigar_string(&self) -> String {
        format_cigar(&self.cigar)
    }
}

impl fmt::Display for AlignmentRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}",
            self.query_name,
            self.flags.bits(),
            self.reference_name,
            self.position,
            self.mapping_quality,
            self.cigar_string(),
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

/// Splits a query name into the fragment id and the read index from a `/1` or `/2` suffix.
#[must_use]
pub fn split_query_name(query_name: &str) -> (&str, Option<u8>) {
    let name = query_name.split(' ').next().unwrap_or(query_name);
    if let Some(stripped) = name.strip_suffix("/1") {
        (stripped, Some(1))
    } else if let Some(stripped) = name.strip_suffix("/2") {
        (stripped, Some(2))
    } else {
        (name, None)
    }
}

fn read_index_from_flags(flags: Flags) -> Option<u8> {
    if !flags.is_segmented() {
        None
    } else if flags.is_first_segment() {
        Some(1)
    } else if flags.is_last_segment() {
        Some(2)
    } else {
        None
    }
}

fn position_or_zero(position: Option<io::Result<Position>>) -> io::Result<i64> {
    Ok(position.transpose()?.map_or(0, |position| usize::from(position) as i64))
}

/// Parses a CIGAR string; `*` yields no operations.
///
/// # Errors
///
/// Returns an error when the string is not a valid CIGAR.
pub fn parse_cigar(cigar: &str) -> io::Result<Vec<Op>> {
    if cigar == UNMAPPED_REFERENCE {
        return Ok(Vec::new());
    }
    noodles::sam::alignment::record::Cigar::iter(&Cigar::new(cigar.as_bytes())).collect()
}

/// Formats CIGAR operations; no operations yields `*`.
#[must_use]
pub fn format_cigar(ops: &[Op]) -> String {
    if ops.is_empty() {
        return UNMAPPED_REFERENCE.to_string();
    }
    ops.iter()
        .map(|op| {
            let code = match op.kind() {
                Kind::Match => 'M',
                Kind::Insertion => 'I',
                Kind::Deletion => 'D',
                Kind::Skip => 'N',
                Kind::SoftClip => 'S',
                Kind::HardClip => 'H',
                Kind::Pad => 'P',
                Kind::SequenceMatch => '=',
                Kind::SequenceMismatch => 'X',
            };
            format!("{}{code}", op.len())
        })
        .collect()
}
