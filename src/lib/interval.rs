//! Interval-overlap records: transcript alignments intersected with exon intervals.
//!
//! Each line is the `-wo` intersection of one read alignment against one exon interval, both
//! expressed on a transcript or junction reference. The exon carries its genomic locus in its
//! name, which is what lets a transcript alignment be projected back onto the genome.

use std::str::FromStr;

use crate::config::ChromosomeSet;
use crate::errors::{FragmergeError, Result};

/// Name of the interval-overlap input in diagnostics.
pub const INTERVAL_SOURCE: &str = "interval-overlap";

const COLUMNS: usize = 13;

/// Orientation of an exon on the genome.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Strand {
    Forward,
    Reverse,
}

impl FromStr for Strand {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "+" => Ok(Strand::Forward),
            "-" => Ok(Strand::Reverse),
            other => Err(format!("invalid strand '{other}'")),
        }
    }
}

/// Genomic location of an exon, parsed from `<chromosome>/<start>/<end>/<strand>`.
///
/// Coordinates are 1-based and inclusive.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExonLocus {
    pub chromosome: String,
    pub start: i64,
    pub end: i64,
    pub strand: Strand,
}

impl FromStr for ExonLocus {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        // the chromosome name may itself contain '/'
        let mut parts = s.rsplitn(4, '/');
        let (Some(strand), Some(end), Some(start), Some(chromosome)) =
            (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            return Err(format!("exon id '{s}' is not <chromosome>/<start>/<end>/<strand>"));
        };
        let start: i64 = start.parse().map_err(|_| format!("invalid exon start in '{s}'"))?;
        let end: i64 = end.parse().map_err(|_| format!("invalid exon end in '{s}'"))?;
        if chromosome.is_empty() || start < 1 || end < start {
            return Err(format!("invalid exon locus '{s}'"));
        }
        Ok(Self { chromosome: chromosome.to_string(), start, end, strand: strand.parse()? })
    }
}

/// One overlap between a read alignment and an exon interval on a transcript reference.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IntervalOverlapRecord {
    pub fragment_id: String,
    /// Fragment id plus the alignment counter, e.g. `frag1-A3`.
    pub alignment_id: String,
    pub read_index: u8,
    /// Transcript or junction reference of the read alignment.
    pub reference_name: String,
    /// Read alignment start on the reference, 1-based.
    pub read_start: i64,
    /// Read alignment end on the reference, 1-based inclusive.
    pub read_end: i64,
    /// Exon start on the reference, 1-based.
    pub exon_start: i64,
    /// Exon end on the reference, 1-based inclusive.
    pub exon_end: i64,
    pub locus: ExonLocus,
    pub overlap_length: i64,
}

impl IntervalOverlapRecord {
    /// Parses one 13-column intersect line.
    ///
    /// # Errors
    ///
    /// Returns [`FragmergeError::MalformedLine`] for missing or unparsable columns.
    pub fn parse(line: &str, line_number: u64) -> Result<Self> {
        let malformed =
            |reason: String| FragmergeError::malformed(INTERVAL_SOURCE, line_number, line, reason);

        let columns: Vec<&str> = line.split('\t').collect();
        if columns.len() < COLUMNS {
            return Err(malformed(format!(
                "expected {COLUMNS} columns, found {}",
                columns.len()
            )));
        }
        if columns[0] != columns[6] {
            return Err(malformed(format!(
                "read reference '{}' differs from exon reference '{}'",
                columns[0], columns[6]
            )));
        }

        let coordinate = |index: usize, name: &str| -> Result<i64> {
            columns[index]
                .parse::<i64>()
                .map_err(|_| malformed(format!("invalid {name} '{}'", columns[index])))
        };
        let read_start = coordinate(1, "read start")?;
        let read_end = coordinate(2, "read end")?;
        let exon_start = coordinate(7, "exon start")?;
        let exon_end = coordinate(8, "exon end")?;
        let overlap_length = coordinate(12, "overlap length")?;

        let (fragment_id, alignment_id, read_index) = split_alignment_id(columns[3]);
        let locus: ExonLocus = columns[9].parse().map_err(malformed)?;

        Ok(Self {
            fragment_id: fragment_id.to_string(),
            alignment_id: alignment_id.to_string(),
            read_index,
            reference_name: columns[0].to_string(),
            read_start: read_start + 1,
            read_end,
            exon_start: exon_start + 1,
            exon_end,
            locus,
            overlap_length,
        })
    }

    /// True when this overlap takes part in projection: it overlaps by at least one base and
    /// its reference is a transcript or junction rather than a chromosome.
    #[must_use]
    pub fn is_informative(&self, chromosomes: &ChromosomeSet) -> bool {
        self.overlap_length > 0 && !chromosomes.contains(&self.reference_name)
    }
}

/// Splits `<fragment>-A<n>/<S|P><1|2>` into fragment id, alignment id and read index.
#[must_use]
pub fn split_alignment_id(id: &str) -> (&str, &str, u8) {
    let (alignment_id, read_index) = match id.rsplit_once('/') {
        Some((prefix, suffix)) => {
            let index = if suffix.ends_with('2') { 2 } else { 1 };
            (prefix, index)
        }
        None => (id, 1),
    };
    let fragment_id = match alignment_id.rsplit_once("-A") {
        Some((fragment, counter))
            if !counter.is_empty() && counter.bytes().all(|b| b.is_ascii_digit()) =>
        {
            fragment
        }
        _ => alignment_id,
    };
    (fragment_id, alignment_id, read_index)
}
