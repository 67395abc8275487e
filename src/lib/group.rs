//! Grouping of sorted record streams into per-fragment groups.
//!
//! Both inputs are sorted by fragment id with all lines for one fragment adjacent.
//! [`RecordLines`] turns a reader into parsed records and [`FragmentGroups`] collects runs of
//! records with the same fragment id, failing as soon as an id does not sort strictly after the
//! previous group's id.

use std::io::BufRead;
use std::marker::PhantomData;

use crate::errors::{FragmergeError, Result};
use crate::interval::{INTERVAL_SOURCE, IntervalOverlapRecord};
use crate::record::{ALIGNMENT_SOURCE, AlignmentRecord};

/// A record type that can be read line by line and belongs to a fragment.
pub trait FragmentRecord: Sized {
    /// Input name used in diagnostics.
    const SOURCE: &'static str;

    /// True for lines that carry no record (blank lines, headers, comments).
    fn is_skipped_line(line: &str) -> bool;

    /// Parses a record from a line.
    fn parse_line(line: &str, line_number: u64) -> Result<Self>;

    /// The fragment this record belongs to.
    fn fragment_id(&self) -> &str;
}

impl FragmentRecord for AlignmentRecord {
    const SOURCE: &'static str = ALIGNMENT_SOURCE;

    fn is_skipped_line(line: &str) -> bool {
        line.is_empty() || line.starts_with('@')
    }

    fn parse_line(line: &str, line_number: u64) -> Result<Self> {
        AlignmentRecord::parse(line, line_number)
    }

    fn fragment_id(&self) -> &str {
        &self.fragment_id
    }
}

impl FragmentRecord for IntervalOverlapRecord {
    const SOURCE: &'static str = INTERVAL_SOURCE;

    fn is_skipped_line(line: &str) -> bool {
        line.is_empty() || line.starts_with('#')
    }

    fn parse_line(line: &str, line_number: u64) -> Result<Self> {
        IntervalOverlapRecord::parse(line, line_number)
    }

    fn fragment_id(&self) -> &str {
        &self.fragment_id
    }
}

/// Iterator over the parsed records of a line-oriented reader.
pub struct RecordLines<R, T> {
    reader: R,
    line: String,
    line_number: u64,
    _record: PhantomData<T>,
}

impl<R: BufRead, T: FragmentRecord> RecordLines<R, T> {
    pub fn new(reader: R) -> Self {
        Self { reader, line: String::new(), line_number: 0, _record: PhantomData }
    }
}

impl<R: BufRead, T: FragmentRecord> Iterator for RecordLines<R, T> {
    type Item = Result<T>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            self.line.clear();
            match self.reader.read_line(&mut self.line) {
                Ok(0) => return None,
                Ok(_) => {
                    self.line_number += 1;
                    let line = self.line.trim_end_matches(['\n', '\r']);
                    if T::is_skipped_line(line) {
                        continue;
                    }
                    return Some(T::parse_line(line, self.line_number));
                }
                Err(e) => return Some(Err(e.into())),
            }
        }
    }
}

/// All records of one fragment from one input, in input order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FragmentGroup<T> {
    pub fragment_id: String,
    pub records: Vec<T>,
}

pub type AlignmentGroup = FragmentGroup<AlignmentRecord>;
pub type IntervalGroup = FragmentGroup<IntervalOverlapRecord>;

/// Groups consecutive records by fragment id and enforces strictly increasing ids.
pub struct FragmentGroups<I, T> {
    records: I,
    pending: Option<T>,
    previous_id: Option<String>,
    failed: bool,
}

impl<I, T> FragmentGroups<I, T>
where
    I: Iterator<Item = Result<T>>,
    T: FragmentRecord,
{
    pub fn new(records: I) -> Self {
        Self { records, pending: None, previous_id: None, failed: false }
    }

    fn fail(&mut self, error: FragmergeError) -> Option<Result<FragmentGroup<T>>> {
        self.failed = true;
        Some(Err(error))
    }
}

impl<I, T> Iterator for FragmentGroups<I, T>
where
    I: Iterator<Item = Result<T>>,
    T: FragmentRecord,
{
    type Item = Result<FragmentGroup<T>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }

        let first = match self.pending.take() {
            Some(record) => record,
            None => match self.records.next()? {
                Ok(record) => record,
                Err(e) => return self.fail(e),
            },
        };

        let fragment_id = first.fragment_id().to_string();
        if let Some(previous) = &self.previous_id {
            if fragment_id.as_bytes() <= previous.as_bytes() {
                let error = FragmergeError::OrderingViolation {
                    source_name: T::SOURCE.to_string(),
                    previous: previous.clone(),
                    current: fragment_id,
                };
                return self.fail(error);
            }
        }

        let mut records = vec![first];
        loop {
            match self.records.next() {
                None => break,
                Some(Err(e)) => return self.fail(e),
                Some(Ok(record)) if record.fragment_id() == fragment_id => records.push(record),
                Some(Ok(record)) => {
                    self.pending = Some(record);
                    break;
                }
            }
        }

        self.previous_id = Some(fragment_id.clone());
        Some(Ok(FragmentGroup { fragment_id, records }))
    }
}

/// Groups an alignment-record reader into per-fragment groups.
pub fn alignment_groups<R: BufRead>(
    reader: R,
) -> FragmentGroups<RecordLines<R, AlignmentRecord>, AlignmentRecord> {
    FragmentGroups::new(RecordLines::new(reader))
}

/// Groups an interval-overlap reader into per-fragment groups, keeping only the records the
/// predicate accepts.
pub fn interval_groups<R, F>(
    reader: R,
    keep: F,
) -> FragmentGroups<impl Iterator<Item = Result<IntervalOverlapRecord>>, IntervalOverlapRecord>
where
    R: BufRead,
    F: Fn(&IntervalOverlapRecord) -> bool,
{
    let records = RecordLines::<R, IntervalOverlapRecord>::new(reader)
        .filter(move |record| record.as_ref().map_or(true, |r| keep(r)));
    FragmentGroups::new(records)
}
