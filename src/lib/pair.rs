//! Alignment pairs: the unit of categorization and deduplication.
//!
//! A pair holds at most one record per read end. Pairs are compared by [`PairKey`], built from
//! the value keys of their records, never by the identity of the records they hold.

use crate::config::{OverlapRule, OverlapThresholds};
use crate::errors::{FragmergeError, Result};
use crate::record::{AlignmentRecord, RecordKey};

/// Value identity of a pair: the keys of its first and second read.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PairKey {
    pub first: Option<RecordKey>,
    pub second: Option<RecordKey>,
}

/// Up to two alignment records of one fragment, one per read end.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AlignmentPair {
    first_read: Option<AlignmentRecord>,
    second_read: Option<AlignmentRecord>,
}

impl AlignmentPair {
    /// A pair holding a single record.
    ///
    /// # Errors
    ///
    /// Never fails for a single record; the `Result` mirrors [`AlignmentPair::add`].
    pub fn single(record: AlignmentRecord) -> Result<Self> {
        let mut pair = Self::default();
        pair.add(record)?;
        Ok(pair)
    }

    /// A pair of two mates.
    ///
    /// # Errors
    ///
    /// Fails if both records claim the same read end or their mate references disagree.
    pub fn mates(first: AlignmentRecord, second: AlignmentRecord) -> Result<Self> {
        let mut pair = Self::default();
        pair.add(first)?;
        pair.add(second)?;
        Ok(pair)
    }

    /// Places a record in the first slot if it is a first read or unpaired, otherwise in the
    /// second slot. Once both slots are filled each read's mate position is set to the other
    /// read's position.
    ///
    /// # Errors
    ///
    /// Returns [`FragmergeError::InconsistentPair`] if the slot is taken or the two records'
    /// mate references contradict each other.
    pub fn add(&mut self, record: AlignmentRecord) -> Result<()> {
        let is_first_slot = record.is_first_read() || !record.is_paired();
        let slot = if is_first_slot { &mut self.first_read } else { &mut self.second_read };
        if let Some(existing) = slot {
            return Err(FragmergeError::InconsistentPair {
                fragment_id: record.fragment_id.clone(),
                reason: format!(
                    "two records for read {} ({}:{} and {}:{})",
                    record.read_index,
                    existing.reference_name,
                    existing.position,
                    record.reference_name,
                    record.position
                ),
            });
        }
        *slot = Some(record);

        if let (Some(first), Some(second)) = (&mut self.first_read, &mut self.second_read) {
            if first.mate_reference() != second.reference_name
                || second.mate_reference() != first.reference_name
            {
                return Err(FragmergeError::InconsistentPair {
                    fragment_id: first.fragment_id.clone(),
                    reason: format!(
                        "mate references disagree: {} -> {} and {} -> {}",
                        first.reference_name,
                        first.mate_reference(),
                        second.reference_name,
                        second.mate_reference()
                    ),
                });
            }
            first.mate_position = second.position;
            second.mate_position = first.position;
        }
        Ok(())
    }

    #[must_use]
    pub fn first_read(&self) -> Option<&AlignmentRecord> {
        self.first_read.as_ref()
    }

    #[must_use]
    pub fn second_read(&self) -> Option<&AlignmentRecord> {
        self.second_read.as_ref()
    }

    #[must_use]
    pub fn has_first_read(&self) -> bool {
        self.first_read.is_some()
    }

    #[must_use]
    pub fn has_second_read(&self) -> bool {
        self.second_read.is_some()
    }

    /// Both ends are present.
    #[must_use]
    pub fn is_paired_end_alignment(&self) -> bool {
        self.has_first_read() && self.has_second_read()
    }

    /// A single-end pair whose only record is unmapped.
    ///
    /// Mate pairing only joins mapped records, so a pair holding both ends is never unmapped.
    #[must_use]
    pub fn is_unmapped(&self) -> bool {
        match (&self.first_read, &self.second_read) {
            (Some(record), None) | (None, Some(record)) => !record.is_mapped(),
            (Some(first), Some(second)) => {
                debug_assert!(
                    first.is_mapped() && second.is_mapped(),
                    "unmapped read paired with a mate in fragment {}",
                    first.fragment_id
                );
                false
            }
            (None, None) => false,
        }
    }

    /// Records in emission order: first read, then second read.
    pub fn records(&self) -> impl Iterator<Item = &AlignmentRecord> {
        self.first_read.iter().chain(self.second_read.iter())
    }

    #[must_use]
    pub fn key(&self) -> PairKey {
        PairKey {
            first: self.first_read.as_ref().map(AlignmentRecord::key),
            second: self.second_read.as_ref().map(AlignmentRecord::key),
        }
    }

    /// True when this (control) pair overlaps with and is close to `other` (the test pair).
    ///
    /// A full test pair needs a full control pair with both ends matching; a single-end test
    /// pair needs the control's matching end to be present and mapped.
    #[must_use]
    pub fn overlaps_with_and_is_close_to(
        &self,
        other: &AlignmentPair,
        thresholds: &OverlapThresholds,
        rule: OverlapRule,
    ) -> bool {
        let same = |control: Option<&AlignmentRecord>, test: Option<&AlignmentRecord>| {
            control.zip(test).is_some_and(|(control, test)| {
                control.is_mapped() && reads_match(control, test, thresholds, rule)
            })
        };

        if other.is_paired_end_alignment() {
            self.is_paired_end_alignment()
                && same(self.first_read(), other.first_read())
                && same(self.second_read(), other.second_read())
        } else if other.has_first_read() {
            same(self.first_read(), other.first_read())
        } else {
            same(self.second_read(), other.second_read())
        }
    }
}

/// Compares two single-read alignments under the given rule.
#[must_use]
pub fn reads_match(
    control: &AlignmentRecord,
    test: &AlignmentRecord,
    thresholds: &OverlapThresholds,
    rule: OverlapRule,
) -> bool {
    if control.reference_name != test.reference_name {
        return false;
    }
    match rule {
        OverlapRule::SpanSimilarity => span_similarity_match(control, test, thresholds),
        OverlapRule::SplicedBlocks => spliced_blocks_match(control, test, thresholds),
    }
}

fn span_similarity_match(
    control: &AlignmentRecord,
    test: &AlignmentRecord,
    thresholds: &OverlapThresholds,
) -> bool {
    let (control_start, control_end) = (control.position, control.alignment_end());
    let (test_start, test_end) = (test.position, test.alignment_end());
    let overlap = (control_end.min(test_end) - control_start.max(test_start) + 1).max(0);
    if overlap == 0 {
        return false;
    }

    let control_len = control.span_length() as f64;
    let test_len = test.span_length() as f64;
    let overlap = overlap as f64;
    let overlap_fraction = (overlap / control_len).min(overlap / test_len);

    let offset = (control_start - test_start).abs().max((control_end - test_end).abs()) as f64;
    let similarity = 1.0 - offset / (control_len + test_len);

    overlap_fraction > thresholds.min_overlap_fraction && similarity > thresholds.min_similarity
}

fn spliced_blocks_match(
    control: &AlignmentRecord,
    test: &AlignmentRecord,
    thresholds: &OverlapThresholds,
) -> bool {
    let read_length = control.read_length().max(1) as f64;
    let fraction = block_overlap(control, test) as f64 / read_length;
    if fraction >= thresholds.min_similarity {
        return true;
    }
    let distance = alignment_distance(control, test) as f64;
    fraction >= thresholds.min_overlap_fraction
        && distance <= thresholds.min_overlap_fraction * read_length
}

/// Bases of `test`'s span covered by the aligned blocks of `control`.
#[must_use]
pub fn block_overlap(control: &AlignmentRecord, test: &AlignmentRecord) -> i64 {
    if control.reference_name != test.reference_name {
        return 0;
    }
    let (start, end) = (test.position, test.alignment_end());
    if end < control.position || start > control.alignment_end() {
        return 0;
    }
    control
        .aligned_blocks()
        .into_iter()
        .map(|(block_start, block_end)| (end.min(block_end) - start.max(block_start) + 1).max(0))
        .sum()
}

/// Largest of the start and end offsets of two alignments; `i64::MAX` on different references.
#[must_use]
pub fn alignment_distance(control: &AlignmentRecord, test: &AlignmentRecord) -> i64 {
    if control.reference_name != test.reference_name {
        return i64::MAX;
    }
    (control.position - test.position)
        .abs()
        .max((control.alignment_end() - test.alignment_end()).abs())
}
