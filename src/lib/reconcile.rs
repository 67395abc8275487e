//! Per-fragment reconciliation of computed and original alignment pairs.
//!
//! For one fragment the reconciler:
//!
//! 1. projects the fragment's interval overlaps into computed pairs and mate-pairs the
//!    fragment's alignment records into original pairs;
//! 2. sets aside computed pairs whose records are already among the alignment records (their
//!    keys form the excluded set, which protects the matching original pairs from removal);
//! 3. buckets both sets by [`Category`] and drops original pairs covered by a computed pair;
//! 4. emits the surviving pairs bucket by bucket, stopping after the full-pair bucket when it is
//!    non-empty and full pairs are preferred, stamping every record with the pair count;
//! 5. synthesizes unmapped records for any required read end that was not written.

use ahash::AHashSet;
use log::{debug, trace, warn};

use crate::annotate::{FragmentAnnotator, OutputRecord, RecordOrigin};
use crate::category::{Buckets, Category};
use crate::config::ReconcileConfig;
use crate::dedup::remove_overlapping;
use crate::errors::Result;
use crate::group::{AlignmentGroup, IntervalGroup};
use crate::pair::{AlignmentPair, PairKey};
use crate::pairing::create_pairs;
use crate::projection::compute_pairs;
use crate::record::RecordKey;
use crate::stats::ReconcileStats;

/// Reconciles fragments one at a time and keeps run-level counts.
pub struct FragmentReconciler<'a> {
    config: &'a ReconcileConfig,
    stats: ReconcileStats,
}

impl<'a> FragmentReconciler<'a> {
    #[must_use]
    pub fn new(config: &'a ReconcileConfig) -> Self {
        Self { config, stats: ReconcileStats::new() }
    }

    #[must_use]
    pub fn stats(&self) -> &ReconcileStats {
        &self.stats
    }

    #[must_use]
    pub fn into_stats(self) -> ReconcileStats {
        self.stats
    }

    /// Produces the output records for one fragment.
    ///
    /// `overlaps` is the fragment's interval-overlap group when the interval input has one.
    ///
    /// # Errors
    ///
    /// Fails when a projection has no source alignment, when records contradict each other, or
    /// when a default record is needed for a read end that has no record at all.
    pub fn reconcile(
        &mut self,
        alignments: &AlignmentGroup,
        overlaps: Option<&IntervalGroup>,
    ) -> Result<Vec<OutputRecord>> {
        let config = self.config;
        let fragment_id = alignments.fragment_id.as_str();
        self.stats.fragments += 1;

        let computed = match overlaps {
            Some(overlaps) => {
                self.stats.fragments_with_overlaps += 1;
                compute_pairs(overlaps, alignments, &config.chromosomes)?
            }
            None => Vec::new(),
        };
        let originals = create_pairs(&alignments.records, &config.chromosomes)?;
        self.stats.computed_pairs += computed.len() as u64;
        self.stats.original_pairs += originals.len() as u64;

        let (retained, excluded) = split_represented(computed, alignments);
        self.stats.excluded_computed_pairs += excluded.len() as u64;

        let paired_end = config.paired_end;
        let mut computed_buckets = Buckets::categorize(retained.iter().cloned(), paired_end);
        let mut original_buckets = Buckets::categorize(originals, paired_end);

        let thresholds = &config.thresholds;
        let rule = config.overlap_rule;
        let mut survivors = Vec::with_capacity(Category::ALL.len());
        for category in Category::ALL {
            let test = original_buckets.take(category);
            let before = test.len();
            // full pairs are checked against full computed pairs only; halves against everything
            let control = match category {
                Category::PairedOrAll => computed_buckets.get(category),
                Category::FirstOnly | Category::SecondOnly => retained.as_slice(),
            };
            let kept = remove_overlapping(test, control, &excluded, thresholds, rule);
            self.stats.removed_original_pairs += (before - kept.len()) as u64;
            survivors.push((category, computed_buckets.take(category), kept));
        }

        let bucket_len = |i: usize| survivors[i].1.len() + survivors[i].2.len();
        let paired_found = bucket_len(0) > 0;
        let stop_after_pairs = paired_found && config.paired_preferred;
        let considered = if stop_after_pairs { 1 } else { survivors.len() };
        let multiplicity: usize = (0..considered).map(bucket_len).sum();
        // a single-end run only ever has read 1 to place
        let found = match (paired_end, paired_found) {
            (false, _) => [paired_found, false],
            (true, true) => [true, true],
            (true, false) => [bucket_len(1) > 0, bucket_len(2) > 0],
        };

        debug!(
            "Fragment {fragment_id}: {} computed ({} already aligned), buckets {}/{}/{}, \
             multiplicity {multiplicity}",
            retained.len() + excluded.len(),
            excluded.len(),
            bucket_len(0),
            bucket_len(1),
            bucket_len(2)
        );

        let mut annotator = FragmentAnnotator::new(fragment_id, paired_end, found, multiplicity);
        let mut output = Vec::new();
        for (category, computed, originals) in survivors.iter().take(considered) {
            let pairs = computed
                .iter()
                .map(|pair| (pair, RecordOrigin::Computed))
                .chain(originals.iter().map(|pair| (pair, RecordOrigin::Original)));
            for (pair, origin) in pairs {
                for record in pair.records() {
                    output.push(annotator.annotate(record, *category, origin)?);
                }
            }
        }

        let defaults = annotator.default_records(&alignments.records)?;
        if !defaults.is_empty() {
            self.stats.fragments_with_defaults += 1;
            if config.warn_on_default {
                warn!("Fragment {fragment_id}: no surviving alignment, writing unmapped records");
            }
            output.extend(defaults);
        }

        self.stats.record_output(&output);
        Ok(output)
    }

    /// Copies a fragment through unchanged, keeping records on a chromosome or unmapped.
    pub fn pass_through(&mut self, alignments: &AlignmentGroup) -> Vec<OutputRecord> {
        self.stats.fragments += 1;
        self.stats.pass_through_fragments += 1;
        let output: Vec<OutputRecord> = alignments
            .records
            .iter()
            .filter(|record| self.config.chromosomes.contains_or_unmapped(&record.reference_name))
            .map(OutputRecord::pass_through)
            .collect();
        self.stats.record_output(&output);
        output
    }
}

/// Splits computed pairs into those still needed and the keys of those whose records are all
/// present among the fragment's alignment records.
fn split_represented(
    computed: Vec<AlignmentPair>,
    alignments: &AlignmentGroup,
) -> (Vec<AlignmentPair>, AHashSet<PairKey>) {
    if computed.is_empty() {
        return (computed, AHashSet::new());
    }
    let present: AHashSet<RecordKey> = alignments.records.iter().map(|r| r.key()).collect();

    let mut retained = Vec::with_capacity(computed.len());
    let mut excluded = AHashSet::new();
    for pair in computed {
        let key = pair.key();
        let represented = if pair.is_paired_end_alignment() {
            key.first.as_ref().is_some_and(|k| present.contains(k))
                && key.second.as_ref().is_some_and(|k| present.contains(k))
        } else {
            key.first.as_ref().or(key.second.as_ref()).is_some_and(|k| present.contains(k))
        };
        if represented {
            trace!("Computed pair {key:?} is already among the alignments");
            excluded.insert(key);
        } else {
            retained.push(pair);
        }
    }
    (retained, excluded)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ChromosomeSet;
    use crate::group::FragmentGroup;
    use crate::interval::IntervalOverlapRecord;
    use crate::record::AlignmentRecord;

    fn config(paired_end: bool) -> ReconcileConfig {
        ReconcileConfig::new(paired_end, ChromosomeSet::from_names(["chr1", "chr2"]))
    }

    fn alignments(lines: &[&str]) -> AlignmentGroup {
        let records: Vec<AlignmentRecord> =
            lines.iter().map(|l| AlignmentRecord::parse(l, 1).unwrap()).collect();
        FragmentGroup { fragment_id: records[0].fragment_id.clone(), records }
    }

    fn overlaps(lines: &[&str]) -> IntervalGroup {
        let records: Vec<IntervalOverlapRecord> =
            lines.iter().map(|l| IntervalOverlapRecord::parse(l, 1).unwrap()).collect();
        FragmentGroup { fragment_id: records[0].fragment_id.clone(), records }
    }

    fn lines(records: &[OutputRecord]) -> Vec<String> {
        records.iter().map(ToString::to_string).collect()
    }

    const F1_R1: &str = "F1\t99\tchr1\t100\t60\t50M\t=\t250\t200\t*\t*";
    const F1_R2: &str = "F1\t147\tchr1\t250\t60\t50M\t=\t100\t-200\t*\t*";

    #[test]
    fn test_duplicate_of_computed_pair_is_written_once() {
        // transcript tx1 1..=1000 lies on chr1 1..=1000, so the projection lands on the same spot
        let group = alignments(&[
            F1_R1,
            F1_R2,
            "F1\t99\ttx1\t100\t3\t50M\t=\t250\t200\t*\t*",
            "F1\t147\ttx1\t250\t3\t50M\t=\t100\t-200\t*\t*",
        ]);
        let intervals = overlaps(&[
            "tx1\t99\t149\tF1-A1/P1\t0\t+\ttx1\t0\t1000\tchr1/1/1000/+\t0\t+\t50",
            "tx1\t249\t299\tF1-A1/P2\t0\t+\ttx1\t0\t1000\tchr1/1/1000/+\t0\t+\t50",
        ]);
        let config = config(true);
        let mut reconciler = FragmentReconciler::new(&config);
        let output = reconciler.reconcile(&group, Some(&intervals)).unwrap();

        assert_eq!(
            lines(&output),
            vec![
                "F1\t99\tchr1\t100\t60\t50M\t=\t250\t200\t*\t*\tNH:i:1".to_string(),
                "F1\t147\tchr1\t250\t60\t50M\t=\t100\t-200\t*\t*\tNH:i:1".to_string(),
            ]
        );
        let stats = reconciler.stats();
        assert_eq!(stats.computed_pairs, 1);
        assert_eq!(stats.excluded_computed_pairs, 1);
        assert_eq!(stats.default_records, 0);
    }

    #[test]
    fn test_overlapping_original_is_replaced_by_computed_pair() {
        // the genome aligner placed the pair 2bp off; the projection wins
        let group = alignments(&[
            "F1\t99\tchr1\t102\t60\t50M\t=\t252\t200\t*\t*",
            "F1\t147\tchr1\t252\t60\t50M\t=\t102\t-200\t*\t*",
            "F1\t99\ttx1\t100\t3\t50M\t=\t250\t200\t*\t*",
            "F1\t147\ttx1\t250\t3\t50M\t=\t100\t-200\t*\t*",
        ]);
        let intervals = overlaps(&[
            "tx1\t99\t149\tF1-A1/P1\t0\t+\ttx1\t0\t1000\tchr1/1/1000/+\t0\t+\t50",
            "tx1\t249\t299\tF1-A1/P2\t0\t+\ttx1\t0\t1000\tchr1/1/1000/+\t0\t+\t50",
        ]);
        let config = config(true);
        let mut reconciler = FragmentReconciler::new(&config);
        let output = reconciler.reconcile(&group, Some(&intervals)).unwrap();

        assert_eq!(output.len(), 2);
        assert!(output.iter().all(|r| r.origin == RecordOrigin::Computed));
        assert_eq!(output[0].position, 100);
        assert_eq!(output[0].mapping_quality, 10);
        assert_eq!(reconciler.stats().removed_original_pairs, 1);
    }

    #[test]
    fn test_first_only_fragment_gets_default_second_read() {
        let group = alignments(&[
            "F2\t73\tchr1\t100\t60\t50M\t=\t100\t0\tACGT\tIIII",
            "F2\t133\t*\t0\t0\t*\tchr1\t100\t0\tTTTT\tJJJJ",
        ]);
        let config = config(true);
        let mut reconciler = FragmentReconciler::new(&config);
        let output = reconciler.reconcile(&group, None).unwrap();

        assert_eq!(
            lines(&output),
            vec![
                "F2\t73\tchr1\t100\t60\t50M\t*\t0\t0\tACGT\tIIII\tNH:i:1".to_string(),
                "F2\t141\t*\t0\t0\t*\t*\t0\t0\tTTTT\tJJJJ".to_string(),
            ]
        );
        assert_eq!(reconciler.stats().fragments_with_defaults, 1);
    }

    #[test]
    fn test_unmapped_fragment_gets_default_pair() {
        let group = alignments(&[
            "F3\t77\t*\t0\t0\t*\t*\t0\t0\tACGT\tIIII",
            "F3\t141\t*\t0\t0\t*\t*\t0\t0\tTTTT\tJJJJ",
        ]);
        let config = config(true);
        let output = FragmentReconciler::new(&config).reconcile(&group, None).unwrap();
        assert_eq!(output.len(), 2);
        assert!(output.iter().all(|r| r.origin == RecordOrigin::Default && r.is_unmapped()));
    }

    #[test]
    fn test_full_pair_preferred_over_halves() {
        let group = alignments(&[
            F1_R1,
            F1_R2,
            "F1\t73\tchr2\t500\t60\t50M\t=\t500\t0\t*\t*",
        ]);
        let preferred = config(true);
        let output = FragmentReconciler::new(&preferred).reconcile(&group, None).unwrap();
        assert_eq!(output.len(), 2);
        assert!(output.iter().all(|r| r.multiplicity() == Some(1) && !r.is_secondary()));

        let all_buckets = config(true).with_paired_preferred(false);
        let output = FragmentReconciler::new(&all_buckets).reconcile(&group, None).unwrap();
        assert_eq!(output.len(), 3);
        assert!(output.iter().all(|r| r.multiplicity() == Some(2)));
        assert!(output[2].is_secondary());
    }

    #[test]
    fn test_halves_are_counted_together_without_full_pair() {
        let group = alignments(&[
            "F4\t73\tchr1\t100\t60\t50M\t=\t100\t0\t*\t*",
            "F4\t137\tchr2\t900\t60\t50M\t=\t900\t0\t*\t*",
        ]);
        let config = config(true);
        let output = FragmentReconciler::new(&config).reconcile(&group, None).unwrap();
        assert_eq!(output.len(), 2);
        assert!(output.iter().all(|r| r.multiplicity() == Some(2) && !r.is_secondary()));
        // both ends were found, but neither record has a mapped mate to point at
        assert!(output.iter().all(|r| r.mate_reference_name == "*"));
    }

    #[test]
    fn test_single_end_run() {
        let group = alignments(&[
            "F5\t0\tchr1\t100\t60\t50M\t*\t0\t0\t*\t*",
            "F5\t256\tchr2\t100\t60\t50M\t*\t0\t0\t*\t*",
            "F5\t0\ttx9\t100\t60\t50M\t*\t0\t0\t*\t*",
        ]);
        let config = config(false);
        let output = FragmentReconciler::new(&config).reconcile(&group, None).unwrap();
        assert_eq!(
            lines(&output),
            vec![
                "F5\t0\tchr1\t100\t60\t50M\t*\t0\t0\t*\t*\tNH:i:2".to_string(),
                "F5\t256\tchr2\t100\t60\t50M\t*\t0\t0\t*\t*\tNH:i:2".to_string(),
            ]
        );
    }

    #[test]
    fn test_single_read_run_ignores_paired_flags() {
        // paired-flagged input reconciled as single-read: read 1 is placed, read 2 is not needed
        let group = alignments(&[
            "F1\t73\tchr1\t100\t60\t50M\t=\t100\t0\tACGT\tIIII",
            "F1\t133\t*\t0\t0\t*\tchr1\t100\t0\tTTTT\tJJJJ",
        ]);
        let config = config(false);
        let mut reconciler = FragmentReconciler::new(&config);
        let output = reconciler.reconcile(&group, None).unwrap();
        assert_eq!(
            lines(&output),
            vec!["F1\t73\tchr1\t100\t60\t50M\t*\t0\t0\tACGT\tIIII\tNH:i:1".to_string()]
        );
        assert_eq!(reconciler.stats().fragments_with_defaults, 0);
    }

    #[test]
    fn test_pass_through_filters_non_chromosome_records() {
        let group = alignments(&[
            "F6\t0\tchr1\t100\t60\t50M\t*\t0\t0\t*\t*\tNH:i:4",
            "F6\t0\ttx1\t100\t60\t50M\t*\t0\t0\t*\t*",
            "F6\t4\t*\t0\t0\t*\t*\t0\t0\t*\t*",
        ]);
        let config = config(false);
        let mut reconciler = FragmentReconciler::new(&config);
        let output = reconciler.pass_through(&group);
        assert_eq!(
            lines(&output),
            vec![
                "F6\t0\tchr1\t100\t60\t50M\t*\t0\t0\t*\t*\tNH:i:4".to_string(),
                "F6\t4\t*\t0\t0\t*\t*\t0\t0\t*\t*".to_string(),
            ]
        );
        assert_eq!(reconciler.stats().pass_through_records, 2);
    }
}
