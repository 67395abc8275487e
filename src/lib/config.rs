//! Run-wide reconciliation settings.
//!
//! Everything here is built once from the command line and then only read. Components take a
//! `&ReconcileConfig` rather than consulting process-wide state.

use std::io::BufRead;

use ahash::AHashSet;

use crate::errors::{FragmergeError, Result};
use crate::record::UNMAPPED_REFERENCE;

/// Default minimum overlap fraction for two alignments to be considered the same placement.
pub const DEFAULT_MIN_OVERLAP_FRACTION: f64 = 0.3;

/// Default minimum positional similarity for two alignments to be considered the same placement.
pub const DEFAULT_MIN_SIMILARITY: f64 = 0.93;

/// Set of genuine chromosome names (everything else is a transcript, junction or decoy contig).
#[derive(Clone, Debug, Default)]
pub struct ChromosomeSet {
    names: AHashSet<String>,
}

impl ChromosomeSet {
    /// Builds a set from an iterator of names.
    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self { names: names.into_iter().map(Into::into).collect() }
    }

    /// Reads the first tab-separated column of every line; blank lines and `#` comments are
    /// skipped, so a FASTA index works as input.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the reader fails.
    pub fn from_reader<R: BufRead>(reader: R) -> Result<Self> {
        let mut names = AHashSet::new();
        for line in reader.lines() {
            let line = line?;
            let name = line.split('\t').next().unwrap_or_default().trim_end();
            if name.is_empty() || name.starts_with('#') {
                continue;
            }
            names.insert(name.to_string());
        }
        Ok(Self { names })
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    /// True for a chromosome or the unmapped placeholder `*`.
    #[must_use]
    pub fn contains_or_unmapped(&self, name: &str) -> bool {
        name == UNMAPPED_REFERENCE || self.contains(name)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.names.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

/// Thresholds for deciding that two alignments describe the same placement.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct OverlapThresholds {
    pub min_overlap_fraction: f64,
    pub min_similarity: f64,
}

impl Default for OverlapThresholds {
    fn default() -> Self {
        Self {
            min_overlap_fraction: DEFAULT_MIN_OVERLAP_FRACTION,
            min_similarity: DEFAULT_MIN_SIMILARITY,
        }
    }
}

impl OverlapThresholds {
    /// Creates thresholds, checking that both lie in `(0, 1]`.
    ///
    /// # Errors
    ///
    /// Returns [`FragmergeError::InvalidParameter`] for a value outside `(0, 1]`.
    pub fn new(min_overlap_fraction: f64, min_similarity: f64) -> Result<Self> {
        for (name, value) in
            [("min-overlap-fraction", min_overlap_fraction), ("min-similarity", min_similarity)]
        {
            if !(value > 0.0 && value <= 1.0) {
                return Err(FragmergeError::InvalidParameter {
                    parameter: name.to_string(),
                    reason: format!("{value} is not in (0, 1]"),
                });
            }
        }
        Ok(Self { min_overlap_fraction, min_similarity })
    }
}

/// How two single-read alignments are compared for overlap.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OverlapRule {
    /// Span overlap fraction plus positional similarity of the two genomic spans.
    #[default]
    SpanSimilarity,
    /// Overlap counted over the control's spliced blocks, or a close placement.
    SplicedBlocks,
}

/// What happens to alignment fragments after the interval-overlap stream is exhausted.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum TailPolicy {
    /// Copy records on chromosomes (or unmapped) through unchanged.
    #[default]
    PassThrough,
    /// Reconcile every remaining fragment with no computed pairs.
    Reconcile,
}

/// Immutable configuration shared by every reconciliation component.
#[derive(Clone, Debug)]
pub struct ReconcileConfig {
    /// Paired-end sequencing run.
    pub paired_end: bool,
    pub chromosomes: ChromosomeSet,
    pub thresholds: OverlapThresholds,
    pub overlap_rule: OverlapRule,
    /// Stop counting and emitting at bucket 0 once a full pair exists.
    pub paired_preferred: bool,
    pub tail: TailPolicy,
    /// Log a warning for each fragment that needed a synthesized default record.
    pub warn_on_default: bool,
}

impl ReconcileConfig {
    /// A configuration with default thresholds and policies.
    #[must_use]
    pub fn new(paired_end: bool, chromosomes: ChromosomeSet) -> Self {
        Self {
            paired_end,
            chromosomes,
            thresholds: OverlapThresholds::default(),
            overlap_rule: OverlapRule::default(),
            paired_preferred: true,
            tail: TailPolicy::default(),
            warn_on_default: false,
        }
    }

    #[must_use]
    pub fn with_thresholds(mut self, thresholds: OverlapThresholds) -> Self {
        self.thresholds = thresholds;
        self
    }

    #[must_use]
    pub fn with_overlap_rule(mut self, rule: OverlapRule) -> Self {
        self.overlap_rule = rule;
        self
    }

    #[must_use]
    pub fn with_paired_preferred(mut self, paired_preferred: bool) -> Self {
        self.paired_preferred = paired_preferred;
        self
    }

    #[must_use]
    pub fn with_tail(mut self, tail: TailPolicy) -> Self {
        self.tail = tail;
        self
    }

    #[must_use]
    pub fn with_warn_on_default(mut self, warn: bool) -> Self {
        self.warn_on_default = warn;
        self
    }
}
