//! Run-level counters for a reconciliation.

use std::path::Path;

use anyhow::{Context, Result};
use fgoxide::io::DelimFile;
use serde::{Deserialize, Serialize};

use crate::annotate::{OutputRecord, RecordOrigin};

/// Counts accumulated over one reconciliation run, written as a one-row TSV.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconcileStats {
    /// Alignment fragment groups read.
    pub fragments: u64,
    /// Fragments that had an interval-overlap group.
    pub fragments_with_overlaps: u64,
    /// Pairs projected from interval overlaps.
    pub computed_pairs: u64,
    /// Computed pairs whose records were already present among the alignment records.
    pub excluded_computed_pairs: u64,
    /// Pairs built from the alignment records.
    pub original_pairs: u64,
    /// Original pairs dropped because a computed pair covers them.
    pub removed_original_pairs: u64,
    /// Aligned records written (computed and original).
    pub emitted_records: u64,
    /// Records emitted as secondary alignments.
    pub secondary_records: u64,
    /// Synthesized unmapped records.
    pub default_records: u64,
    /// Fragments that needed at least one synthesized record.
    pub fragments_with_defaults: u64,
    /// Fragments copied through after the interval-overlap input ended.
    pub pass_through_fragments: u64,
    /// Records copied through after the interval-overlap input ended.
    pub pass_through_records: u64,
}

impl ReconcileStats {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Counts a batch of written records by origin.
    pub fn record_output(&mut self, records: &[OutputRecord]) {
        for record in records {
            match record.origin {
                RecordOrigin::Computed | RecordOrigin::Original => {
                    self.emitted_records += 1;
                    if record.is_secondary() {
                        self.secondary_records += 1;
                    }
                }
                RecordOrigin::Default => self.default_records += 1,
                RecordOrigin::PassThrough => self.pass_through_records += 1,
            }
        }
    }

    /// Total records written.
    #[must_use]
    pub fn total_records(&self) -> u64 {
        self.emitted_records + self.default_records + self.pass_through_records
    }

    /// Writes the counters as a single-row TSV.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be created or written to.
    pub fn write_metrics(&self, path: &Path) -> Result<()> {
        DelimFile::default()
            .write_tsv(&path, std::slice::from_ref(self))
            .with_context(|| format!("Failed to write reconcile metrics: {}", path.display()))
    }
}
