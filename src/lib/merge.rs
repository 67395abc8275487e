//! Co-iteration of the alignment and interval-overlap streams.
//!
//! Both streams are grouped by fragment and sorted by fragment id. Every alignment group is
//! reconciled exactly once, together with the interval-overlap group of the same fragment when
//! there is one. An interval-overlap group that sorts before the current alignment group has no
//! alignments and aborts the run. Once the interval-overlap stream is exhausted the remaining
//! alignment groups follow the [`TailPolicy`].

use std::cmp::Ordering;

use log::{debug, info};

use crate::config::{ReconcileConfig, TailPolicy};
use crate::errors::{FragmergeError, Result};
use crate::group::{AlignmentGroup, IntervalGroup};
use crate::progress::ProgressTracker;
use crate::reconcile::FragmentReconciler;
use crate::stats::ReconcileStats;
use crate::writer::OutputSink;

/// Drives reconciliation over two grouped streams into an output sink.
pub struct FragmentMerger<'a> {
    config: &'a ReconcileConfig,
    progress: ProgressTracker,
}

impl<'a> FragmentMerger<'a> {
    #[must_use]
    pub fn new(config: &'a ReconcileConfig) -> Self {
        Self { config, progress: ProgressTracker::new("Processed fragments") }
    }

    /// Sets how many fragments pass between progress log lines.
    #[must_use]
    pub fn with_progress_interval(mut self, interval: u64) -> Self {
        self.progress = self.progress.with_interval(interval);
        self
    }

    /// Runs the merge to the end of the alignment stream and returns the run's counts.
    ///
    /// # Errors
    ///
    /// Stops at the first parse, ordering, orphan-fragment, reconciliation or output error.
    pub fn run<A, I, S>(
        mut self,
        alignments: A,
        intervals: I,
        sink: &mut S,
    ) -> Result<ReconcileStats>
    where
        A: IntoIterator<Item = Result<AlignmentGroup>>,
        I: IntoIterator<Item = Result<IntervalGroup>>,
        S: OutputSink,
    {
        let mut reconciler = FragmentReconciler::new(self.config);
        let mut intervals = intervals.into_iter();
        let mut pending = intervals.next().transpose()?;
        let mut tail_logged = false;

        for group in alignments {
            let group = group?;
            let output = match pending.take() {
                Some(overlaps) => match overlaps.fragment_id.cmp(&group.fragment_id) {
                    Ordering::Equal => {
                        let output = reconciler.reconcile(&group, Some(&overlaps))?;
                        pending = intervals.next().transpose()?;
                        output
                    }
                    Ordering::Less => {
                        return Err(FragmergeError::OrphanIntervalFragment {
                            fragment_id: overlaps.fragment_id,
                            next_alignment_fragment: Some(group.fragment_id),
                        });
                    }
                    Ordering::Greater => {
                        pending = Some(overlaps);
                        reconciler.reconcile(&group, None)?
                    }
                },
                None => {
                    if !tail_logged {
                        info!(
                            "Interval-overlap input exhausted at fragment {}; {} the rest",
                            group.fragment_id,
                            match self.config.tail {
                                TailPolicy::PassThrough => "passing through",
                                TailPolicy::Reconcile => "reconciling",
                            }
                        );
                        tail_logged = true;
                    }
                    match self.config.tail {
                        TailPolicy::PassThrough => reconciler.pass_through(&group),
                        TailPolicy::Reconcile => reconciler.reconcile(&group, None)?,
                    }
                }
            };
            sink.write_records(&output)?;
            self.progress.log_if_needed(1);
        }

        if let Some(overlaps) = pending {
            return Err(FragmergeError::OrphanIntervalFragment {
                fragment_id: overlaps.fragment_id,
                next_alignment_fragment: None,
            });
        }

        self.progress.log_final();
        debug!("Merged {} alignment fragments", self.progress.count());
        Ok(reconciler.into_stats())
    }
}
