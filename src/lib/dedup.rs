//! Removal of test pairs already represented by a control set.

use ahash::AHashSet;
use log::trace;

use crate::config::{OverlapRule, OverlapThresholds};
use crate::pair::{AlignmentPair, PairKey};

/// Returns the `test` pairs that are not represented in `control`.
///
/// A test pair is dropped when it is unmapped, or when some control pair overlaps with and is
/// close to it, unless its key is in `excluded`. Running this again on its own output with the
/// same control set returns the output unchanged.
#[must_use]
pub fn remove_overlapping(
    test: Vec<AlignmentPair>,
    control: &[AlignmentPair],
    excluded: &AHashSet<PairKey>,
    thresholds: &OverlapThresholds,
    rule: OverlapRule,
) -> Vec<AlignmentPair> {
    test.into_iter()
        .filter(|pair| {
            if pair.is_unmapped() {
                trace!("Dropping unmapped pair {:?}", pair.key());
                return false;
            }
            if excluded.contains(&pair.key()) {
                return true;
            }
            let covered = control
                .iter()
                .any(|control| control.overlaps_with_and_is_close_to(pair, thresholds, rule));
            if covered {
                trace!("Dropping pair {:?} covered by a computed pair", pair.key());
            }
            !covered
        })
        .collect()
}
