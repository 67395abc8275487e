//! Mate pairing of the alignment records of one fragment.

use ahash::AHashSet;
use log::trace;

use crate::config::ChromosomeSet;
use crate::errors::Result;
use crate::pair::{AlignmentPair, PairKey};
use crate::record::AlignmentRecord;

/// True when `other` is the mate of `record`.
///
/// Records carrying a hit index (`HI:i`) pair by equal hit index. Otherwise the mate must be
/// the other read end of the same fragment (query names compared without their `/1` or `/2`
/// suffix) and the two records' mate fields must point at each other.
#[must_use]
pub fn is_mate(record: &AlignmentRecord, other: &AlignmentRecord) -> bool {
    if let Some(hit_index) = record.hit_index() {
        return other.hit_index() == Some(hit_index) && other.read_index != record.read_index;
    }
    record.read_index != other.read_index
        && record.fragment_id == other.fragment_id
        && record.mate_reference() == other.reference_name
        && record.mate_position == other.position
        && record.reference_name == other.mate_reference()
        && record.position == other.mate_position
}

/// Pairs the records of one fragment.
///
/// Only records on a chromosome take part. A mapped record with a mapped mate is paired with the
/// first later unpaired mapped record that is its mate; a record without a usable mate becomes a
/// singleton when mapped and is skipped otherwise. Pairs with equal keys collapse to the first.
///
/// # Errors
///
/// Returns an error if two records that look like mates claim the same read end.
pub fn create_pairs(
    records: &[AlignmentRecord],
    chromosomes: &ChromosomeSet,
) -> Result<Vec<AlignmentPair>> {
    let mut processed = vec![false; records.len()];
    let mut seen: AHashSet<PairKey> = AHashSet::new();
    let mut pairs = Vec::new();

    for (i, record) in records.iter().enumerate() {
        if processed[i] || !chromosomes.contains(&record.reference_name) {
            continue;
        }
        processed[i] = true;

        let mate_index = if record.is_mapped() && record.mate_is_mapped() {
            find_mate(records, &processed, i)
        } else {
            None
        };
        let mate_index = mate_index.filter(|&j| {
            let on_chromosome = chromosomes.contains(&records[j].reference_name);
            if !on_chromosome {
                trace!(
                    "Ignoring mate of {} on non-chromosome reference {}",
                    record.query_name, records[j].reference_name
                );
            }
            on_chromosome
        });

        let pair = match mate_index {
            Some(j) => {
                processed[j] = true;
                AlignmentPair::mates(record.clone(), records[j].clone())?
            }
            None if record.is_mapped() => AlignmentPair::single(record.clone())?,
            None => continue,
        };

        if seen.insert(pair.key()) {
            pairs.push(pair);
        }
    }

    Ok(pairs)
}

fn find_mate(records: &[AlignmentRecord], processed: &[bool], index: usize) -> Option<usize> {
    let record = &records[index];
    (index + 1..records.len()).find(|&j| {
        !processed[j] && records[j].is_mapped() && is_mate(record, &records[j])
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pair::tests::record;

    fn chromosomes() -> ChromosomeSet {
        ChromosomeSet::from_names(["chr1", "chr2"])
    }

    #[test]
    fn test_pairs_mates_by_position() {
        let records = vec![
            record("f", 99, "chr1", 100, "50M", ("=", 250)),
            record("f", 355, "chr1", 400, "50M", ("=", 600)),
            record("f", 147, "chr1", 250, "50M", ("=", 100)),
            record("f", 403, "chr1", 600, "50M", ("=", 400)),
        ];
        let pairs = create_pairs(&records, &chromosomes()).unwrap();
        assert_eq!(pairs.len(), 2);
        assert!(pairs.iter().all(AlignmentPair::is_paired_end_alignment));
        assert_eq!(pairs[0].second_read().unwrap().position, 250);
        assert_eq!(pairs[1].second_read().unwrap().position, 600);
    }

    #[test]
    fn test_suffixed_names_pair_by_fragment_id() {
        let records = vec![
            record("f/1", 99, "chr1", 100, "50M", ("=", 250)),
            record("g/2", 147, "chr1", 250, "50M", ("=", 100)),
            record("f/2", 147, "chr1", 250, "50M", ("=", 100)),
        ];
        let pairs = create_pairs(&records, &chromosomes()).unwrap();
        assert!(!is_mate(&records[0], &records[1]));
        assert!(is_mate(&records[0], &records[2]));
        assert_eq!(pairs.len(), 2);
        assert_eq!(pairs[0].second_read().unwrap().query_name, "f/2");
        assert!(!pairs[1].has_first_read());
    }

    #[test]
    fn test_pairs_mates_by_hit_index() {
        let mut r1 = record("f", 99, "chr1", 100, "50M", ("=", 9999));
        let mut r2 = record("f", 147, "chr1", 250, "50M", ("=", 1));
        let mut other = record("f", 147, "chr1", 700, "50M", ("=", 100));
        r1.fields.push("HI:i:2".to_string());
        other.fields.push("HI:i:1".to_string());
        r2.fields.push("HI:i:2".to_string());
        let pairs = create_pairs(&[r1, other, r2], &chromosomes()).unwrap();
        // the HI:i:1 record has no partner and becomes a second-read singleton
        assert_eq!(pairs.len(), 2);
        assert_eq!(pairs[0].second_read().unwrap().position, 250);
        assert!(!pairs[1].has_first_read());
        assert_eq!(pairs[1].second_read().unwrap().position, 700);
    }

    #[test]
    fn test_non_chromosome_records_are_excluded() {
        let records = vec![
            record("f", 99, "tx1", 100, "50M", ("=", 250)),
            record("f", 147, "tx1", 250, "50M", ("=", 100)),
            record("f", 89, "chr2", 500, "50M", ("*", 0)),
        ];
        let pairs = create_pairs(&records, &chromosomes()).unwrap();
        assert_eq!(pairs.len(), 1);
        assert_eq!(pairs[0].first_read().unwrap().reference_name, "chr2");
        assert!(!pairs[0].has_second_read());
    }

    #[test]
    fn test_mate_on_non_chromosome_leaves_singleton() {
        let records = vec![
            record("f", 97, "chr1", 100, "50M", ("tx1", 250)),
            record("f", 145, "tx1", 250, "50M", ("chr1", 100)),
        ];
        let pairs = create_pairs(&records, &chromosomes()).unwrap();
        assert_eq!(pairs.len(), 1);
        assert!(pairs[0].has_first_read());
        assert!(!pairs[0].has_second_read());
    }

    #[test]
    fn test_mate_flagged_unmapped_is_not_paired() {
        // the mate fields cross, but read 2 carries 0x4
        let records = vec![
            record("f", 99, "chr1", 100, "50M", ("=", 250)),
            record("f", 149, "chr1", 250, "50M", ("=", 100)),
        ];
        let pairs = create_pairs(&records, &chromosomes()).unwrap();
        assert_eq!(pairs.len(), 1);
        assert!(pairs[0].has_first_read() && !pairs[0].has_second_read());
        assert!(!pairs[0].is_unmapped());
    }

    #[test]
    fn test_unmapped_records_are_skipped_and_duplicates_collapse() {
        let records = vec![
            record("f", 77, "*", 0, "*", ("*", 0)),
            record("f", 0, "chr1", 100, "50M", ("*", 0)),
            record("f", 0, "chr1", 100, "50M", ("*", 0)),
        ];
        let pairs = create_pairs(&records, &chromosomes()).unwrap();
        assert_eq!(pairs.len(), 1);
    }
}
