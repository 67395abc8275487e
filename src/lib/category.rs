//! Priority categories for alignment pairs.

use std::fmt;

use crate::pair::AlignmentPair;

/// Priority class of an alignment pair, in processing order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Category {
    /// Full paired-end alignments, or every pair of a single-end run.
    PairedOrAll,
    /// Pairs carrying only a first read.
    FirstOnly,
    /// Pairs carrying only a second read.
    SecondOnly,
}

impl Category {
    /// All categories in priority order.
    pub const ALL: [Category; 3] =
        [Category::PairedOrAll, Category::FirstOnly, Category::SecondOnly];

    /// Category of a pair within a run.
    #[must_use]
    pub fn of(pair: &AlignmentPair, paired_end: bool) -> Option<Category> {
        if pair.is_paired_end_alignment() || !paired_end {
            Some(Category::PairedOrAll)
        } else if pair.has_first_read() {
            Some(Category::FirstOnly)
        } else if pair.has_second_read() {
            Some(Category::SecondOnly)
        } else {
            None
        }
    }

    const fn index(self) -> usize {
        match self {
            Category::PairedOrAll => 0,
            Category::FirstOnly => 1,
            Category::SecondOnly => 2,
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Category::PairedOrAll => "paired-or-all",
            Category::FirstOnly => "first-only",
            Category::SecondOnly => "second-only",
        };
        f.write_str(name)
    }
}

/// Pairs partitioned by [`Category`], each bucket in input order.
#[derive(Clone, Debug, Default)]
pub struct Buckets {
    buckets: [Vec<AlignmentPair>; 3],
}

impl Buckets {
    /// Partitions pairs into the three priority buckets. Empty pairs are dropped.
    #[must_use]
    pub fn categorize<I>(pairs: I, paired_end: bool) -> Self
    where
        I: IntoIterator<Item = AlignmentPair>,
    {
        let mut buckets = Self::default();
        for pair in pairs {
            if let Some(category) = Category::of(&pair, paired_end) {
                buckets.buckets[category.index()].push(pair);
            }
        }
        buckets
    }

    #[must_use]
    pub fn get(&self, category: Category) -> &[AlignmentPair] {
        &self.buckets[category.index()]
    }

    /// Removes and returns one bucket.
    pub fn take(&mut self, category: Category) -> Vec<AlignmentPair> {
        std::mem::take(&mut self.buckets[category.index()])
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.buckets.iter().map(Vec::len).sum()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.buckets.iter().all(Vec::is_empty)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pair::tests::{mapped_pair, record};

    #[test]
    fn test_paired_end_run() {
        let first_only =
            AlignmentPair::single(record("f", 73, "chr1", 100, "50M", ("=", 100))).unwrap();
        let second_only =
            AlignmentPair::single(record("f", 137, "chr1", 300, "50M", ("=", 300))).unwrap();
        let pairs = vec![second_only, mapped_pair("f", 100, 250), first_only];
        let buckets = Buckets::categorize(pairs, true);
        assert_eq!(buckets.get(Category::PairedOrAll).len(), 1);
        assert_eq!(buckets.get(Category::FirstOnly).len(), 1);
        assert_eq!(buckets.get(Category::SecondOnly).len(), 1);
        assert_eq!(buckets.len(), 3);
    }

    #[test]
    fn test_single_end_run_puts_everything_in_bucket_zero() {
        let pairs = vec![
            AlignmentPair::single(record("f", 0, "chr1", 100, "50M", ("*", 0))).unwrap(),
            AlignmentPair::single(record("f", 16, "chr2", 100, "50M", ("*", 0))).unwrap(),
        ];
        let mut buckets = Buckets::categorize(pairs, false);
        assert_eq!(buckets.get(Category::PairedOrAll).len(), 2);
        assert_eq!(buckets.take(Category::PairedOrAll).len(), 2);
        assert!(buckets.is_empty());
    }

    #[test]
    fn test_empty_pairs_are_dropped() {
        let buckets = Buckets::categorize(vec![AlignmentPair::default()], true);
        assert!(buckets.is_empty());
    }

    #[test]
    fn test_priority_order() {
        assert_eq!(
            Category::ALL,
            [Category::PairedOrAll, Category::FirstOnly, Category::SecondOnly]
        );
        assert!(Category::PairedOrAll < Category::SecondOnly);
        assert_eq!(Category::FirstOnly.to_string(), "first-only");
    }
}
