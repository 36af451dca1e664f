// ============================================================
// Layer 4 — Dataset Split
// ============================================================
// One dataset split (train / dev / test) with its examples
// partitioned per bucket. Built once at data-load time and
// immutable afterwards: the training loop only ever reads it.
//
// Allocation invariant: every example sits in the *smallest*
// bucket whose capacities meet or exceed both of its lengths.
// Examples exceeding the largest bucket are dropped — a model
// built for the bucket shapes simply cannot represent them.

use crate::data::buckets::{sampling_scale, Bucket};
use crate::domain::example::Example;

pub struct DatasetSplit {
    buckets: Vec<Bucket>,
    examples: Vec<Vec<Example>>,
    dropped: usize,
}

impl DatasetSplit {
    /// Partition `pairs` over `buckets` (smallest fitting bucket
    /// wins; oversized examples are dropped and counted).
    pub fn allocate(pairs: Vec<Example>, buckets: &[Bucket]) -> Self {
        let mut examples: Vec<Vec<Example>> = vec![Vec::new(); buckets.len()];
        let mut dropped = 0usize;

        for pair in pairs {
            match buckets
                .iter()
                .position(|b| b.fits(pair.source_len(), pair.target_len()))
            {
                Some(bucket_id) => examples[bucket_id].push(pair),
                None => dropped += 1,
            }
        }

        if dropped > 0 {
            tracing::warn!(
                "Dropped {} examples exceeding the largest bucket",
                dropped
            );
        }

        Self { buckets: buckets.to_vec(), examples, dropped }
    }

    pub fn buckets(&self) -> &[Bucket] {
        &self.buckets
    }

    pub fn bucket_examples(&self, bucket_id: usize) -> &[Example] {
        &self.examples[bucket_id]
    }

    pub fn bucket_len(&self, bucket_id: usize) -> usize {
        self.examples[bucket_id].len()
    }

    pub fn is_bucket_empty(&self, bucket_id: usize) -> bool {
        self.examples[bucket_id].is_empty()
    }

    /// Total number of retained examples across all buckets.
    pub fn len(&self) -> usize {
        self.examples.iter().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of examples dropped at allocation time.
    pub fn dropped(&self) -> usize {
        self.dropped
    }

    /// Cumulative bucket sampling scale for this split.
    pub fn sampling_scale(&self) -> Vec<f64> {
        let sizes: Vec<usize> = self.examples.iter().map(Vec::len).collect();
        sampling_scale(&sizes)
    }

    /// Iterate all examples in bucket order, used by the
    /// decode/eval driver to walk a whole split.
    pub fn iter(&self) -> impl Iterator<Item = &Example> {
        self.examples.iter().flatten()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn example(source_len: usize, target_len: usize) -> Example {
        Example::new(vec![7; source_len], vec![9; target_len])
    }

    fn buckets() -> Vec<Bucket> {
        vec![Bucket::new(5, 10), Bucket::new(10, 20), Bucket::new(20, 40)]
    }

    #[test]
    fn test_smallest_fitting_bucket_wins() {
        let split = DatasetSplit::allocate(
            vec![example(3, 8), example(6, 8), example(11, 30)],
            &buckets(),
        );
        assert_eq!(split.bucket_len(0), 1); // (3,8) fits bucket 0
        assert_eq!(split.bucket_len(1), 1); // (6,8) needs bucket 1
        assert_eq!(split.bucket_len(2), 1); // (11,30) needs bucket 2
    }

    #[test]
    fn test_both_dimensions_must_fit() {
        // source fits bucket 0 but target does not
        let split = DatasetSplit::allocate(vec![example(2, 15)], &buckets());
        assert_eq!(split.bucket_len(0), 0);
        assert_eq!(split.bucket_len(1), 1);
    }

    #[test]
    fn test_oversized_examples_are_dropped() {
        let split = DatasetSplit::allocate(vec![example(50, 5), example(5, 50)], &buckets());
        assert!(split.is_empty());
        assert_eq!(split.dropped(), 2);
    }

    #[test]
    fn test_empty_bucket_is_observable() {
        let split = DatasetSplit::allocate(vec![example(3, 3)], &buckets());
        assert!(!split.is_bucket_empty(0));
        assert!(split.is_bucket_empty(1));
        assert!(split.is_bucket_empty(2));
    }
}
