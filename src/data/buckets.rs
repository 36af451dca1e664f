// ============================================================
// Layer 4 — Length Buckets
// ============================================================
// Variable-length examples are grouped into a small fixed set
// of (max_source_len, max_target_len) capacity classes so that
// every batch has one static shape with limited padding waste.
//
// The flat decoder uses symmetric buckets — a command has
// roughly as many tokens as its description. The tree decoder
// uses asymmetric buckets: a linearized tree skeleton carries
// extra structural markers, so its target side is longer.
//
// During training a bucket is drawn with probability
// proportional to its population. The draw works on a
// cumulative scale: a list of increasing values ending at 1.0,
// one per bucket, where scale[i] - scale[i-1] is bucket i's
// share of the data. Selecting "the first bucket whose scale
// entry exceeds a uniform draw" is inverse-CDF sampling and is
// implemented as a binary search.

use serde::{Deserialize, Serialize};

use crate::domain::topology::DecoderTopology;

/// One length-capacity class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bucket {
    pub max_source_len: usize,
    pub max_target_len: usize,
}

impl Bucket {
    pub const fn new(max_source_len: usize, max_target_len: usize) -> Self {
        Self { max_source_len, max_target_len }
    }

    /// Does an example with these lengths fit in this bucket?
    pub fn fits(&self, source_len: usize, target_len: usize) -> bool {
        source_len <= self.max_source_len && target_len <= self.max_target_len
    }
}

const FLAT_BUCKETS: [Bucket; 6] = [
    Bucket::new(5, 5),
    Bucket::new(10, 10),
    Bucket::new(15, 15),
    Bucket::new(20, 20),
    Bucket::new(30, 30),
    Bucket::new(40, 40),
];

const TREE_BUCKETS: [Bucket; 6] = [
    Bucket::new(5, 10),
    Bucket::new(10, 20),
    Bucket::new(15, 30),
    Bucket::new(20, 40),
    Bucket::new(30, 50),
    Bucket::new(40, 66),
];

/// The ordered bucket list for a decoder topology. Ordered by
/// strictly increasing capacity on both axes.
pub fn buckets_for(topology: DecoderTopology) -> &'static [Bucket] {
    match topology {
        DecoderTopology::Flat => &FLAT_BUCKETS,
        DecoderTopology::Tree => &TREE_BUCKETS,
    }
}

/// Build the cumulative sampling scale from bucket populations.
/// Returns an all-zero scale for an empty dataset (callers must
/// not sample from one).
pub fn sampling_scale(bucket_sizes: &[usize]) -> Vec<f64> {
    let total: usize = bucket_sizes.iter().sum();
    if total == 0 {
        return vec![0.0; bucket_sizes.len()];
    }
    let mut running = 0usize;
    bucket_sizes
        .iter()
        .map(|&n| {
            running += n;
            running as f64 / total as f64
        })
        .collect()
}

/// Inverse-CDF bucket draw: the first bucket whose cumulative
/// scale value exceeds `draw` (a uniform sample from [0,1)).
pub fn sample_bucket(scale: &[f64], draw: f64) -> usize {
    debug_assert!(!scale.is_empty());
    scale
        .partition_point(|&p| p <= draw)
        .min(scale.len().saturating_sub(1))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bucket_lists_are_increasing() {
        for topology in [DecoderTopology::Flat, DecoderTopology::Tree] {
            let buckets = buckets_for(topology);
            for pair in buckets.windows(2) {
                assert!(pair[0].max_source_len < pair[1].max_source_len);
                assert!(pair[0].max_target_len < pair[1].max_target_len);
            }
        }
    }

    #[test]
    fn test_scale_is_cumulative_and_ends_at_one() {
        let scale = sampling_scale(&[10, 20, 30, 40]);
        assert_eq!(scale, vec![0.1, 0.3, 0.6, 1.0]);
        for pair in scale.windows(2) {
            assert!(pair[0] <= pair[1]);
        }
        assert!((scale.last().unwrap() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_scale_increments_match_populations() {
        let sizes = [5usize, 0, 15, 30];
        let total: usize = sizes.iter().sum();
        let scale = sampling_scale(&sizes);
        let mut prev = 0.0;
        for (i, &s) in scale.iter().enumerate() {
            let share = sizes[i] as f64 / total as f64;
            assert!((s - prev - share).abs() < 1e-12);
            prev = s;
        }
    }

    #[test]
    fn test_inverse_cdf_draw_selects_expected_bucket() {
        let scale = sampling_scale(&[10, 20, 30, 40]);
        assert_eq!(sample_bucket(&scale, 0.25), 1);
        assert_eq!(sample_bucket(&scale, 0.95), 3);
        assert_eq!(sample_bucket(&scale, 0.0), 0);
        // a draw of exactly 1.0 cannot happen from [0,1) but must
        // still land on a valid index
        assert_eq!(sample_bucket(&scale, 1.0), 3);
    }

    #[test]
    fn test_draw_skips_empty_buckets() {
        // bucket 1 is empty: its scale entry equals bucket 0's,
        // so no draw in [0,1) can select it
        let scale = sampling_scale(&[10, 0, 30]);
        for draw in [0.0, 0.2, 0.2499, 0.25, 0.6, 0.999] {
            assert_ne!(sample_bucket(&scale, draw), 1);
        }
    }
}
