// ============================================================
// Layer 4 — Batch Materializer
// ============================================================
// Turns one bucket of a DatasetSplit into a fixed-shape batch:
// `batch_size` examples drawn uniformly *with replacement* and
// padded to the bucket's (max_source_len, max_target_len).
//
// Padding conventions (the model adapter relies on these):
//
//   source   — right-padded with _PAD; for the flat topology
//              the whole padded sequence is then reversed, so
//              the recurrent encoder reads the description
//              back to front (shortens the gradient path from
//              the first source words to the first decoded
//              tokens; Sutskever et al. 2014)
//
//   target   — framed twice: decoder input  = _GO  + target
//                            decoder output = target + _EOS
//              both right-padded with _PAD. The loss masks
//              _PAD positions, so overlength padding is free.
//
// A batch is ephemeral: built fresh per step, consumed by that
// step, never shared. All fields are plain CPU vectors — the
// model adapter is the only place tensors exist.

use anyhow::{bail, Result};
use rand::Rng;

use crate::data::dataset::DatasetSplit;
use crate::data::vocab::{EOS_ID, GO_ID, PAD_ID};

/// A fixed-shape batch for one bucket.
#[derive(Debug, Clone)]
pub struct Batch {
    pub bucket_id: usize,
    /// [batch_size][max_source_len] — padded (and possibly reversed) ids
    pub source_ids: Vec<Vec<u32>>,
    /// [batch_size][max_target_len] — _GO-prefixed decoder inputs
    pub target_input_ids: Vec<Vec<u32>>,
    /// [batch_size][max_target_len] — _EOS-terminated decoder outputs
    pub target_output_ids: Vec<Vec<u32>>,
}

impl Batch {
    pub fn batch_size(&self) -> usize {
        self.source_ids.len()
    }
}

/// Samples and pads batches with one topology's conventions.
#[derive(Debug, Clone)]
pub struct BatchMaterializer {
    batch_size: usize,
    /// Reverse source sequences after padding (flat topology)
    reverse_source: bool,
}

impl BatchMaterializer {
    pub fn new(batch_size: usize, reverse_source: bool) -> Self {
        Self { batch_size, reverse_source }
    }

    /// Whether this materializer's source convention is reversed.
    /// Single-example decoding must mirror it exactly.
    pub fn reverses_source(&self) -> bool {
        self.reverse_source
    }

    /// Materialize one batch from `split`'s bucket `bucket_id`.
    ///
    /// Requesting an empty bucket is a caller error — the
    /// allocator's sampling scale never selects one, and the
    /// validation pass skips them explicitly.
    pub fn materialize<R: Rng>(
        &self,
        split: &DatasetSplit,
        bucket_id: usize,
        rng: &mut R,
    ) -> Result<Batch> {
        let bucket = split.buckets()[bucket_id];
        let examples = split.bucket_examples(bucket_id);
        if examples.is_empty() {
            bail!("Cannot materialize a batch from empty bucket {bucket_id}");
        }

        let mut source_ids = Vec::with_capacity(self.batch_size);
        let mut target_input_ids = Vec::with_capacity(self.batch_size);
        let mut target_output_ids = Vec::with_capacity(self.batch_size);

        for _ in 0..self.batch_size {
            let example = &examples[rng.gen_range(0..examples.len())];

            // ── Source: right-pad, then reverse if required ──────────────────
            let mut source = example.source_ids.clone();
            source.resize(bucket.max_source_len, PAD_ID);
            if self.reverse_source {
                source.reverse();
            }

            // ── Target input: _GO + target ───────────────────────────────────
            let mut input = Vec::with_capacity(bucket.max_target_len);
            input.push(GO_ID);
            input.extend_from_slice(&example.target_ids);
            input.truncate(bucket.max_target_len);
            input.resize(bucket.max_target_len, PAD_ID);

            // ── Target output: target + _EOS ─────────────────────────────────
            let mut output = example.target_ids.clone();
            output.push(EOS_ID);
            output.truncate(bucket.max_target_len);
            output.resize(bucket.max_target_len, PAD_ID);

            source_ids.push(source);
            target_input_ids.push(input);
            target_output_ids.push(output);
        }

        Ok(Batch { bucket_id, source_ids, target_input_ids, target_output_ids })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::buckets::Bucket;
    use crate::domain::example::Example;

    fn one_example_split() -> DatasetSplit {
        DatasetSplit::allocate(
            vec![Example::new(vec![10, 11, 12], vec![20, 21])],
            &[Bucket::new(5, 5)],
        )
    }

    #[test]
    fn test_shapes_are_deterministic_per_bucket() {
        let split = one_example_split();
        let mat = BatchMaterializer::new(4, false);
        let batch = mat.materialize(&split, 0, &mut rand::thread_rng()).unwrap();
        assert_eq!(batch.batch_size(), 4);
        for row in &batch.source_ids {
            assert_eq!(row.len(), 5);
        }
        for row in batch.target_input_ids.iter().chain(&batch.target_output_ids) {
            assert_eq!(row.len(), 5);
        }
    }

    #[test]
    fn test_source_pad_then_reverse() {
        let split = one_example_split();
        let mat = BatchMaterializer::new(1, true);
        let batch = mat.materialize(&split, 0, &mut rand::thread_rng()).unwrap();
        // [10,11,12] → pad to [10,11,12,PAD,PAD] → reverse
        assert_eq!(batch.source_ids[0], vec![PAD_ID, PAD_ID, 12, 11, 10]);
    }

    #[test]
    fn test_target_framing() {
        let split = one_example_split();
        let mat = BatchMaterializer::new(1, false);
        let batch = mat.materialize(&split, 0, &mut rand::thread_rng()).unwrap();
        assert_eq!(batch.target_input_ids[0], vec![GO_ID, 20, 21, PAD_ID, PAD_ID]);
        assert_eq!(batch.target_output_ids[0], vec![20, 21, EOS_ID, PAD_ID, PAD_ID]);
    }

    #[test]
    fn test_empty_bucket_request_is_an_error() {
        let split = DatasetSplit::allocate(Vec::new(), &[Bucket::new(5, 5)]);
        let mat = BatchMaterializer::new(2, false);
        assert!(mat.materialize(&split, 0, &mut rand::thread_rng()).is_err());
    }
}
