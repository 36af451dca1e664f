// ============================================================
// Layer 5 — Model Adapters
// ============================================================
// The polymorphic seam between the training loop and the
// network. A `CommandModel` exposes exactly the capability set
// the loop needs — step, get_batch, persist, restore — plus
// learning-rate control and greedy decoding for the drivers.
//
// Two concrete variants:
//
//   FlatSequenceModel  — symmetric buckets, source sequences
//                        reversed before encoding, targets are
//                        plain command token sequences
//   TreeStructuredModel — asymmetric buckets (tree skeletons
//                        are longer than commands), source kept
//                        in reading order, targets are
//                        linearized skeletons
//
// Both are thin wrappers over one shared `Seq2SeqCore` — a
// trait with shared contracts and per-variant bucket-shape
// assumptions, not a base class with overrides. Adapters are
// driven from a single thread; `step` mutates parameters only
// when `forward_only` is false.

use anyhow::Result;
use burn::{
    optim::{adaptor::OptimizerAdaptor, Adam, AdamConfig, GradientsParams, Optimizer},
    prelude::*,
    tensor::backend::AutodiffBackend,
};
use rand::{rngs::StdRng, SeedableRng};

use crate::data::batcher::{Batch, BatchMaterializer};
use crate::data::buckets::{buckets_for, Bucket};
use crate::data::dataset::DatasetSplit;
use crate::data::vocab::{EOS_ID, GO_ID, PAD_ID};
use crate::domain::topology::DecoderTopology;
use crate::infra::checkpoint::CheckpointManager;
use crate::ml::model::{Seq2SeqConfig, Seq2SeqModel};

/// What one `step` call hands back to the caller.
#[derive(Debug, Clone)]
pub struct StepOutput {
    /// Mean batch loss, measured before any parameter update
    pub loss: f64,
    /// Per-example argmax token ids, present on forward-only passes
    pub predictions: Option<Vec<Vec<u32>>>,
}

/// The model adapter capability set shared by both topologies.
pub trait CommandModel {
    fn topology(&self) -> DecoderTopology;

    /// The bucket shapes this variant was built for.
    fn buckets(&self) -> &[Bucket];

    /// Materialize one batch with this variant's padding convention.
    fn get_batch(&mut self, split: &DatasetSplit, bucket_id: usize) -> Result<Batch>;

    /// One optimizer update (`forward_only=false`) or one pure
    /// forward pass (`forward_only=true`, no parameter mutation).
    fn step(&mut self, batch: &Batch, bucket_id: usize, forward_only: bool)
        -> Result<StepOutput>;

    /// Autoregressive greedy decode of a single description.
    fn decode_greedy(&self, source_ids: &[u32]) -> Result<Vec<u32>>;

    fn learning_rate(&self) -> f64;
    fn decay_learning_rate(&mut self);

    /// Global epoch counter carried across checkpoint restarts.
    fn global_epoch(&self) -> usize;

    fn persist(&mut self, ckpt: &CheckpointManager, epoch: usize) -> Result<()>;
    fn restore(&mut self, ckpt: &CheckpointManager) -> Result<()>;
}

/// Hyperparameters an adapter needs beyond the network config.
#[derive(Debug, Clone)]
pub struct AdapterConfig {
    pub batch_size: usize,
    pub learning_rate: f64,
    pub learning_rate_decay_factor: f64,
    pub seed: u64,
}

// ─── Shared core ──────────────────────────────────────────────────────────────
// Owns the network, the optimizer state, the learning rate and
// the global epoch counter — the Model State of one run.
struct Seq2SeqCore<B: AutodiffBackend> {
    model: Seq2SeqModel<B>,
    optimizer: OptimizerAdaptor<Adam, Seq2SeqModel<B>, B>,
    device: B::Device,
    materializer: BatchMaterializer,
    buckets: &'static [Bucket],
    learning_rate: f64,
    decay_factor: f64,
    global_epoch: usize,
    rng: StdRng,
}

impl<B: AutodiffBackend> Seq2SeqCore<B> {
    fn new(
        topology: DecoderTopology,
        model_cfg: &Seq2SeqConfig,
        adapter_cfg: &AdapterConfig,
        device: B::Device,
    ) -> Self {
        let buckets = buckets_for(topology);
        let reverse_source = topology == DecoderTopology::Flat;
        Self {
            model: model_cfg.init(&device),
            optimizer: AdamConfig::new().with_epsilon(1e-8).init(),
            device,
            materializer: BatchMaterializer::new(adapter_cfg.batch_size, reverse_source),
            buckets,
            learning_rate: adapter_cfg.learning_rate,
            decay_factor: adapter_cfg.learning_rate_decay_factor,
            global_epoch: 0,
            rng: StdRng::seed_from_u64(adapter_cfg.seed),
        }
    }

    fn get_batch(&mut self, split: &DatasetSplit, bucket_id: usize) -> Result<Batch> {
        self.materializer.materialize(split, bucket_id, &mut self.rng)
    }

    fn step(&mut self, batch: &Batch, forward_only: bool) -> Result<StepOutput> {
        let source = self.int_tensor(&batch.source_ids);
        let target_input = self.int_tensor(&batch.target_input_ids);
        let target_output = self.int_tensor(&batch.target_output_ids);

        let (loss, logits) = self
            .model
            .forward_loss(source, target_input, target_output);
        let loss_value: f64 = loss.clone().into_scalar().elem::<f64>();

        if forward_only {
            return Ok(StepOutput {
                loss: loss_value,
                predictions: Some(argmax_ids(logits)),
            });
        }

        // Backward pass + Adam update
        let grads = loss.backward();
        let grads = GradientsParams::from_grads(grads, &self.model);
        self.model = self
            .optimizer
            .step(self.learning_rate, self.model.clone(), grads);

        Ok(StepOutput { loss: loss_value, predictions: None })
    }

    /// Greedy decode: feed the running prefix back in until _EOS
    /// or the largest bucket's target capacity is reached.
    fn decode_greedy(&self, source_ids: &[u32]) -> Result<Vec<u32>> {
        let largest = self.buckets[self.buckets.len() - 1];

        let mut source = source_ids.to_vec();
        source.truncate(largest.max_source_len);
        source.resize(largest.max_source_len, PAD_ID);
        if self.materializer.reverses_source() {
            source.reverse();
        }

        let source = self.int_tensor(&[source]);
        let memory = self.model.encode(source);

        let mut prefix: Vec<u32> = vec![GO_ID];
        let mut decoded: Vec<u32> = Vec::new();

        for _ in 0..largest.max_target_len {
            let target_input = self.int_tensor(&[prefix.clone()]);
            let logits = self.model.decode(target_input, memory.clone());
            let [_, len, vocab] = logits.dims();

            let next: i64 = logits
                .slice([0..1, len - 1..len, 0..vocab])
                .argmax(2)
                .into_scalar()
                .elem::<i64>();
            let next = next as u32;

            if next == EOS_ID {
                break;
            }
            decoded.push(next);
            prefix.push(next);
        }
        Ok(decoded)
    }

    fn persist(&mut self, ckpt: &CheckpointManager, epoch: usize) -> Result<()> {
        ckpt.save_model(self.model.clone(), epoch)?;
        self.global_epoch = epoch;
        Ok(())
    }

    fn restore(&mut self, ckpt: &CheckpointManager) -> Result<()> {
        let (model, epoch) = ckpt.load_model(self.model.clone(), &self.device)?;
        self.model = model;
        self.global_epoch = epoch;
        Ok(())
    }

    /// Rows of equal length → one [rows, cols] Int tensor.
    fn int_tensor<S: AsRef<[u32]>>(&self, rows: &[S]) -> Tensor<B, 2, Int> {
        let cols = rows[0].as_ref().len();
        let flat: Vec<i32> = rows
            .iter()
            .flat_map(|row| row.as_ref().iter().map(|&x| x as i32))
            .collect();
        Tensor::<B, 1, Int>::from_ints(flat.as_slice(), &self.device)
            .reshape([rows.len(), cols])
    }
}

/// [batch, tgt_len, vocab] logits → per-example argmax id rows.
fn argmax_ids<B: Backend>(logits: Tensor<B, 3>) -> Vec<Vec<u32>> {
    let [batch_size, tgt_len, _] = logits.dims();
    let flat: Vec<i64> = logits
        .argmax(2)
        .reshape([batch_size * tgt_len])
        .into_data()
        .convert::<i64>()
        .to_vec()
        .unwrap_or_default();
    flat.chunks(tgt_len)
        .map(|row| row.iter().map(|&x| x as u32).collect())
        .collect()
}

// ─── Flat-sequence variant ────────────────────────────────────────────────────
/// Decodes the command as a flat token sequence. Symmetric
/// buckets, reversed source order.
pub struct FlatSequenceModel<B: AutodiffBackend> {
    core: Seq2SeqCore<B>,
}

impl<B: AutodiffBackend> FlatSequenceModel<B> {
    pub fn new(model_cfg: &Seq2SeqConfig, adapter_cfg: &AdapterConfig, device: B::Device) -> Self {
        Self {
            core: Seq2SeqCore::new(DecoderTopology::Flat, model_cfg, adapter_cfg, device),
        }
    }
}

// ─── Tree-structured variant ──────────────────────────────────────────────────
/// Decodes a serialized command-argument tree skeleton.
/// Asymmetric buckets: skeletons carry structural markers, so
/// the target side is longer than the source side.
pub struct TreeStructuredModel<B: AutodiffBackend> {
    core: Seq2SeqCore<B>,
}

impl<B: AutodiffBackend> TreeStructuredModel<B> {
    pub fn new(model_cfg: &Seq2SeqConfig, adapter_cfg: &AdapterConfig, device: B::Device) -> Self {
        Self {
            core: Seq2SeqCore::new(DecoderTopology::Tree, model_cfg, adapter_cfg, device),
        }
    }
}

macro_rules! delegate_command_model {
    ($variant:ident, $topology:expr) => {
        impl<B: AutodiffBackend> CommandModel for $variant<B> {
            fn topology(&self) -> DecoderTopology {
                $topology
            }

            fn buckets(&self) -> &[Bucket] {
                self.core.buckets
            }

            fn get_batch(&mut self, split: &DatasetSplit, bucket_id: usize) -> Result<Batch> {
                self.core.get_batch(split, bucket_id)
            }

            fn step(
                &mut self,
                batch: &Batch,
                _bucket_id: usize,
                forward_only: bool,
            ) -> Result<StepOutput> {
                self.core.step(batch, forward_only)
            }

            fn decode_greedy(&self, source_ids: &[u32]) -> Result<Vec<u32>> {
                self.core.decode_greedy(source_ids)
            }

            fn learning_rate(&self) -> f64 {
                self.core.learning_rate
            }

            fn decay_learning_rate(&mut self) {
                self.core.learning_rate *= self.core.decay_factor;
            }

            fn global_epoch(&self) -> usize {
                self.core.global_epoch
            }

            fn persist(&mut self, ckpt: &CheckpointManager, epoch: usize) -> Result<()> {
                self.core.persist(ckpt, epoch)
            }

            fn restore(&mut self, ckpt: &CheckpointManager) -> Result<()> {
                self.core.restore(ckpt)
            }
        }
    };
}

delegate_command_model!(FlatSequenceModel, DecoderTopology::Flat);
delegate_command_model!(TreeStructuredModel, DecoderTopology::Tree);
