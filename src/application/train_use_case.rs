// ============================================================
// Layer 2 — TrainUseCase
// ============================================================
// Orchestrates one full training run in order:
//
//   Step 1: Load vocabularies           (Layer 4 - data)
//   Step 2: Load train/dev id files     (Layer 4 - data)
//   Step 3: (sample-train only) subsample the training split
//   Step 4: Allocate length buckets     (Layer 4 - data)
//   Step 5: Build the model adapter     (Layer 5 - ml)
//   Step 6: Restore latest checkpoint if one exists
//   Step 7: Save config for decoding    (Layer 6 - infra)
//   Step 8: Run the training loop       (Layer 5 - ml)

use anyhow::Result;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

use crate::data::buckets::buckets_for;
use crate::data::dataset::DatasetSplit;
use crate::data::loader::IdFileLoader;
use crate::data::vocab::load_vocab;
use crate::domain::topology::DecoderTopology;
use crate::domain::traits::ExampleSource;
use crate::infra::checkpoint::CheckpointManager;
use crate::infra::metrics::MetricsLogger;
use crate::ml::adapter::{AdapterConfig, CommandModel, FlatSequenceModel, TreeStructuredModel};
use crate::ml::model::Seq2SeqConfig;
use crate::ml::trainer::{run_training, TrainOutcome, TrainSchedule};

// One backend for the whole binary: WGPU with autodiff on top.
// Forward-only passes simply never call backward.
pub type TrainBackend = burn::backend::Autodiff<burn::backend::Wgpu>;

// ─── Training Configuration ──────────────────────────────────────────────────
// All hyperparameters of one run. Immutable once constructed,
// serialisable so decoding can rebuild the same architecture.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainConfig {
    pub data_dir:  String,
    pub model_dir: String,
    pub topology:  DecoderTopology,

    pub d_model:    usize,
    pub num_heads:  usize,
    pub num_layers: usize,
    pub d_ff:       usize,
    pub dropout:    f64,

    pub batch_size: usize,
    pub learning_rate: f64,
    pub learning_rate_decay_factor: f64,
    pub num_epochs: usize,
    pub steps_per_epoch: usize,
    pub epochs_per_checkpoint: usize,
    pub seed: u64,
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self {
            data_dir:  "data".to_string(),
            model_dir: "model".to_string(),
            topology:  DecoderTopology::Flat,
            d_model:    256,
            num_heads:  8,
            num_layers: 2,
            d_ff:       1024,
            dropout:    0.1,
            batch_size: 64,
            learning_rate: 1e-3,
            learning_rate_decay_factor: 0.9,
            num_epochs: 20,
            steps_per_epoch: 200,
            epochs_per_checkpoint: 1,
            seed: 42,
        }
    }
}

impl TrainConfig {
    pub fn schedule(&self) -> TrainSchedule {
        TrainSchedule {
            num_epochs: self.num_epochs,
            steps_per_epoch: self.steps_per_epoch,
            epochs_per_checkpoint: self.epochs_per_checkpoint,
        }
    }
}

/// Build a fresh model adapter for the configured topology.
/// The network is sized to the topology's largest bucket and to
/// the loaded vocabularies.
pub fn build_model(
    cfg: &TrainConfig,
    source_vocab_size: usize,
    target_vocab_size: usize,
) -> Box<dyn CommandModel> {
    let buckets = buckets_for(cfg.topology);
    let largest = buckets[buckets.len() - 1];

    let model_cfg = Seq2SeqConfig::new(
        source_vocab_size,
        target_vocab_size,
        largest.max_source_len,
        largest.max_target_len,
        cfg.d_model,
        cfg.num_heads,
        cfg.num_layers,
        cfg.d_ff,
        cfg.dropout,
    );
    let adapter_cfg = AdapterConfig {
        batch_size: cfg.batch_size,
        learning_rate: cfg.learning_rate,
        learning_rate_decay_factor: cfg.learning_rate_decay_factor,
        seed: cfg.seed,
    };
    let device = burn::backend::wgpu::WgpuDevice::default();

    match cfg.topology {
        DecoderTopology::Flat => Box::new(FlatSequenceModel::<TrainBackend>::new(
            &model_cfg,
            &adapter_cfg,
            device,
        )),
        DecoderTopology::Tree => Box::new(TreeStructuredModel::<TrainBackend>::new(
            &model_cfg,
            &adapter_cfg,
            device,
        )),
    }
}

/// Build a model and restore the newest checkpoint into it.
/// Fails with a clear error when no checkpoint exists — decode
/// and eval must not run against random weights.
pub fn restore_model(cfg: &TrainConfig) -> Result<Box<dyn CommandModel>> {
    let data_dir = std::path::Path::new(&cfg.data_dir);
    let (nl_vocab, cm_vocab) = load_vocab(data_dir)?;

    let ckpt = CheckpointManager::new(&cfg.model_dir);
    // surface the missing-checkpoint error before building tensors
    ckpt.latest_epoch()?;

    let mut model = build_model(cfg, nl_vocab.len(), cm_vocab.len());
    model.restore(&ckpt)?;
    Ok(model)
}

// ─── TrainUseCase ─────────────────────────────────────────────────────────────
pub struct TrainUseCase {
    config: TrainConfig,
    /// sample-train mode: train on this many uniformly sampled
    /// training examples instead of the full split
    sample_size: Option<usize>,
}

impl TrainUseCase {
    pub fn new(config: TrainConfig) -> Self {
        Self { config, sample_size: None }
    }

    pub fn with_sample_size(config: TrainConfig, sample_size: usize) -> Self {
        Self { config, sample_size: Some(sample_size) }
    }

    /// Execute the full training pipeline end to end.
    pub fn execute(&self) -> Result<TrainOutcome> {
        let cfg = &self.config;
        let data_dir = std::path::Path::new(&cfg.data_dir);

        // ── Step 1: Vocabularies ──────────────────────────────────────────────
        let (nl_vocab, cm_vocab) = load_vocab(data_dir)?;

        // ── Step 2: Load id files ─────────────────────────────────────────────
        let loader = IdFileLoader::new(&cfg.data_dir, cfg.topology);
        let mut train_pairs = loader.load_split("train")?;
        let dev_pairs = loader.load_split("dev")?;

        // ── Step 3: Optional subsample ────────────────────────────────────────
        if let Some(n) = self.sample_size {
            let mut rng = rand::thread_rng();
            train_pairs = train_pairs
                .choose_multiple(&mut rng, n)
                .cloned()
                .collect();
            tracing::info!("Sampled training subset of {} examples", train_pairs.len());
        }

        // ── Step 4: Bucket allocation ─────────────────────────────────────────
        let buckets = buckets_for(cfg.topology);
        let train_set = DatasetSplit::allocate(train_pairs, buckets);
        let dev_set = DatasetSplit::allocate(dev_pairs, buckets);
        tracing::info!(
            "Bucketed {} train / {} dev examples ({} topology)",
            train_set.len(),
            dev_set.len(),
            cfg.topology
        );

        // ── Step 5: Model adapter ─────────────────────────────────────────────
        let mut model = build_model(cfg, nl_vocab.len(), cm_vocab.len());

        // ── Step 6: Resume from the newest checkpoint, if any ─────────────────
        let ckpt = CheckpointManager::new(&cfg.model_dir);
        if ckpt.has_checkpoint() {
            model.restore(&ckpt)?;
            tracing::info!("Resuming from global epoch {}", model.global_epoch());
        }

        // ── Step 7: Persist the configuration for decode/eval ─────────────────
        ckpt.save_config(cfg)?;
        let metrics = MetricsLogger::new(&cfg.model_dir)?;

        // ── Step 8: Training loop ─────────────────────────────────────────────
        let outcome = run_training(
            &cfg.schedule(),
            model.as_mut(),
            &train_set,
            &dev_set,
            &ckpt,
            &metrics,
        )?;

        match outcome {
            TrainOutcome::Completed => tracing::info!("Training completed"),
            TrainOutcome::EarlyStopped => {
                tracing::warn!("Training early-stopped on validation regression")
            }
        }
        Ok(outcome)
    }
}
