// ============================================================
// Layer 1 — CLI Commands and Arguments
// ============================================================
// Defines the eight run modes and all their configurable flags.
//
// clap's derive macros automatically generate:
//   - help text (--help)
//   - error messages for missing args
//   - type conversion (string → usize, f64, etc.)
//
// The decoder topology is deliberately taken as a plain string
// and parsed at the Layer 1/2 boundary, so a typo fails with the
// domain's own "Unrecognized decoder topology" error.
//
// Reference: Rust Book §12 (Building a CLI Program)

use std::str::FromStr;

use anyhow::Result;
use clap::{Args, Subcommand};

use crate::application::train_use_case::TrainConfig;
use crate::domain::topology::DecoderTopology;

/// The top-level run modes available to the user
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Train a translation model on the full training split
    Train(TrainArgs),

    /// Train on a uniformly sampled subset of the training split
    SampleTrain(SampleTrainArgs),

    /// Decode the dev split with a trained model, printing each prediction
    Decode(ModelArgs),

    /// Decode task descriptions typed on stdin, one per line
    Interactive(ModelArgs),

    /// Score a trained model on the dev split (template + exact match)
    Eval(ModelArgs),

    /// Encode the tokenized text corpus into the id files the trainer reads
    ProcessData(DataArgs),

    /// Report per-split corpus statistics
    Stats(StatsArgs),

    /// Cartesian hyperparameter search over train + eval trials
    GridSearch(GridSearchArgs),
}

/// All arguments for the `train` command.
/// Each field becomes a --flag on the command line.
#[derive(Args, Debug)]
pub struct TrainArgs {
    /// Directory containing the vocabulary and id files
    #[arg(long, default_value = "data")]
    pub data_dir: String,

    /// Directory to save model checkpoints and metrics
    #[arg(long, default_value = "model")]
    pub model_dir: String,

    /// Decoder topology: "flat" or "tree"
    #[arg(long, default_value = "flat")]
    pub topology: String,

    /// Hidden dimension of the transformer (d_model in the paper)
    #[arg(long, default_value_t = 256)]
    pub d_model: usize,

    /// Number of attention heads in multi-head attention
    /// d_model must be divisible by num_heads
    #[arg(long, default_value_t = 8)]
    pub num_heads: usize,

    /// Number of stacked encoder and decoder layers
    #[arg(long, default_value_t = 2)]
    pub num_layers: usize,

    /// Inner dimension of the feed-forward network
    #[arg(long, default_value_t = 1024)]
    pub d_ff: usize,

    /// Dropout probability during training
    #[arg(long, default_value_t = 0.1)]
    pub dropout: f64,

    /// Number of examples per optimizer step
    #[arg(long, default_value_t = 64)]
    pub batch_size: usize,

    /// Initial learning rate — decayed when training loss stagnates
    #[arg(long, default_value_t = 1e-3)]
    pub learning_rate: f64,

    /// Multiplier applied to the learning rate on stagnation
    #[arg(long, default_value_t = 0.9)]
    pub learning_rate_decay_factor: f64,

    /// Number of training epochs
    #[arg(long, default_value_t = 20)]
    pub num_epochs: usize,

    /// Optimizer steps per epoch
    #[arg(long, default_value_t = 200)]
    pub steps_per_epoch: usize,

    /// Checkpoint (and validate) every this many epochs
    #[arg(long, default_value_t = 1)]
    pub epochs_per_checkpoint: usize,

    /// Seed for weight initialization and batch sampling
    #[arg(long, default_value_t = 42)]
    pub seed: u64,
}

impl TrainArgs {
    /// Convert CLI args into the application-layer TrainConfig.
    /// This is the boundary between Layer 1 and Layer 2 —
    /// the application layer never sees clap types. Fails when
    /// the topology string is not a known topology.
    pub fn into_config(self) -> Result<TrainConfig> {
        Ok(TrainConfig {
            data_dir:  self.data_dir,
            model_dir: self.model_dir,
            topology:  DecoderTopology::from_str(&self.topology)?,
            d_model:    self.d_model,
            num_heads:  self.num_heads,
            num_layers: self.num_layers,
            d_ff:       self.d_ff,
            dropout:    self.dropout,
            batch_size: self.batch_size,
            learning_rate: self.learning_rate,
            learning_rate_decay_factor: self.learning_rate_decay_factor,
            num_epochs: self.num_epochs,
            steps_per_epoch: self.steps_per_epoch,
            epochs_per_checkpoint: self.epochs_per_checkpoint,
            seed: self.seed,
        })
    }
}

/// `sample-train` — everything `train` takes, plus a subset size
#[derive(Args, Debug)]
pub struct SampleTrainArgs {
    #[command(flatten)]
    pub train: TrainArgs,

    /// Number of training examples to sample uniformly
    #[arg(long, default_value_t = 200)]
    pub sample_size: usize,
}

/// Arguments for the modes that only load a trained model
#[derive(Args, Debug)]
pub struct ModelArgs {
    /// Checkpoint directory of a previous training run
    #[arg(long, default_value = "model")]
    pub model_dir: String,
}

/// Arguments for `process-data`
#[derive(Args, Debug)]
pub struct DataArgs {
    /// Directory containing vocab.nl, vocab.cm and the {split}.nl /
    /// {split}.cm token files
    #[arg(long, default_value = "data")]
    pub data_dir: String,
}

/// Arguments for `stats`
#[derive(Args, Debug)]
pub struct StatsArgs {
    /// Directory containing the id files
    #[arg(long, default_value = "data")]
    pub data_dir: String,

    /// Which topology's target files to count: "flat" or "tree"
    #[arg(long, default_value = "flat")]
    pub topology: String,
}

/// Arguments for `grid-search`
#[derive(Args, Debug)]
pub struct GridSearchArgs {
    #[command(flatten)]
    pub train: TrainArgs,

    /// Comma-separated hyperparameter names to tune,
    /// e.g. "learning_rate,d_model"
    #[arg(long)]
    pub tuning: String,

    /// Repeat each grid cell with 5 random seeds to measure
    /// sensitivity to weight initialization
    #[arg(long, default_value_t = false)]
    pub initialization: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_args() -> TrainArgs {
        TrainArgs {
            data_dir: "data".into(),
            model_dir: "model".into(),
            topology: "tree".into(),
            d_model: 128,
            num_heads: 4,
            num_layers: 1,
            d_ff: 512,
            dropout: 0.0,
            batch_size: 16,
            learning_rate: 1e-3,
            learning_rate_decay_factor: 0.9,
            num_epochs: 2,
            steps_per_epoch: 10,
            epochs_per_checkpoint: 1,
            seed: 7,
        }
    }

    #[test]
    fn test_topology_string_is_parsed_at_the_boundary() {
        let cfg = base_args().into_config().unwrap();
        assert_eq!(cfg.topology, DecoderTopology::Tree);
        assert_eq!(cfg.batch_size, 16);
    }

    #[test]
    fn test_unknown_topology_is_rejected() {
        let mut args = base_args();
        args.topology = "graph".into();
        let err = args.into_config().unwrap_err();
        assert!(err.to_string().contains("Unrecognized decoder topology"));
    }
}
