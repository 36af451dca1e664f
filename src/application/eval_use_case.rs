// ============================================================
// Layer 2 — EvalUseCase
// ============================================================
// Measures translation quality of the newest checkpoint on the
// dev split. Every example is greedy-decoded and scored twice:
//
//   exact match    — prediction token-for-token equal
//   template match — prediction equal after masking literal
//                    arguments with placeholder categories
//
// Reported as corpus percentages. Evaluation never trains and
// never mutates the checkpoint directory.

use std::path::Path;

use anyhow::Result;

use crate::application::train_use_case::{restore_model, TrainConfig};
use crate::data::buckets::buckets_for;
use crate::data::dataset::DatasetSplit;
use crate::data::loader::IdFileLoader;
use crate::data::vocab::load_vocab;
use crate::domain::traits::ExampleSource;
use crate::infra::checkpoint::CheckpointManager;
use crate::ml::inferencer::decode_split;
use crate::ml::scorer::{score, EvalCounts};

/// Corpus accuracies in percent.
#[derive(Debug, Clone, Copy)]
pub struct EvalReport {
    pub template_accuracy: f64,
    pub exact_accuracy: f64,
    pub examples: usize,
}

pub struct EvalUseCase {
    config: TrainConfig,
}

impl EvalUseCase {
    pub fn from_model_dir(model_dir: &str) -> Result<Self> {
        let ckpt = CheckpointManager::new(model_dir);
        let config: TrainConfig = ckpt.load_config()?;
        Ok(Self { config })
    }

    pub fn new(config: TrainConfig) -> Self {
        Self { config }
    }

    /// Decode and score the dev split.
    pub fn execute(&self) -> Result<EvalReport> {
        let cfg = &self.config;
        let (nl_vocab, cm_vocab) = load_vocab(Path::new(&cfg.data_dir))?;

        let loader = IdFileLoader::new(&cfg.data_dir, cfg.topology);
        let dev_pairs = loader.load_split("dev")?;
        let dev_set = DatasetSplit::allocate(dev_pairs, buckets_for(cfg.topology));

        let mut model = restore_model(cfg)?;
        let decoded = decode_split(model.as_mut(), &dev_set, &nl_vocab, &cm_vocab, false)?;

        let mut counts = EvalCounts::default();
        for item in &decoded {
            counts.add(score(cfg.topology, &item.predicted, &item.reference));
        }

        let report = EvalReport {
            template_accuracy: counts.template_accuracy(),
            exact_accuracy: counts.exact_accuracy(),
            examples: counts.examples,
        };
        println!(
            "{} examples: {:.2}% template match, {:.2}% exact match",
            report.examples, report.template_accuracy, report.exact_accuracy
        );
        Ok(report)
    }
}
