// ============================================================
// Layer 5 — Training Loop
// ============================================================
// The epoch state machine: RUNNING → CHECKPOINTING → (RUNNING
// | STOPPED).
//
// Each epoch runs `steps_per_epoch` optimizer steps. For every
// step a bucket is drawn with probability proportional to its
// population (inverse-CDF search over the sampling scale), a
// batch is materialized for it, and the adapter takes one
// update step.
//
// Every `epochs_per_checkpoint` epochs — including the very
// first, so a fresh run checkpoints early — the loop:
//   1. averages the accumulated training loss and reports its
//      perplexity (saturating at +inf for loss > 300)
//   2. decays the learning rate when the training loss is worse
//      than all of the previous 3 recorded ones
//   3. persists the model, tagged with the global epoch
//   4. runs a forward-only validation batch per bucket,
//      skipping empty buckets with a warning
//   5. early-stops when the validation loss is worse than all
//      of the previous 3 recorded ones
//
// A restored model carries its global epoch counter, so a run
// that checkpointed at epoch E resumes at E+1 — never
// replaying or skipping an epoch.

use anyhow::Result;
use rand::Rng;

use crate::data::buckets::sample_bucket;
use crate::data::dataset::DatasetSplit;
use crate::data::vocab::PAD_ID;
use crate::infra::checkpoint::CheckpointManager;
use crate::infra::metrics::{CheckpointMetrics, MetricsLogger};
use crate::ml::adapter::CommandModel;
use crate::ml::monitor::{perplexity, ProgressMonitor};

/// How a training run ended.
///
/// An explicit enum rather than a bare bool: callers should not
/// have to remember which way "true" points. Early stop covers
/// both stagnation and divergence — the loop cannot tell them
/// apart from the loss trend alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrainOutcome {
    /// The configured epoch budget ran to completion
    Completed,
    /// Validation loss regressed; training halted early
    EarlyStopped,
}

/// The schedule knobs the loop needs (a slice of TrainConfig,
/// kept separate so the loop is testable without the full
/// application config).
#[derive(Debug, Clone)]
pub struct TrainSchedule {
    pub num_epochs: usize,
    pub steps_per_epoch: usize,
    pub epochs_per_checkpoint: usize,
}

pub fn run_training(
    schedule: &TrainSchedule,
    model: &mut dyn CommandModel,
    train_set: &DatasetSplit,
    dev_set: &DatasetSplit,
    ckpt: &CheckpointManager,
    metrics: &MetricsLogger,
) -> Result<TrainOutcome> {
    let scale = train_set.sampling_scale();
    let mut monitor = ProgressMonitor::new();
    let mut rng = rand::thread_rng();

    let start_epoch = model.global_epoch();
    let mut loss_sum = 0.0f64;
    let mut step_count = 0usize;

    for t in 0..schedule.num_epochs {
        let epoch = start_epoch + t + 1;
        tracing::info!("Epoch {}", epoch);

        // ── Training phase ────────────────────────────────────────────────────
        for _ in 0..schedule.steps_per_epoch {
            let draw: f64 = rng.gen::<f64>();
            let bucket_id = sample_bucket(&scale, draw);
            let batch = model.get_batch(train_set, bucket_id)?;
            let out = model.step(&batch, bucket_id, false)?;
            loss_sum += out.loss;
            step_count += 1;
        }

        if t % schedule.epochs_per_checkpoint != 0 {
            continue;
        }

        // ── Checkpointing phase ───────────────────────────────────────────────
        let train_loss = if step_count > 0 { loss_sum / step_count as f64 } else { 0.0 };
        let train_ppx = perplexity(train_loss);
        println!(
            "learning rate {:.4} epoch {} perplexity {:.2}",
            model.learning_rate(),
            epoch,
            train_ppx
        );

        monitor.record_training_loss(train_loss);
        if monitor.should_decay_lr() {
            model.decay_learning_rate();
            tracing::info!("Training loss regressed — learning rate decayed to {:.6}",
                model.learning_rate());
        }

        model.persist(ckpt, epoch)?;

        // ── Validation phase ──────────────────────────────────────────────────
        let (dev_loss, dev_token_acc) = validate(model, dev_set)?;
        let dev_ppx = perplexity(dev_loss);
        println!(
            "global epoch {} learning rate {:.4} dev_perplexity {:.2}",
            epoch,
            model.learning_rate(),
            dev_ppx
        );

        metrics.log(&CheckpointMetrics {
            epoch,
            learning_rate: model.learning_rate(),
            train_loss,
            train_ppx,
            dev_loss,
            dev_ppx,
            dev_token_acc,
        })?;

        monitor.record_validation_loss(dev_loss);
        if monitor.should_stop() {
            tracing::warn!("Validation loss regressed over the last 3 checkpoints — stopping");
            return Ok(TrainOutcome::EarlyStopped);
        }

        loss_sum = 0.0;
        step_count = 0;
    }

    Ok(TrainOutcome::Completed)
}

/// One forward-only batch per bucket. Empty buckets are skipped
/// with a warning and contribute zero loss, matching the
/// degenerate-case contract of the allocator.
fn validate(
    model: &mut dyn CommandModel,
    dev_set: &DatasetSplit,
) -> Result<(f64, f64)> {
    let bucket_count = model.buckets().len();
    let mut loss_sum = 0.0f64;
    let mut correct = 0usize;
    let mut total = 0usize;

    for bucket_id in 0..bucket_count {
        if dev_set.is_bucket_empty(bucket_id) {
            tracing::warn!("eval: empty bucket {}", bucket_id);
            continue;
        }
        let batch = model.get_batch(dev_set, bucket_id)?;
        let out = model.step(&batch, bucket_id, true)?;
        loss_sum += out.loss;
        println!("  eval: bucket {} perplexity {:.2}", bucket_id, perplexity(out.loss));

        // Token accuracy over non-padding target positions.
        if let Some(predictions) = out.predictions {
            for (pred_row, gold_row) in predictions.iter().zip(&batch.target_output_ids) {
                for (&p, &g) in pred_row.iter().zip(gold_row) {
                    if g == PAD_ID {
                        continue;
                    }
                    total += 1;
                    if p == g {
                        correct += 1;
                    }
                }
            }
        }
    }

    let dev_loss = loss_sum / bucket_count as f64;
    let token_acc = if total > 0 { correct as f64 / total as f64 } else { 0.0 };
    Ok((dev_loss, token_acc))
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
// The loop is exercised against a scripted stand-in model so the
// state machine is testable without a GPU or real gradients.
#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::batcher::Batch;
    use crate::data::buckets::Bucket;
    use crate::data::dataset::DatasetSplit;
    use crate::domain::example::Example;
    use crate::domain::topology::DecoderTopology;
    use crate::ml::adapter::StepOutput;

    struct ScriptedModel {
        buckets: Vec<Bucket>,
        dev_losses: Vec<f64>,
        dev_cursor: usize,
        train_steps: usize,
        persist_epochs: Vec<usize>,
        start_epoch: usize,
        lr: f64,
    }

    impl ScriptedModel {
        fn new(dev_losses: Vec<f64>) -> Self {
            Self {
                buckets: vec![Bucket::new(5, 5), Bucket::new(10, 10)],
                dev_losses,
                dev_cursor: 0,
                train_steps: 0,
                persist_epochs: Vec::new(),
                start_epoch: 0,
                lr: 0.5,
            }
        }
    }

    impl CommandModel for ScriptedModel {
        fn topology(&self) -> DecoderTopology {
            DecoderTopology::Flat
        }

        fn buckets(&self) -> &[Bucket] {
            &self.buckets
        }

        fn get_batch(&mut self, split: &DatasetSplit, bucket_id: usize) -> Result<Batch> {
            assert!(!split.is_bucket_empty(bucket_id));
            Ok(Batch {
                bucket_id,
                source_ids: vec![vec![0; 5]],
                target_input_ids: vec![vec![0; 5]],
                target_output_ids: vec![vec![0; 5]],
            })
        }

        fn step(
            &mut self,
            _batch: &Batch,
            _bucket_id: usize,
            forward_only: bool,
        ) -> Result<StepOutput> {
            if forward_only {
                let loss = self.dev_losses[self.dev_cursor.min(self.dev_losses.len() - 1)];
                self.dev_cursor += 1;
                Ok(StepOutput { loss, predictions: None })
            } else {
                self.train_steps += 1;
                Ok(StepOutput { loss: 1.0, predictions: None })
            }
        }

        fn decode_greedy(&self, _source_ids: &[u32]) -> Result<Vec<u32>> {
            Ok(Vec::new())
        }

        fn learning_rate(&self) -> f64 {
            self.lr
        }

        fn decay_learning_rate(&mut self) {
            self.lr *= 0.5;
        }

        fn global_epoch(&self) -> usize {
            self.start_epoch
        }

        fn persist(&mut self, _ckpt: &CheckpointManager, epoch: usize) -> Result<()> {
            self.persist_epochs.push(epoch);
            Ok(())
        }

        fn restore(&mut self, _ckpt: &CheckpointManager) -> Result<()> {
            Ok(())
        }
    }

    fn test_fixtures(name: &str) -> (DatasetSplit, DatasetSplit, CheckpointManager, MetricsLogger) {
        let buckets = [Bucket::new(5, 5), Bucket::new(10, 10)];
        let pairs = vec![Example::new(vec![4; 3], vec![5; 3]); 4];
        let train = DatasetSplit::allocate(pairs.clone(), &buckets);
        // dev bucket 1 stays empty on purpose — it must be skipped
        let dev = DatasetSplit::allocate(pairs, &buckets);
        let dir = std::env::temp_dir().join(format!("nl2cmd-trainer-{}-{name}", std::process::id()));
        std::fs::remove_dir_all(&dir).ok();
        let ckpt = CheckpointManager::new(&dir);
        let metrics = MetricsLogger::new(&dir).unwrap();
        (train, dev, ckpt, metrics)
    }

    #[test]
    fn test_completes_epoch_budget_when_loss_improves() {
        let (train, dev, ckpt, metrics) = test_fixtures("completes");
        // one dev loss per non-empty bucket per checkpoint, always improving
        let mut model = ScriptedModel::new((0..100).map(|i| 10.0 - i as f64 * 0.01).collect());
        let schedule = TrainSchedule {
            num_epochs: 5,
            steps_per_epoch: 3,
            epochs_per_checkpoint: 1,
        };

        let outcome =
            run_training(&schedule, &mut model, &train, &dev, &ckpt, &metrics).unwrap();
        assert_eq!(outcome, TrainOutcome::Completed);
        assert_eq!(model.train_steps, 5 * 3);
        assert_eq!(model.persist_epochs, vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn test_early_stops_on_validation_regression() {
        let (train, dev, ckpt, metrics) = test_fixtures("early-stop");
        // dev has 1 non-empty bucket → one scripted loss per checkpoint:
        // 5, 4, 3 then a clear regression
        let mut model = ScriptedModel::new(vec![5.0, 4.0, 3.0, 6.0, 6.0, 6.0]);
        let schedule = TrainSchedule {
            num_epochs: 10,
            steps_per_epoch: 2,
            epochs_per_checkpoint: 1,
        };

        let outcome =
            run_training(&schedule, &mut model, &train, &dev, &ckpt, &metrics).unwrap();
        assert_eq!(outcome, TrainOutcome::EarlyStopped);
        // stopped after the 4th checkpoint, not the full 10 epochs
        assert_eq!(model.persist_epochs, vec![1, 2, 3, 4]);
    }

    #[test]
    fn test_resumes_numbering_after_restore() {
        let (train, dev, ckpt, metrics) = test_fixtures("resume");
        let mut model = ScriptedModel::new(vec![1.0; 100]);
        model.start_epoch = 7; // as if restored from a checkpoint tagged 7
        let schedule = TrainSchedule {
            num_epochs: 2,
            steps_per_epoch: 1,
            epochs_per_checkpoint: 1,
        };

        run_training(&schedule, &mut model, &train, &dev, &ckpt, &metrics).unwrap();
        assert_eq!(model.persist_epochs, vec![8, 9]);
    }
}
