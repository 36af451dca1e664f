// ============================================================
// Layer 6 — Metrics Logger
// ============================================================
// Records one CSV row per checkpoint so learning curves can be
// plotted after (or during) a run.
//
// Columns:
//   epoch         — global epoch of the checkpoint
//   learning_rate — the rate in effect after any decay
//   train_loss    — average training loss since the last checkpoint
//   train_ppx     — exp(train_loss), "inf" when saturated
//   dev_loss      — average validation loss over non-empty buckets
//   dev_ppx       — exp(dev_loss), "inf" when saturated
//   dev_token_acc — validation token accuracy (padding excluded)
//
// How to read the numbers:
//   - both losses falling → the model is learning
//   - dev_loss rising while train_loss falls → overfitting, and
//     the early-stop rule will trigger soon
//
// Output file: {model_dir}/metrics.csv

use std::{
    fs::{self, OpenOptions},
    io::Write,
    path::PathBuf,
};

use anyhow::Result;
use serde::{Deserialize, Serialize};

/// One row of metrics for a single checkpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckpointMetrics {
    pub epoch: usize,
    pub learning_rate: f64,
    pub train_loss: f64,
    pub train_ppx: f64,
    pub dev_loss: f64,
    pub dev_ppx: f64,
    pub dev_token_acc: f64,
}

/// Appends checkpoint metrics to a CSV file.
pub struct MetricsLogger {
    csv_path: PathBuf,
}

impl MetricsLogger {
    /// Create the logger, writing the CSV header only when the
    /// file is new so restarted runs keep appending.
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        let csv_path = dir.join("metrics.csv");

        if !csv_path.exists() {
            let mut f = fs::File::create(&csv_path)?;
            writeln!(
                f,
                "epoch,learning_rate,train_loss,train_ppx,dev_loss,dev_ppx,dev_token_acc"
            )?;
        }

        Ok(Self { csv_path })
    }

    pub fn log(&self, m: &CheckpointMetrics) -> Result<()> {
        let mut f = OpenOptions::new().append(true).open(&self.csv_path)?;
        writeln!(
            f,
            "{},{:.6},{:.6},{:.4},{:.6},{:.4},{:.4}",
            m.epoch, m.learning_rate, m.train_loss, m.train_ppx, m.dev_loss, m.dev_ppx,
            m.dev_token_acc,
        )?;
        tracing::debug!(
            "Logged checkpoint {}: train_loss={:.4} dev_loss={:.4}",
            m.epoch,
            m.train_loss,
            m.dev_loss
        );
        Ok(())
    }

    pub fn csv_path(&self) -> &PathBuf {
        &self.csv_path
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_written_once() {
        let dir = std::env::temp_dir().join(format!("nl2cmd-metrics-{}", std::process::id()));
        fs::remove_dir_all(&dir).ok();

        let logger = MetricsLogger::new(&dir).unwrap();
        logger
            .log(&CheckpointMetrics {
                epoch: 1,
                learning_rate: 1e-3,
                train_loss: 2.5,
                train_ppx: 12.18,
                dev_loss: 2.7,
                dev_ppx: 14.88,
                dev_token_acc: 0.31,
            })
            .unwrap();

        // re-opening must not duplicate the header
        let _again = MetricsLogger::new(&dir).unwrap();
        let content = fs::read_to_string(logger.csv_path()).unwrap();
        assert_eq!(content.matches("epoch,").count(), 1);
        assert!(content.lines().count() >= 2);
    }
}
