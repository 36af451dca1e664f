// ============================================================
// Layer 6 — Checkpoint Manager
// ============================================================
// Persists and restores model state using Burn's CompactRecorder.
//
// What gets saved per checkpoint directory:
//   1. translate_epoch_{N}.mpk.gz — weights tagged by global epoch
//   2. latest_epoch.json          — pointer to the newest epoch
//   3. train_config.json          — the run configuration, so
//                                   decoding can rebuild the exact
//                                   model architecture
//
// The epoch tag is the contract that makes restarts exact: a
// checkpoint written at global epoch N restores with counter N,
// and the training loop resumes at N+1 — epochs are never
// replayed or skipped. The weight file and the pointer are
// written in that order, so a crash between the two leaves the
// previous checkpoint restorable.
//
// Reference: Burn Book §5 (Records and Checkpointing)

use std::{fs, path::PathBuf};

use anyhow::{anyhow, Context, Result};
use burn::{
    module::Module,
    record::{CompactRecorder, Recorder},
    tensor::backend::Backend,
};

/// Manages one configuration's checkpoint directory.
pub struct CheckpointManager {
    dir: PathBuf,
}

impl CheckpointManager {
    /// Create a manager, creating the directory if needed.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        let dir = dir.into();
        fs::create_dir_all(&dir).ok();
        Self { dir }
    }

    pub fn dir(&self) -> &PathBuf {
        &self.dir
    }

    /// True if at least one checkpoint has been written here.
    pub fn has_checkpoint(&self) -> bool {
        self.dir.join("latest_epoch.json").exists()
    }

    /// Save model weights tagged by global epoch, then advance
    /// the latest-epoch pointer.
    pub fn save_model<B: Backend, M: Module<B>>(&self, model: M, epoch: usize) -> Result<()> {
        let path = self.dir.join(format!("translate_epoch_{epoch}"));

        CompactRecorder::new()
            .record(model.into_record(), path.clone())
            .with_context(|| format!("Failed to save checkpoint to '{}'", path.display()))?;

        let latest_path = self.dir.join("latest_epoch.json");
        fs::write(&latest_path, serde_json::to_string(&epoch)?)
            .with_context(|| "Failed to write latest_epoch.json")?;

        tracing::debug!("Saved checkpoint: epoch {}", epoch);
        Ok(())
    }

    /// Restore the newest checkpoint's weights into `model`.
    /// Returns the restored model and the global epoch it was
    /// tagged with.
    pub fn load_model<B: Backend, M: Module<B>>(
        &self,
        model: M,
        device: &B::Device,
    ) -> Result<(M, usize)> {
        let epoch = self.latest_epoch()?;
        let path = self.dir.join(format!("translate_epoch_{epoch}"));

        tracing::info!("Loading checkpoint from epoch {}", epoch);

        let record = CompactRecorder::new()
            .load(path.clone(), device)
            .with_context(|| {
                format!(
                    "Cannot load checkpoint '{}'. Have you trained the model first?",
                    path.display()
                )
            })?;

        Ok((model.load_record(record), epoch))
    }

    /// Save the run configuration as pretty JSON.
    pub fn save_config<C: serde::Serialize>(&self, cfg: &C) -> Result<()> {
        let path = self.dir.join("train_config.json");
        let json = serde_json::to_string_pretty(cfg)?;
        fs::write(&path, json)
            .with_context(|| format!("Cannot write config to '{}'", path.display()))?;
        Ok(())
    }

    /// Load the run configuration written by a previous train run.
    pub fn load_config<C: serde::de::DeserializeOwned>(&self) -> Result<C> {
        let path = self.dir.join("train_config.json");
        let json = fs::read_to_string(&path).with_context(|| {
            format!(
                "Cannot read config from '{}'. Run 'train' before decoding.",
                path.display()
            )
        })?;
        Ok(serde_json::from_str(&json)?)
    }

    /// The global epoch of the newest checkpoint. Fails with a
    /// clear no-model error when no checkpoint exists.
    pub fn latest_epoch(&self) -> Result<usize> {
        let path = self.dir.join("latest_epoch.json");
        let s = fs::read_to_string(&path).map_err(|_| {
            anyhow!(
                "No checkpoint found in '{}' — train a model first",
                self.dir.display()
            )
        })?;
        Ok(serde_json::from_str::<usize>(&s)?)
    }

    /// Advance only the latest-epoch pointer.
    pub fn write_latest_epoch(&self, epoch: usize) -> Result<()> {
        let path = self.dir.join("latest_epoch.json");
        fs::write(&path, serde_json::to_string(&epoch)?)
            .with_context(|| "Failed to write latest_epoch.json")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_manager(name: &str) -> CheckpointManager {
        let dir = std::env::temp_dir().join(format!("nl2cmd-ckpt-{}-{name}", std::process::id()));
        fs::remove_dir_all(&dir).ok();
        CheckpointManager::new(dir)
    }

    #[test]
    fn test_missing_checkpoint_is_a_clear_error() {
        let ckpt = temp_manager("missing");
        assert!(!ckpt.has_checkpoint());
        let err = ckpt.latest_epoch().unwrap_err();
        assert!(err.to_string().contains("No checkpoint found"));
    }

    #[test]
    fn test_epoch_pointer_round_trip() {
        let ckpt = temp_manager("pointer");
        ckpt.write_latest_epoch(5).unwrap();
        assert_eq!(ckpt.latest_epoch().unwrap(), 5);
        // training resumes at the epoch after the restored one
        assert_eq!(ckpt.latest_epoch().unwrap() + 1, 6);
        ckpt.write_latest_epoch(6).unwrap();
        assert_eq!(ckpt.latest_epoch().unwrap(), 6);
    }

    #[test]
    fn test_config_round_trip() {
        #[derive(serde::Serialize, serde::Deserialize, PartialEq, Debug)]
        struct Cfg {
            lr: f64,
            layers: usize,
        }
        let ckpt = temp_manager("config");
        let cfg = Cfg { lr: 1e-3, layers: 2 };
        ckpt.save_config(&cfg).unwrap();
        assert_eq!(ckpt.load_config::<Cfg>().unwrap(), cfg);
    }
}
