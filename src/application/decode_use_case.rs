// ============================================================
// Layer 2 — DecodeUseCase
// ============================================================
// Restores the newest checkpoint of a configuration and decodes
// with it, in one of two shapes:
//
//   execute()     — decode the whole dev split, printing each
//                   prediction (the batch decode mode)
//   interactive() — a read-decode-print loop over stdin (the
//                   interactive decode mode)
//
// The configuration is read back from the checkpoint directory,
// so the caller only names the directory and the architecture
// is rebuilt exactly as trained. A missing checkpoint is a
// fatal, clearly worded error.

use std::io::{self, BufRead, Write};
use std::path::Path;

use anyhow::Result;

use crate::application::train_use_case::{restore_model, TrainConfig};
use crate::data::buckets::buckets_for;
use crate::data::dataset::DatasetSplit;
use crate::data::loader::IdFileLoader;
use crate::data::vocab::{load_vocab, Vocabulary};
use crate::domain::traits::{CommandTranslator, ExampleSource};
use crate::infra::checkpoint::CheckpointManager;
use crate::ml::adapter::CommandModel;
use crate::ml::inferencer::{decode_description, decode_split, DecodedExample};

pub struct DecodeUseCase {
    config: TrainConfig,
    model: Box<dyn CommandModel>,
    nl_vocab: Vocabulary,
    cm_vocab: Vocabulary,
}

impl DecodeUseCase {
    /// Restore model + vocabularies for the configuration saved
    /// in `model_dir`.
    pub fn from_model_dir(model_dir: &str) -> Result<Self> {
        let ckpt = CheckpointManager::new(model_dir);
        let config: TrainConfig = ckpt.load_config()?;
        let (nl_vocab, cm_vocab) = load_vocab(Path::new(&config.data_dir))?;
        let model = restore_model(&config)?;
        Ok(Self { config, model, nl_vocab, cm_vocab })
    }

    /// Decode the full dev split, printing predictions.
    pub fn execute(&mut self) -> Result<Vec<DecodedExample>> {
        let loader = IdFileLoader::new(&self.config.data_dir, self.config.topology);
        let dev_pairs = loader.load_split("dev")?;
        let dev_set = DatasetSplit::allocate(dev_pairs, buckets_for(self.config.topology));

        decode_split(
            self.model.as_mut(),
            &dev_set,
            &self.nl_vocab,
            &self.cm_vocab,
            true,
        )
    }

    /// Read task descriptions from stdin until EOF, decoding
    /// each one. Blank lines are ignored.
    pub fn interactive(&mut self) -> Result<()> {
        let stdin = io::stdin();
        print!("> ");
        io::stdout().flush()?;

        for line in stdin.lock().lines() {
            let line = line?;
            let description = line.trim();
            if !description.is_empty() {
                let command = self.translate(description)?;
                println!("{command}");
            }
            print!("> ");
            io::stdout().flush()?;
        }
        Ok(())
    }
}

impl CommandTranslator for DecodeUseCase {
    fn translate(&mut self, description: &str) -> Result<String> {
        let tokens = decode_description(
            self.model.as_mut(),
            description,
            &self.nl_vocab,
            &self.cm_vocab,
        )?;
        Ok(tokens.join(" "))
    }
}
