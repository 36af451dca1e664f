// ============================================================
// Layer 2 — ProcessDataUseCase
// ============================================================
// Turns the tokenized text corpus into the id files the trainer
// consumes. Per split (train, dev, test), reading:
//
//   {split}.nl   — one tokenized description per line
//   {split}.cm   — the matching tokenized command per line
//
// and writing:
//
//   {split}.nl.ids       — description token ids
//   {split}.cm.ids       — command token ids (flat decoder)
//   {split}.cm.tree.ids  — linearized skeleton ids (tree decoder)
//
// Tokenization itself happened upstream; this mode only maps
// tokens to ids (unknowns to _UNK) and linearizes command trees.
//
// The same module hosts the data-statistics mode, which reports
// distinct-description and distinct-command counts per split.

use std::fs;
use std::path::Path;

use anyhow::{bail, Context, Result};

use crate::data::loader::IdFileLoader;
use crate::data::stats::split_statistics;
use crate::data::vocab::{load_vocab, Vocabulary};
use crate::domain::command_tree::CommandTree;
use crate::domain::topology::DecoderTopology;
use crate::domain::traits::ExampleSource;

const SPLITS: [&str; 3] = ["train", "dev", "test"];

pub struct ProcessDataUseCase {
    data_dir: String,
}

impl ProcessDataUseCase {
    pub fn new(data_dir: impl Into<String>) -> Self {
        Self { data_dir: data_dir.into() }
    }

    /// Encode all three splits. Splits whose text files are
    /// missing are skipped with a warning, so a corpus without a
    /// test split still processes.
    pub fn execute(&self) -> Result<()> {
        let data_dir = Path::new(&self.data_dir);
        let (nl_vocab, cm_vocab) = load_vocab(data_dir)?;

        for split in SPLITS {
            let nl_path = data_dir.join(format!("{split}.nl"));
            let cm_path = data_dir.join(format!("{split}.cm"));
            if !nl_path.exists() || !cm_path.exists() {
                tracing::warn!("Split '{split}' has no text files, skipping");
                continue;
            }
            process_split(data_dir, split, &nl_vocab, &cm_vocab)?;
        }
        Ok(())
    }

    /// Print corpus statistics for every split that has id files.
    pub fn statistics(&self, topology: DecoderTopology) -> Result<()> {
        let loader = IdFileLoader::new(&self.data_dir, topology);
        for split in SPLITS {
            let examples = match loader.load_split(split) {
                Ok(examples) => examples,
                Err(_) => {
                    tracing::warn!("Split '{split}' has no id files, skipping");
                    continue;
                }
            };
            let stats = split_statistics(&examples);
            println!(
                "{split}: {} examples, {} distinct descriptions, {} distinct commands",
                stats.examples, stats.distinct_descriptions, stats.distinct_commands
            );
        }
        Ok(())
    }
}

fn process_split(
    data_dir: &Path,
    split: &str,
    nl_vocab: &Vocabulary,
    cm_vocab: &Vocabulary,
) -> Result<()> {
    let descriptions = read_token_lines(&data_dir.join(format!("{split}.nl")))?;
    let commands = read_token_lines(&data_dir.join(format!("{split}.cm")))?;

    if descriptions.len() != commands.len() {
        bail!(
            "Split '{split}' is misaligned: {} descriptions vs {} commands",
            descriptions.len(),
            commands.len()
        );
    }

    let nl_ids = encode_lines(&descriptions, nl_vocab);
    let cm_ids = encode_lines(&commands, cm_vocab);
    let tree_ids: Vec<String> = commands
        .iter()
        .map(|tokens| {
            let skeleton = CommandTree::from_tokens(tokens).to_skeleton_tokens();
            join_ids(&cm_vocab.encode(&skeleton))
        })
        .collect();

    write_lines(&data_dir.join(format!("{split}.nl.ids")), &nl_ids)?;
    write_lines(&data_dir.join(format!("{split}.cm.ids")), &cm_ids)?;
    write_lines(&data_dir.join(format!("{split}.cm.tree.ids")), &tree_ids)?;

    tracing::info!("Processed {} examples for split '{split}'", commands.len());
    Ok(())
}

fn read_token_lines(path: &Path) -> Result<Vec<Vec<String>>> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Cannot read token file '{}'", path.display()))?;
    Ok(content
        .lines()
        .map(|line| line.split_whitespace().map(String::from).collect())
        .collect())
}

fn encode_lines(lines: &[Vec<String>], vocab: &Vocabulary) -> Vec<String> {
    lines.iter().map(|tokens| join_ids(&vocab.encode(tokens))).collect()
}

fn join_ids(ids: &[u32]) -> String {
    ids.iter().map(u32::to_string).collect::<Vec<_>>().join(" ")
}

fn write_lines(path: &Path, lines: &[String]) -> Result<()> {
    let mut content = lines.join("\n");
    content.push('\n');
    fs::write(path, content)
        .with_context(|| format!("Cannot write id file '{}'", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::topology::DecoderTopology;

    fn temp_data_dir(name: &str) -> std::path::PathBuf {
        let dir =
            std::env::temp_dir().join(format!("nl2cmd-process-{}-{name}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn write_vocab(dir: &Path, file: &str, extra: &[&str]) {
        let mut tokens = vec!["_PAD", "_GO", "_EOS", "_UNK"];
        tokens.extend_from_slice(extra);
        fs::write(dir.join(file), tokens.join("\n")).unwrap();
    }

    #[test]
    fn test_processing_writes_all_three_id_files() {
        let dir = temp_data_dir("full");
        write_vocab(&dir, "vocab.nl", &["delete", "empty", "files"]);
        write_vocab(&dir, "vocab.cm", &["<root>", "(", ")", "find", ".", "-empty", "-delete"]);
        fs::write(dir.join("train.nl"), "delete empty files\n").unwrap();
        fs::write(dir.join("train.cm"), "find . -empty -delete\n").unwrap();

        ProcessDataUseCase::new(dir.to_str().unwrap()).execute().unwrap();

        // Flat ids match the vocabulary line numbers.
        let cm_ids = fs::read_to_string(dir.join("train.cm.ids")).unwrap();
        assert_eq!(cm_ids.trim(), "7 8 9 10");

        // The skeleton stream round-trips through the loader.
        let loader = IdFileLoader::new(&dir, DecoderTopology::Tree);
        let examples = loader.load_split("train").unwrap();
        assert_eq!(examples.len(), 1);
        // <root> ( find ( . -empty -delete ) )
        assert_eq!(examples[0].target_ids, vec![4, 5, 7, 5, 8, 9, 10, 6, 6]);
    }

    #[test]
    fn test_unknown_tokens_become_unk() {
        let dir = temp_data_dir("unk");
        write_vocab(&dir, "vocab.nl", &["list"]);
        write_vocab(&dir, "vocab.cm", &["ls"]);
        fs::write(dir.join("dev.nl"), "list hidden\n").unwrap();
        fs::write(dir.join("dev.cm"), "ls -a\n").unwrap();

        ProcessDataUseCase::new(dir.to_str().unwrap()).execute().unwrap();
        let nl_ids = fs::read_to_string(dir.join("dev.nl.ids")).unwrap();
        assert_eq!(nl_ids.trim(), "4 3");
    }

    #[test]
    fn test_misaligned_text_files_are_an_error() {
        let dir = temp_data_dir("misaligned");
        write_vocab(&dir, "vocab.nl", &[]);
        write_vocab(&dir, "vocab.cm", &[]);
        fs::write(dir.join("train.nl"), "a\nb\n").unwrap();
        fs::write(dir.join("train.cm"), "c\n").unwrap();

        assert!(ProcessDataUseCase::new(dir.to_str().unwrap()).execute().is_err());
    }
}
