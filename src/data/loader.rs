// ============================================================
// Layer 4 — Id-File Loader
// ============================================================
// Reads the parallel id files written by the preprocessing
// collaborator (or by the process-data mode):
//
//   {split}.nl.ids       — one description per line,
//                          space-separated token ids
//   {split}.cm.ids       — the matching commands (flat decoder)
//   {split}.cm.tree.ids  — the matching linearized tree
//                          skeletons (tree decoder)
//
// Line i of the source file pairs with line i of the target
// file. The loader never tokenizes raw text — by this point
// everything is integers.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};

use crate::domain::example::Example;
use crate::domain::topology::DecoderTopology;
use crate::domain::traits::ExampleSource;

pub struct IdFileLoader {
    data_dir: PathBuf,
    topology: DecoderTopology,
}

impl IdFileLoader {
    pub fn new(data_dir: impl Into<PathBuf>, topology: DecoderTopology) -> Self {
        Self { data_dir: data_dir.into(), topology }
    }

    /// File name of the target-side id file for this topology.
    pub fn target_file(split: &str, topology: DecoderTopology) -> String {
        match topology {
            DecoderTopology::Flat => format!("{split}.cm.ids"),
            DecoderTopology::Tree => format!("{split}.cm.tree.ids"),
        }
    }
}

impl ExampleSource for IdFileLoader {
    fn load_split(&self, split: &str) -> Result<Vec<Example>> {
        let source_path = self.data_dir.join(format!("{split}.nl.ids"));
        let target_path = self.data_dir.join(Self::target_file(split, self.topology));

        let sources = read_id_lines(&source_path)?;
        let targets = read_id_lines(&target_path)?;

        if sources.len() != targets.len() {
            bail!(
                "Split '{split}' is misaligned: {} descriptions vs {} commands",
                sources.len(),
                targets.len()
            );
        }

        let examples: Vec<Example> = sources
            .into_iter()
            .zip(targets)
            .map(|(s, t)| Example::new(s, t))
            .collect();

        tracing::info!("Loaded {} examples for split '{split}'", examples.len());
        Ok(examples)
    }
}

/// Parse a file of space-separated id sequences, one per line.
/// Blank lines are kept as empty sequences so line pairing with
/// the parallel file stays intact.
fn read_id_lines(path: &Path) -> Result<Vec<Vec<u32>>> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Cannot read id file '{}'", path.display()))?;

    content
        .lines()
        .enumerate()
        .map(|(line_no, line)| {
            line.split_whitespace()
                .map(|tok| {
                    tok.parse::<u32>().with_context(|| {
                        format!(
                            "Malformed id '{}' at {}:{}",
                            tok,
                            path.display(),
                            line_no + 1
                        )
                    })
                })
                .collect()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn temp_data_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("nl2cmd-loader-{}-{name}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn test_loads_parallel_lines() {
        let dir = temp_data_dir("ok");
        fs::write(dir.join("dev.nl.ids"), "4 5 6\n7\n").unwrap();
        fs::write(dir.join("dev.cm.ids"), "10 11\n12 13 14\n").unwrap();

        let loader = IdFileLoader::new(&dir, DecoderTopology::Flat);
        let examples = loader.load_split("dev").unwrap();
        assert_eq!(examples.len(), 2);
        assert_eq!(examples[0].source_ids, vec![4, 5, 6]);
        assert_eq!(examples[1].target_ids, vec![12, 13, 14]);
    }

    #[test]
    fn test_misaligned_split_is_an_error() {
        let dir = temp_data_dir("misaligned");
        fs::write(dir.join("dev.nl.ids"), "1\n2\n").unwrap();
        fs::write(dir.join("dev.cm.ids"), "3\n").unwrap();

        let loader = IdFileLoader::new(&dir, DecoderTopology::Flat);
        assert!(loader.load_split("dev").is_err());
    }

    #[test]
    fn test_tree_topology_reads_skeleton_file() {
        assert_eq!(
            IdFileLoader::target_file("train", DecoderTopology::Tree),
            "train.cm.tree.ids"
        );
    }
}
