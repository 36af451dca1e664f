// ============================================================
// Layer 5 — Inferencer
// ============================================================
// Runs a restored model forward-only over a whole dataset
// split, producing a decoded command per example. The heavy
// lifting (greedy decoding, source padding conventions) lives
// in the model adapter; this driver walks the split, maps ids
// back to tokens and pairs each prediction with its reference.

use anyhow::Result;

use crate::data::dataset::DatasetSplit;
use crate::data::vocab::Vocabulary;
use crate::ml::adapter::CommandModel;

/// One decoded example: the description, the reference command
/// structure and the model's prediction, all as token strings.
#[derive(Debug, Clone)]
pub struct DecodedExample {
    pub description: Vec<String>,
    pub reference: Vec<String>,
    pub predicted: Vec<String>,
}

/// Greedy-decode every example of a split. `verbose` prints each
/// prediction as it is produced (the decode mode's output).
pub fn decode_split(
    model: &mut dyn CommandModel,
    split: &DatasetSplit,
    nl_vocab: &Vocabulary,
    cm_vocab: &Vocabulary,
    verbose: bool,
) -> Result<Vec<DecodedExample>> {
    let mut decoded = Vec::with_capacity(split.len());

    for example in split.iter() {
        let predicted_ids = model.decode_greedy(&example.source_ids)?;

        let item = DecodedExample {
            description: nl_vocab.decode(&example.source_ids),
            reference: cm_vocab.decode(&example.target_ids),
            predicted: cm_vocab.decode(&predicted_ids),
        };

        if verbose {
            println!("> {}", item.description.join(" "));
            println!("  {}", item.predicted.join(" "));
        }
        decoded.push(item);
    }

    tracing::info!("Decoded {} examples", decoded.len());
    Ok(decoded)
}

/// Decode one ad-hoc description (the interactive mode's inner
/// step): whitespace tokens → ids (unknowns → _UNK) → greedy
/// decode → command tokens.
pub fn decode_description(
    model: &mut dyn CommandModel,
    description: &str,
    nl_vocab: &Vocabulary,
    cm_vocab: &Vocabulary,
) -> Result<Vec<String>> {
    let tokens: Vec<&str> = description.split_whitespace().collect();
    let source_ids = nl_vocab.encode(&tokens);
    let predicted_ids = model.decode_greedy(&source_ids)?;
    Ok(cm_vocab.decode(&predicted_ids))
}
