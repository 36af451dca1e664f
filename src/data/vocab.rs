// ============================================================
// Layer 4 — Vocabulary
// ============================================================
// Loads the source (natural language) and target (command)
// vocabularies built by the preprocessing collaborator.
//
// A vocabulary file is one token per line; a token's id is its
// line number. The first four lines are the reserved tokens, in
// this exact order:
//
//   line 0: _PAD  — padding filler, ignored by the loss
//   line 1: _GO   — decoder start-of-sequence marker
//   line 2: _EOS  — decoder end-of-sequence marker
//   line 3: _UNK  — out-of-vocabulary fallback
//
// The rest of the system treats ids as opaque integers; only
// these four have fixed meaning.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use anyhow::{bail, Context, Result};

pub const PAD: &str = "_PAD";
pub const GO: &str = "_GO";
pub const EOS: &str = "_EOS";
pub const UNK: &str = "_UNK";

pub const PAD_ID: u32 = 0;
pub const GO_ID: u32 = 1;
pub const EOS_ID: u32 = 2;
pub const UNK_ID: u32 = 3;

const RESERVED: [&str; 4] = [PAD, GO, EOS, UNK];

/// A forward (token → id) and reverse (id → token) mapping.
pub struct Vocabulary {
    forward: HashMap<String, u32>,
    reverse: Vec<String>,
}

impl Vocabulary {
    /// Build a vocabulary from an ordered token list. The list
    /// must start with the four reserved tokens.
    pub fn from_tokens(tokens: Vec<String>) -> Result<Self> {
        if tokens.len() < RESERVED.len()
            || tokens[..RESERVED.len()].iter().map(String::as_str).ne(RESERVED)
        {
            bail!(
                "Vocabulary must start with the reserved tokens {:?}",
                RESERVED
            );
        }
        let forward = tokens
            .iter()
            .enumerate()
            .map(|(id, tok)| (tok.clone(), id as u32))
            .collect();
        Ok(Self { forward, reverse: tokens })
    }

    /// Load a vocabulary from a one-token-per-line file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Cannot read vocabulary file '{}'", path.display()))?;
        let tokens: Vec<String> = content.lines().map(|l| l.trim().to_string()).collect();
        Self::from_tokens(tokens)
            .with_context(|| format!("Malformed vocabulary file '{}'", path.display()))
    }

    pub fn len(&self) -> usize {
        self.reverse.len()
    }

    pub fn is_empty(&self) -> bool {
        self.reverse.is_empty()
    }

    /// Token → id, falling back to _UNK for unknown tokens.
    pub fn id_of(&self, token: &str) -> u32 {
        self.forward.get(token).copied().unwrap_or(UNK_ID)
    }

    /// Id → token; out-of-range ids render as _UNK.
    pub fn token_of(&self, id: u32) -> &str {
        self.reverse.get(id as usize).map(String::as_str).unwrap_or(UNK)
    }

    /// Map a token sequence to ids (unknowns become _UNK).
    pub fn encode<S: AsRef<str>>(&self, tokens: &[S]) -> Vec<u32> {
        tokens.iter().map(|t| self.id_of(t.as_ref())).collect()
    }

    /// Map an id sequence back to tokens, stopping at the first
    /// _EOS and skipping padding.
    pub fn decode(&self, ids: &[u32]) -> Vec<String> {
        ids.iter()
            .take_while(|&&id| id != EOS_ID)
            .filter(|&&id| id != PAD_ID && id != GO_ID)
            .map(|&id| self.token_of(id).to_string())
            .collect()
    }
}

/// Load the (source, target) vocabulary pair from a data
/// directory: `vocab.nl` for descriptions, `vocab.cm` for
/// commands.
pub fn load_vocab(data_dir: &Path) -> Result<(Vocabulary, Vocabulary)> {
    let nl = Vocabulary::load(&data_dir.join("vocab.nl"))?;
    let cm = Vocabulary::load(&data_dir.join("vocab.cm"))?;
    tracing::info!(
        "Vocabularies loaded: {} description tokens, {} command tokens",
        nl.len(),
        cm.len()
    );
    Ok((nl, cm))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vocab() -> Vocabulary {
        let tokens = ["_PAD", "_GO", "_EOS", "_UNK", "find", ".", "-name"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        Vocabulary::from_tokens(tokens).unwrap()
    }

    #[test]
    fn test_reserved_ids_are_fixed() {
        let v = vocab();
        assert_eq!(v.id_of(PAD), PAD_ID);
        assert_eq!(v.id_of(GO), GO_ID);
        assert_eq!(v.id_of(EOS), EOS_ID);
        assert_eq!(v.id_of(UNK), UNK_ID);
    }

    #[test]
    fn test_unknown_token_maps_to_unk() {
        let v = vocab();
        assert_eq!(v.id_of("xargs"), UNK_ID);
    }

    #[test]
    fn test_decode_stops_at_eos_and_skips_pad() {
        let v = vocab();
        let ids = vec![GO_ID, 4, 6, EOS_ID, 5, PAD_ID];
        assert_eq!(v.decode(&ids), vec!["find", "-name"]);
    }

    #[test]
    fn test_missing_reserved_prefix_is_rejected() {
        let tokens = vec!["find".to_string(), "grep".to_string()];
        assert!(Vocabulary::from_tokens(tokens).is_err());
    }
}
