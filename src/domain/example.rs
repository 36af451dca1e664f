// ============================================================
// Layer 3 — Example Domain Type
// ============================================================
// One training example: a natural-language task description
// paired with the shell command that accomplishes it.
//
// By the time an Example exists, both sides have already been
// tokenized and mapped to vocabulary ids by the preprocessing
// collaborator. This layer treats the ids as opaque integers —
// the only reserved ids are padding and unknown (see data::vocab).
//
// For the tree topology, `target_ids` holds the linearized
// command-tree skeleton rather than the raw command tokens;
// either way it is a plain id sequence by the time it gets here.

use serde::{Deserialize, Serialize};

/// A tokenized (description, command) pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Example {
    /// Token ids of the natural-language description
    pub source_ids: Vec<u32>,

    /// Token ids of the target command structure
    /// (linear sequence or serialized tree skeleton)
    pub target_ids: Vec<u32>,
}

impl Example {
    pub fn new(source_ids: Vec<u32>, target_ids: Vec<u32>) -> Self {
        Self { source_ids, target_ids }
    }

    /// Length of the description in tokens
    pub fn source_len(&self) -> usize {
        self.source_ids.len()
    }

    /// Length of the target structure in tokens
    pub fn target_len(&self) -> usize {
        self.target_ids.len()
    }
}
