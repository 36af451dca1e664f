// ============================================================
// Layer 2 — Application / Use Cases
// ============================================================
// This layer orchestrates all the other layers to accomplish
// one run mode (train, decode, evaluate, ...).
//
// Rules for this layer:
//   - No ML math or tensor code here
//   - No UI or argument parsing here (that's Layer 1)
//   - No direct file-format knowledge (that's Layers 4 and 6)
//   - Only workflow coordination
//
// Every run mode dispatches to exactly one use case, and each
// use case receives an immutable configuration — never ambient
// global state — so grid-search trials with different
// configurations cannot leak into one another.
//
// Reference: Clean Architecture pattern
//            Rust Book §7 (Module System)

// Training (and sampled-subset training)
pub mod train_use_case;

// Batch decoding and the interactive loop
pub mod decode_use_case;

// Corpus-level template/exact accuracy
pub mod eval_use_case;

// Cartesian hyperparameter search
pub mod grid_search;

// Token→id data preparation and corpus statistics
pub mod process_use_case;
