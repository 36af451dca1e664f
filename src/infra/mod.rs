// ============================================================
// Layer 6 — Infrastructure Layer
// ============================================================
// Cross-cutting concerns that don't belong to any one business
// layer:
//
//   checkpoint.rs — Saving and loading model weights with
//                   Burn's CompactRecorder, tagged by global
//                   epoch, with a latest-epoch pointer and the
//                   run configuration saved as JSON so a model
//                   can be rebuilt for decoding.
//
//   metrics.rs    — Per-checkpoint training metrics written to
//                   a CSV file for later analysis and plotting.
//
// Keeping these here prevents duplication across layers and
// makes them easy to swap (e.g. file checkpoints for object
// storage) without touching the training loop.
//
// Reference: Rust Book §7 (Modules), §9 (Error Handling)

/// Model checkpoint saving and loading
pub mod checkpoint;

/// Per-checkpoint metrics CSV logger
pub mod metrics;
