// ============================================================
// Layer 5 — ML / Model Layer (Burn)
// ============================================================
// This layer contains ALL Burn framework specific code.
// No other layer imports from burn directly — only this one
// (and the checkpoint manager, which serializes its records).
//
// What's in this layer:
//
//   model.rs      — The encoder-decoder network: embeddings,
//                   attention encoder blocks, causally masked
//                   decoder blocks with cross attention, and
//                   the target-vocabulary projection.
//
//   adapter.rs    — The CommandModel trait (step / get_batch /
//                   persist / restore) and its two variants:
//                   FlatSequenceModel and TreeStructuredModel.
//
//   trainer.rs    — The epoch state machine: weighted bucket
//                   draws, checkpoint cadence, learning-rate
//                   decay, validation and early stop.
//
//   monitor.rs    — Loss histories and the last-3 regression
//                   rule behind decay/stop decisions.
//
//   inferencer.rs — Forward-only decoding over a split and for
//                   ad-hoc descriptions.
//
//   scorer.rs     — Template-match / exact-match verdicts and
//                   corpus-level accuracy aggregation.
//
// Reference: Burn Book §3 (Building Blocks), §5 (Training)
//            Sutskever et al. (2014) Sequence to Sequence Learning
//            Dong & Lapata (2016) seq2tree

/// Encoder-decoder network architecture
pub mod model;

/// Model adapter trait and the two topology variants
pub mod adapter;

/// Training loop state machine
pub mod trainer;

/// Loss histories, decay and early-stop decisions, perplexity
pub mod monitor;

/// Forward-only decoding drivers
pub mod inferencer;

/// Template / exact match scoring and aggregation
pub mod scorer;
