// ============================================================
// Layer 4 — Data Pipeline
// ============================================================
// Everything between the id files written by the preprocessing
// collaborator and the fixed-shape batches the model consumes.
//
// The pipeline flows in this order:
//
//   {split}.nl.ids / {split}.cm.ids files
//       │
//       ▼
//   IdFileLoader       → reads parallel id sequences
//       │
//       ▼
//   DatasetSplit       → assigns each example to the smallest
//       │                bucket that fits it (oversized → dropped)
//       ▼
//   sampling scale     → cumulative bucket probabilities for
//       │                weighted bucket draws during training
//       ▼
//   BatchMaterializer  → samples + pads a fixed-shape batch
//       │                for one bucket
//       ▼
//   model adapter (Layer 5)
//
// Each module is responsible for exactly one step, so each step
// is independently testable without a GPU.
//
// Reference: Rust Book §13 (Iterators and Closures)

/// Vocabulary loading and the reserved token ids
pub mod vocab;

/// Length buckets, per-topology bucket lists, sampling scale
pub mod buckets;

/// Per-bucket example storage for one dataset split
pub mod dataset;

/// Samples and pads fixed-shape batches from a bucket
pub mod batcher;

/// Reads parallel {split}.nl.ids / {split}.cm.ids files
pub mod loader;

/// Corpus statistics (distinct descriptions / commands)
pub mod stats;
