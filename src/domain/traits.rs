// ============================================================
// Layer 3 — Core Traits (Abstractions)
// ============================================================
// Traits are Rust's way of defining shared behaviour —
// similar to interfaces in Java or abstract classes in Python.
//
// By programming against traits instead of concrete types,
// the layers above can swap implementations without changing
// the code that uses them:
//   - IdFileLoader implements ExampleSource
//   - a future database-backed loader could too
//   - the application layer only ever sees ExampleSource
//
// The model adapter trait (step / get_batch / persist / restore)
// lives in the ML layer instead, because its batch and checkpoint
// types belong there — this layer stays free of tensor concerns.
//
// Reference: Rust Book §10 (Traits: Defining Shared Behaviour)

use anyhow::Result;

use crate::domain::example::Example;

// ─── ExampleSource ────────────────────────────────────────────────────────────
/// Any component that can produce tokenized training examples
/// for a named dataset split ("train", "dev", "test").
pub trait ExampleSource {
    fn load_split(&self, split: &str) -> Result<Vec<Example>>;
}

// ─── CommandTranslator ────────────────────────────────────────────────────────
/// Any component that can turn a natural-language task
/// description into a shell command string.
///
/// Implemented by the decode use case on top of a restored
/// model; the interactive CLI loop only sees this trait.
pub trait CommandTranslator {
    fn translate(&mut self, description: &str) -> Result<String>;
}
