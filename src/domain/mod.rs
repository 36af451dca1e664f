// ============================================================
// Layer 3 — Domain Layer
// ============================================================
// Pure Rust types that define the core concepts of the system.
//
// Rules for this layer:
//   - NO Burn framework types allowed here
//   - NO file I/O or network calls
//   - NO ML-specific code
//   - Only plain Rust structs, enums, and traits
//
// Why keep this layer pure?
//   - Easy to unit test (no GPU needed)
//   - Easy to understand (no framework noise)
//   - Easy to swap implementations (just implement the trait)
//
// Reference: Rust Book §5 (Structs), §10 (Traits)

// Which decoder topology a run uses (flat sequence vs. tree)
pub mod topology;

// One (description, command) training example in token-id form
pub mod example;

// The command-argument tree and its template / skeleton forms
pub mod command_tree;

// Core abstractions (traits) that other layers implement
pub mod traits;
