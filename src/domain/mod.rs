// ============================================================
// Layer 3 — Domain Layer
// ============================================================
// Plain Rust types and traits describing what flows through
// the inference pipeline:
//
//   ProteinSequence  — one preprocessed record from the dataset
//   Representation   — the hidden states produced for a record
//   traits           — seams the orchestrator is written against
//
// Nothing in here touches burn, the filesystem, or the GPU,
// so the orchestration can be tested with stubs.

// A preprocessed, tokenised protein sequence
pub mod sequence;

// Per-sequence hidden-state output
pub mod representation;

// Core abstractions (traits) that other layers implement
pub mod traits;
