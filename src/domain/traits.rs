// ============================================================
// Layer 3 — Core Traits (Abstractions)
// ============================================================
// The orchestrator only sees these traits, so every outer
// collaborator (dataset file, GPU, output directory) can be
// swapped for a stub in tests.

use anyhow::Result;
use std::path::{Path, PathBuf};

use crate::domain::{representation::Representation, sequence::ProteinSequence};

// ─── SequenceSource ───────────────────────────────────────────────────────────
/// Anything that can produce the preprocessed inference records.
///
/// Implementations:
///   - JsonlSequenceLoader → reads a JSON Lines file
pub trait SequenceSource {
    /// Load every record, in file order.
    fn load_all(&self) -> Result<Vec<ProteinSequence>>;
}

// ─── RepresentationSink ───────────────────────────────────────────────────────
/// Anything that can persist a representation into a directory.
///
/// Implementations:
///   - SafetensorsWriter → writes `bert_results_<name>.pt`
pub trait RepresentationSink {
    /// Persist one representation, returning the path written.
    fn write(&self, dir: &Path, representation: &Representation) -> Result<PathBuf>;
}

// ─── AcceleratorProbe ─────────────────────────────────────────────────────────
/// Checks that an accelerator device is usable before any work starts.
pub trait AcceleratorProbe {
    fn ensure_available(&self) -> Result<()>;
}
