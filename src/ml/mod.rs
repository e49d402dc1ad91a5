// ============================================================
// Layer 5 — ML / Model Layer (Burn)
// ============================================================
// All burn model code lives here:
//
//   model.rs       — the protein BERT encoder
//   distributed.rs — ranks and model-parallel bookkeeping
//   predictor.rs   — runs the data loader per rank and turns
//                    hidden states into per-sequence outputs
//
// The two traits below are the seams the application layer
// drives, so the orchestration can be tested without a model.

use anyhow::Result;
use std::path::Path;

use crate::domain::{representation::Representation, sequence::ProteinSequence};
use distributed::ExecutionContext;

/// Protein BERT encoder architecture
pub mod model;

/// Execution context for data-parallel runs
pub mod distributed;

/// Batched, sharded prediction over a dataset
pub mod predictor;

/// Data loader settings the predictor needs, free of config types
#[derive(Debug, Clone, PartialEq)]
pub struct LoaderSettings {
    /// Sequences per batch
    pub batch_size:   usize,
    /// Some(seed) when batches should be shuffled
    pub shuffle_seed: Option<u64>,
    /// Loader threads per rank
    pub num_workers:  usize,
    /// Extra truncation on top of the model's position limit
    pub max_seq_len:  Option<usize>,
}

impl Default for LoaderSettings {
    fn default() -> Self {
        Self { batch_size: 8, shuffle_seed: None, num_workers: 1, max_seq_len: None }
    }
}

/// A frozen model that can produce representations for a dataset.
pub trait BatchPredictor {
    /// Returns one Vec per batch, each holding that batch's
    /// representations in row order.
    fn predict(
        &self,
        sequences: Vec<ProteinSequence>,
        ctx:       &ExecutionContext,
        settings:  &LoaderSettings,
    ) -> Result<Vec<Vec<Representation>>>;
}

/// Restores a frozen, inference-ready model from a checkpoint.
pub trait ModelRestorer {
    type Predictor: BatchPredictor;

    fn restore(&self, checkpoint: &Path) -> Result<Self::Predictor>;
}
