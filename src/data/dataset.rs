// ============================================================
// Layer 4 — Protein Datasets
// ============================================================
// Two burn Dataset implementations:
//
//   ProteinDataset — every record of the preprocessed file,
//                    optionally truncated to a maximum length
//   ShardDataset   — one rank's strided view of a shared
//                    dataset: indices rank, rank+world, ...
//
// The shard split is disjoint and covers every record exactly
// once across all ranks, so no sequence is dropped or written
// twice in a data-parallel run.

use burn::data::dataset::Dataset;
use std::sync::Arc;

use crate::domain::sequence::ProteinSequence;

pub struct ProteinDataset {
    sequences: Vec<ProteinSequence>,
}

impl ProteinDataset {
    pub fn new(sequences: Vec<ProteinSequence>) -> Self {
        Self { sequences }
    }

    /// Truncate every sequence longer than `max_len` tokens
    pub fn truncated(mut sequences: Vec<ProteinSequence>, max_len: usize) -> Self {
        let mut cut = 0usize;
        for seq in sequences.iter_mut().filter(|s| s.len() > max_len) {
            seq.truncate(max_len);
            cut += 1;
        }
        if cut > 0 {
            tracing::warn!("Truncated {} sequences to {} tokens", cut, max_len);
        }
        Self::new(sequences)
    }
}

impl Dataset<ProteinSequence> for ProteinDataset {
    fn get(&self, index: usize) -> Option<ProteinSequence> {
        self.sequences.get(index).cloned()
    }

    fn len(&self) -> usize {
        self.sequences.len()
    }
}

/// Strided shard of a shared dataset for one data-parallel rank
pub struct ShardDataset {
    inner:      Arc<ProteinDataset>,
    rank:       usize,
    world_size: usize,
}

impl ShardDataset {
    pub fn new(inner: Arc<ProteinDataset>, rank: usize, world_size: usize) -> Self {
        let world_size = world_size.max(1);
        Self { inner, rank: rank % world_size, world_size }
    }
}

impl Dataset<ProteinSequence> for ShardDataset {
    fn get(&self, index: usize) -> Option<ProteinSequence> {
        if index >= self.len() {
            return None;
        }
        self.inner.get(self.rank + index * self.world_size)
    }

    fn len(&self) -> usize {
        let total = self.inner.len();
        if self.rank >= total {
            0
        } else {
            (total - self.rank).div_ceil(self.world_size)
        }
    }
}
