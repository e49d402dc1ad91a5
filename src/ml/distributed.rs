// ============================================================
// Layer 5 — Distributed Execution Context
// ============================================================
// Describes how an inference run is spread across devices.
// Every device gets one data-parallel rank; each rank sees a
// disjoint, strided shard of the dataset (see ShardDataset).
//
// When more than one device is requested the model-parallel
// group spans all of them and every rank's position in that
// group is derived from its local rank.

use serde::Serialize;

/// Position of a device-local rank inside its model-parallel group.
pub fn compute_model_parallel_rank(local_rank: usize, model_parallel_size: usize) -> usize {
    local_rank % model_parallel_size.max(1)
}

/// Identity of one worker in the run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RankInfo {
    /// Index of the device on this host
    pub local_rank:          usize,
    /// Position inside the model-parallel group
    pub model_parallel_rank: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExecutionContext {
    /// Number of data-parallel ranks (= devices)
    pub world_size:          usize,
    /// Ranks in one model-parallel group
    pub model_parallel_size: usize,
}

impl ExecutionContext {
    /// One rank per requested device; zero is treated as one.
    pub fn new(gpus: usize) -> Self {
        let world_size = gpus.max(1);
        let model_parallel_size = if world_size > 1 { world_size } else { 1 };
        Self { world_size, model_parallel_size }
    }

    #[cfg(test)]
    pub fn single() -> Self {
        Self::new(1)
    }

    pub fn is_distributed(&self) -> bool {
        self.world_size > 1
    }

    /// Every rank of the run, in local-rank order
    pub fn ranks(&self) -> impl Iterator<Item = RankInfo> + '_ {
        (0..self.world_size).map(move |local_rank| RankInfo {
            local_rank,
            model_parallel_rank: compute_model_parallel_rank(local_rank, self.model_parallel_size),
        })
    }
}
