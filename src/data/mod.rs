// ============================================================
// Layer 4 — Data Pipeline
// ============================================================
// From the preprocessed file to device-ready tensor batches:
//
//   preprocessed .jsonl
//       │
//       ▼
//   JsonlSequenceLoader → validated ProteinSequence records
//       │
//       ▼
//   ProteinDataset      → burn Dataset (optionally truncated)
//       │
//       ▼
//   ShardDataset        → one rank's strided share
//       │
//       ▼
//   ProteinBatcher      → padded tensors + names per batch
//       │
//       ▼
//   DataLoader          → feeds batches to the predictor

/// Reads the preprocessed JSON Lines dataset
pub mod loader;

/// burn Dataset implementations, including the per-rank shard
pub mod dataset;

/// burn Batcher that pads records into tensor batches
pub mod batcher;
