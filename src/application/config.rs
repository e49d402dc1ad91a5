// ============================================================
// Layer 2 — Inference Configuration
// ============================================================
// The nested configuration tree for one inference run:
//
//   trainer   — how many devices and which kind
//   model     — checkpoint path, output directory
//   infer_ds  — dataset file and data loader settings
//
// It is loaded from JSON (see infra::config_loader) and logged
// in full before any work starts.

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::ml::LoaderSettings;

/// Which device family the run executes on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Accelerator {
    /// WGPU devices; an adapter must be available
    Gpu,
    /// NdArray on the host CPU
    Cpu,
}

impl Default for Accelerator {
    fn default() -> Self {
        Accelerator::Gpu
    }
}

/// Device settings. The section keeps its `trainer` name so
/// existing configuration files still load.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainerConfig {
    /// Number of devices, one data-parallel rank per device
    #[serde(default = "default_gpus")]
    pub gpus: usize,

    /// gpu enforces the accelerator check; cpu skips it
    #[serde(default)]
    pub accelerator: Accelerator,
}

impl Default for TrainerConfig {
    fn default() -> Self {
        Self { gpus: default_gpus(), accelerator: Accelerator::Gpu }
    }
}

/// The dataset to run over and how the data loader batches it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InferDatasetConfig {
    /// Preprocessed dataset, one JSON record per line
    pub data_file: PathBuf,

    /// Sequences per forward pass, per rank
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// Shuffle the order batches are drawn in; output names still
    /// follow their rows
    #[serde(default)]
    pub shuffle: bool,

    /// Shuffle seed; ignored unless `shuffle` is set
    #[serde(default = "default_seed")]
    pub seed: u64,

    /// Threads preparing batches for each rank's data loader
    #[serde(default = "default_num_workers")]
    pub num_workers: usize,

    /// Truncate longer sequences to this many tokens
    #[serde(default)]
    pub max_seq_len: Option<usize>,
}

impl Default for InferDatasetConfig {
    fn default() -> Self {
        Self {
            data_file:   PathBuf::from("data/preprocessed.jsonl"),
            batch_size:  default_batch_size(),
            shuffle:     false,
            seed:        default_seed(),
            num_workers: default_num_workers(),
            max_seq_len: None,
        }
    }
}

/// Checkpoint, output and dataset settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelSection {
    /// Checkpoint directory to restore the encoder from
    pub nemo_path: PathBuf,

    /// Where `bert_results_<name>.pt` files go; unset = write nothing
    #[serde(default)]
    pub representations_path: Option<PathBuf>,

    /// Dataset and loader settings
    pub infer_ds: InferDatasetConfig,
}

impl Default for ModelSection {
    fn default() -> Self {
        Self {
            nemo_path:            PathBuf::from("checkpoints/protbert"),
            representations_path: Some(PathBuf::from("representations")),
            infer_ds:             InferDatasetConfig::default(),
        }
    }
}

/// The root of the configuration tree
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InferenceConfig {
    /// Optional; one GPU by default
    #[serde(default)]
    pub trainer: TrainerConfig,

    pub model: ModelSection,
}

impl InferenceConfig {
    /// Reject settings no run could succeed with
    pub fn validate(&self) -> Result<()> {
        if self.trainer.gpus == 0 {
            bail!("trainer.gpus must be at least 1");
        }
        let ds = &self.model.infer_ds;
        if ds.batch_size == 0 {
            bail!("model.infer_ds.batch_size must be at least 1");
        }
        if ds.num_workers == 0 {
            bail!("model.infer_ds.num_workers must be at least 1");
        }
        if ds.max_seq_len == Some(0) {
            bail!("model.infer_ds.max_seq_len must be at least 1 when set");
        }
        Ok(())
    }

    /// The resolved tree as indented JSON, for logging
    pub fn to_pretty_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Loader settings handed to the ML layer; the predictor never
/// sees config types.
impl From<&InferDatasetConfig> for LoaderSettings {
    fn from(ds: &InferDatasetConfig) -> Self {
        LoaderSettings {
            batch_size:   ds.batch_size,
            shuffle_seed: ds.shuffle.then_some(ds.seed),
            num_workers:  ds.num_workers,
            max_seq_len:  ds.max_seq_len,
        }
    }
}

fn default_gpus() -> usize { 1 }
fn default_batch_size() -> usize { 8 }
fn default_seed() -> u64 { 42 }
fn default_num_workers() -> usize { 1 }
