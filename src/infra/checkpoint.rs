// ============================================================
// Layer 6 — Checkpoint Store
// ============================================================
// Restores the pretrained encoder from a checkpoint directory
// using Burn's MessagePack + gzip recorder at full precision.
//
// Checkpoint layout:
//   <checkpoint>/
//     model_config.json   ← ProtBertConfig (architecture)
//     model.mpk.gz        ← all parameters, MessagePack + gzip
//
// The config is needed to rebuild the exact architecture
// before the weights can be loaded into it. Loading fails if
// either file is missing or the weights cannot be decoded
// into that architecture.

use anyhow::{anyhow, bail, Context, Result};
use std::{fs, path::Path};
use burn::{
    prelude::*,
    record::{FullPrecisionSettings, NamedMpkGzFileRecorder, Recorder},
};

use crate::ml::{
    model::{ProtBertConfig, ProtBertModel},
    predictor::BertPredictor,
    ModelRestorer,
};

const CONFIG_FILE: &str = "model_config.json";
const WEIGHTS_FILE: &str = "model";

type WeightsRecorder = NamedMpkGzFileRecorder<FullPrecisionSettings>;

/// Restores frozen encoders onto a fixed set of devices.
pub struct CheckpointStore<B: Backend> {
    /// One per data-parallel rank; the model is loaded onto the
    /// first and forked onto the rest at prediction time
    devices: Vec<B::Device>,
}

impl<B: Backend> CheckpointStore<B> {
    /// `devices` must not be empty for `restore` to succeed.
    pub fn new(devices: Vec<B::Device>) -> Self {
        Self { devices }
    }

    /// Write config and weights so `restore` can read them back.
    ///
    /// Checkpoints are normally produced by a training job; inside
    /// this crate only the tests call it.
    #[cfg_attr(not(test), allow(dead_code))]
    pub fn save(dir: &Path, config: &ProtBertConfig, model: &ProtBertModel<B>) -> Result<()> {
        fs::create_dir_all(dir)
            .with_context(|| format!("Cannot create checkpoint directory '{}'", dir.display()))?;

        let config_path = dir.join(CONFIG_FILE);
        config
            .save(&config_path)
            .with_context(|| format!("Cannot write '{}'", config_path.display()))?;

        // Recorder adds the .mpk.gz extension itself
        let weights_path = dir.join(WEIGHTS_FILE);
        WeightsRecorder::new()
            .record(model.clone().into_record(), weights_path.clone())
            .with_context(|| {
                format!("Failed to save checkpoint to '{}'", weights_path.display())
            })?;

        tracing::debug!("Saved checkpoint to '{}'", dir.display());
        Ok(())
    }

    /// Read the architecture config of a checkpoint.
    pub fn load_config(dir: &Path) -> Result<ProtBertConfig> {
        let path = dir.join(CONFIG_FILE);
        if !path.is_file() {
            bail!("Checkpoint '{}' has no {}", dir.display(), CONFIG_FILE);
        }
        ProtBertConfig::load(&path)
            .map_err(|e| anyhow!("Cannot read '{}': {e}", path.display()))
    }

    /// Rebuild the model on `device` and load the saved weights into it.
    ///
    /// The architecture comes from model_config.json, so a
    /// checkpoint of any size restores without extra settings.
    pub fn load_model(dir: &Path, device: &B::Device) -> Result<ProtBertModel<B>> {
        let config = Self::load_config(dir)?;
        let model: ProtBertModel<B> = config.init(device);

        let weights_path = dir.join(WEIGHTS_FILE);
        let record = WeightsRecorder::new()
            .load(weights_path.clone(), device)
            .with_context(|| {
                format!(
                    "Cannot load weights '{}'. Is this a protein BERT checkpoint?",
                    weights_path.display()
                )
            })?;

        Ok(model.load_record(record))
    }
}

impl<B: Backend> ModelRestorer for CheckpointStore<B> {
    type Predictor = BertPredictor<B>;

    fn restore(&self, checkpoint: &Path) -> Result<BertPredictor<B>> {
        let device = self
            .devices
            .first()
            .ok_or_else(|| anyhow!("No devices to restore the model onto"))?;

        tracing::info!("Restoring model from '{}'", checkpoint.display());
        let model = Self::load_model(checkpoint, device)?.no_grad();
        tracing::info!("Model restored and frozen: {} parameters", model.num_params());

        Ok(BertPredictor::new(model, self.devices.clone()))
    }
}
