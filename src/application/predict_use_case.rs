// ============================================================
// Layer 2 — PredictUseCase
// ============================================================
// Orchestrates a full inference run, in order:
//
//   Step 1: Check the accelerator precondition   (Layer 6 - infra)
//   Step 2: Log the resolved configuration
//   Step 3: Build the execution context          (Layer 5 - ml)
//   Step 4: Restore and freeze the model         (Layer 6 - infra)
//   Step 5: Load the preprocessed dataset        (Layer 4 - data)
//   Step 6: Predict over every batch             (Layer 5 - ml)
//   Step 7: Write one file per sequence          (Layer 6 - infra)
//
// Any failure ends the run; there is no retry or partial
// recovery. Step 7 is skipped when no output directory is set.

use anyhow::Result;

use crate::application::config::{Accelerator, InferenceConfig};
use crate::domain::traits::{AcceleratorProbe, RepresentationSink, SequenceSource};
use crate::infra::manifest::ManifestWriter;
use crate::ml::{distributed::ExecutionContext, BatchPredictor, LoaderSettings, ModelRestorer};

/// What a finished run produced
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PredictionSummary {
    pub sequences:     usize,
    pub batches:       usize,
    pub files_written: usize,
}

pub struct PredictUseCase<P, R, S, W> {
    config:   InferenceConfig,
    probe:    P,
    restorer: R,
    source:   S,
    sink:     W,
}

impl<P, R, S, W> PredictUseCase<P, R, S, W>
where
    P: AcceleratorProbe,
    R: ModelRestorer,
    S: SequenceSource,
    W: RepresentationSink,
{
    pub fn new(config: InferenceConfig, probe: P, restorer: R, source: S, sink: W) -> Self {
        Self { config, probe, restorer, source, sink }
    }

    /// Execute the full inference pipeline end to end
    pub fn execute(&self) -> Result<PredictionSummary> {
        let cfg = &self.config;

        // ── Step 1: Accelerator precondition ─────────────────────────────────
        // Nothing else may run if the device is missing.
        if cfg.trainer.accelerator == Accelerator::Gpu {
            self.probe.ensure_available()?;
        }

        // ── Step 2: Log configuration ─────────────────────────────────────────
        // The inference backends carry no autodiff, and restored
        // parameters are marked no_grad, so nothing records gradients.
        tracing::info!("Gradient tracking disabled for inference");
        tracing::info!("Config:\n{}", cfg.to_pretty_json()?);

        // ── Step 3: Execution context ─────────────────────────────────────────
        let ctx = ExecutionContext::new(cfg.trainer.gpus);
        tracing::info!(
            "Execution context: world_size={}, model_parallel_size={}",
            ctx.world_size, ctx.model_parallel_size
        );

        // ── Step 4: Restore the frozen model ──────────────────────────────────
        let predictor = self.restorer.restore(&cfg.model.nemo_path)?;

        // ── Step 5: Dataset ───────────────────────────────────────────────────
        let sequences = self.source.load_all()?;
        let sequence_count = sequences.len();

        // ── Step 6: Prediction ────────────────────────────────────────────────
        let settings = LoaderSettings::from(&cfg.model.infer_ds);
        let batches = predictor.predict(sequences, &ctx, &settings)?;
        tracing::info!("Predicted {} sequences in {} batches", sequence_count, batches.len());

        // ── Step 7: Persist representations ───────────────────────────────────
        let mut files_written = 0usize;
        match &cfg.model.representations_path {
            Some(dir) => {
                let mut manifest = ManifestWriter::create(dir)?;
                for batch in &batches {
                    for representation in batch {
                        let path = self.sink.write(dir, representation)?;
                        manifest.record(representation, &path)?;
                        files_written += 1;
                    }
                }
                manifest.finish()?;
                tracing::info!("Wrote {} representations to '{}'", files_written, dir.display());
            }
            None => tracing::info!("No representations_path configured; nothing written"),
        }

        Ok(PredictionSummary {
            sequences: sequence_count,
            batches: batches.len(),
            files_written,
        })
    }
}
