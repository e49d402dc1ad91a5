// ============================================================
// Layer 1 — CLI / Presentation Layer
// ============================================================
// Parses arguments with clap, resolves the configuration, and
// wires the concrete infra implementations for the chosen
// backend into the predict use case. No inference logic here.

pub mod commands;

use anyhow::Result;
use burn::backend::{NdArray, Wgpu};
use clap::Parser;
use commands::{Commands, ConfigArgs};

use crate::application::{
    config::{Accelerator, InferenceConfig},
    predict_use_case::PredictUseCase,
};
use crate::data::loader::JsonlSequenceLoader;
use crate::infra::{
    checkpoint::CheckpointStore,
    config_loader,
    device::{cpu_devices, wgpu_devices, WgpuProbe},
    representation_writer::SafetensorsWriter,
};

#[derive(Parser, Debug)]
#[command(
    name = "protbert-infer",
    version,
    about = "Extract per-sequence hidden states from a protein BERT checkpoint."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    pub fn run(self) -> Result<()> {
        match self.command {
            Commands::Predict(args)     => run_predict(args),
            Commands::PrintConfig(args) => run_print_config(args),
        }
    }
}

fn resolve(args: &ConfigArgs) -> Result<InferenceConfig> {
    config_loader::load(args.config.as_deref(), &args.overrides)
}

fn run_print_config(args: ConfigArgs) -> Result<()> {
    let cfg = resolve(&args)?;
    println!("{}", cfg.to_pretty_json()?);
    Ok(())
}

fn run_predict(args: ConfigArgs) -> Result<()> {
    let cfg    = resolve(&args)?;
    let gpus   = cfg.trainer.gpus;
    let source = JsonlSequenceLoader::new(&cfg.model.infer_ds.data_file);

    let summary = match cfg.trainer.accelerator {
        Accelerator::Gpu => {
            let devices = wgpu_devices(gpus);
            PredictUseCase::new(
                cfg,
                WgpuProbe::new(devices.clone()),
                CheckpointStore::<Wgpu>::new(devices),
                source,
                SafetensorsWriter::new(),
            )
            .execute()?
        }
        Accelerator::Cpu => {
            tracing::warn!("Running on CPU; this is only practical for small models");
            PredictUseCase::new(
                cfg,
                // CPU runs never consult the probe
                WgpuProbe::new(Vec::new()),
                CheckpointStore::<NdArray>::new(cpu_devices(gpus)),
                source,
                SafetensorsWriter::new(),
            )
            .execute()?
        }
    };

    println!(
        "Processed {} sequences in {} batches; wrote {} files.",
        summary.sequences, summary.batches, summary.files_written
    );
    Ok(())
}
