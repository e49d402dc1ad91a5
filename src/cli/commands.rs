// ============================================================
// Layer 1 — CLI Commands and Arguments
// ============================================================
// Two subcommands: `predict` runs inference, `print-config`
// shows the configuration a run would use. Both take the same
// configuration arguments, so what print-config shows is
// exactly what predict will log.

use clap::{Args, Subcommand};
use std::path::PathBuf;

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Restore a checkpoint and write per-sequence representations
    Predict(ConfigArgs),

    /// Print the resolved configuration as JSON and exit
    PrintConfig(ConfigArgs),
}

/// Where the configuration comes from.
#[derive(Args, Debug, Clone)]
pub struct ConfigArgs {
    /// JSON configuration file; built-in defaults when omitted
    #[arg(long, short = 'c')]
    pub config: Option<PathBuf>,

    /// Overrides applied after the file, e.g.
    /// model.infer_ds.batch_size=32 trainer.gpus=2
    #[arg(value_name = "KEY=VALUE")]
    pub overrides: Vec<String>,
}
