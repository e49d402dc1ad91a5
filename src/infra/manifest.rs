// ============================================================
// Layer 6 — Representation Manifest
// ============================================================
// Records every representation written during a run in
// <dir>/manifest.csv, in write order:
//
//   name,tokens,hidden,file
//   P69905,143,768,bert_results_P69905.pt
//
// Handy for downstream jobs that want the shapes without
// opening every tensor file. Each run starts a fresh manifest.
// The manifest sits next to the representation files, so an
// output directory for N sequences holds N + 1 files.

use anyhow::{Context, Result};
use std::{
    fs::{self, File},
    io::{BufWriter, Write},
    path::{Path, PathBuf},
};

use crate::domain::representation::Representation;

pub const MANIFEST_FILE: &str = "manifest.csv";

pub struct ManifestWriter {
    /// Kept for error messages
    csv_path: PathBuf,

    /// Open for the whole run; rows reach disk on `finish`
    out: BufWriter<File>,
}

impl ManifestWriter {
    /// Create (or replace) the manifest in `dir` and write the header row.
    pub fn create(dir: &Path) -> Result<Self> {
        fs::create_dir_all(dir)
            .with_context(|| format!("Cannot create output directory '{}'", dir.display()))?;

        let csv_path = dir.join(MANIFEST_FILE);
        let file = File::create(&csv_path)
            .with_context(|| format!("Cannot create '{}'", csv_path.display()))?;
        let mut out = BufWriter::new(file);
        writeln!(out, "name,tokens,hidden,file")?;

        Ok(Self { csv_path, out })
    }

    /// Append one row for a representation written to `file`.
    pub fn record(&mut self, rep: &Representation, file: &Path) -> Result<()> {
        let file_name = file
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default();

        writeln!(
            self.out,
            "{},{},{},{}",
            csv_field(&rep.name),
            rep.tokens(),
            rep.hidden_size(),
            csv_field(file_name),
        )
        .with_context(|| format!("Cannot append to '{}'", self.csv_path.display()))
    }

    /// Flush buffered rows. Dropping the writer without calling this
    /// loses any write error.
    pub fn finish(mut self) -> Result<()> {
        self.out
            .flush()
            .with_context(|| format!("Cannot flush '{}'", self.csv_path.display()))
    }
}

fn csv_field(value: &str) -> String {
    if value.contains([',', '"', '\n']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}
