// ============================================================
// Layer 6 — Representation Writer
// ============================================================
// Persists one representation per file:
//
//   <dir>/bert_results_<sequence_name>.pt
//
// The payload is a safetensors container with a single F32
// tensor "representations" of shape [tokens, hidden] and the
// sequence name in the header metadata. Files are written one
// after another with no locking; every name is unique because
// the loader rejects duplicate identifiers. The loader also
// rejects path-like names, so the check in `write` only guards
// other sources.

use anyhow::{anyhow, bail, Result};
use safetensors::tensor::{Dtype, TensorView};
use std::{
    collections::HashMap,
    path::{Path, PathBuf},
};

use crate::domain::{representation::Representation, traits::RepresentationSink};

pub const TENSOR_NAME: &str = "representations";

/// Output file name for a sequence
pub fn output_file_name(sequence_name: &str) -> String {
    format!("bert_results_{sequence_name}.pt")
}

#[derive(Debug, Default, Clone)]
pub struct SafetensorsWriter;

impl SafetensorsWriter {
    pub fn new() -> Self {
        Self
    }
}

impl RepresentationSink for SafetensorsWriter {
    fn write(&self, dir: &Path, representation: &Representation) -> Result<PathBuf> {
        let name = &representation.name;
        if name.is_empty() || name == "." || name == ".." || name.contains(['/', '\\']) {
            bail!("Sequence name '{}' cannot be used in a file name", name);
        }

        let path  = dir.join(output_file_name(name));
        let bytes = representation.to_le_bytes();
        let view  = TensorView::new(Dtype::F32, representation.shape.to_vec(), &bytes)
            .map_err(|e| anyhow!("Cannot build tensor for '{}': {e:?}", name))?;

        let metadata = Some(HashMap::from([
            ("sequence_name".to_string(), name.clone()),
        ]));

        safetensors::serialize_to_file([(TENSOR_NAME, view)], &metadata, &path)
            .map_err(|e| anyhow!("Cannot write '{}': {e:?}", path.display()))?;

        tracing::debug!("Wrote {:?} representation to '{}'", representation.shape, path.display());
        Ok(path)
    }
}
