// ============================================================
// Layer 4 — Preprocessed Dataset Loader
// ============================================================
// Reads the preprocessed inference file: JSON Lines, one
// record per line:
//
//   {"name": "P69905", "input_ids": [2, 14, 7, ...], "input_mask": [1, 1, ...]}
//
// `input_mask` and `segment_ids` are optional. Blank lines are
// skipped. Every other problem is an error naming the line,
// because a silently dropped record would leave a hole in the
// output directory.

use anyhow::{bail, Context, Result};
use std::{
    collections::HashSet,
    fs::File,
    io::{BufRead, BufReader},
    path::PathBuf,
};

use crate::domain::sequence::ProteinSequence;
use crate::domain::traits::SequenceSource;

pub struct JsonlSequenceLoader {
    path: PathBuf,
}

impl JsonlSequenceLoader {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl SequenceSource for JsonlSequenceLoader {
    fn load_all(&self) -> Result<Vec<ProteinSequence>> {
        let file = File::open(&self.path)
            .with_context(|| format!("Cannot open dataset '{}'", self.path.display()))?;

        let mut sequences = Vec::new();
        let mut seen = HashSet::new();

        for (idx, line) in BufReader::new(file).lines().enumerate() {
            let line_no = idx + 1;
            let line = line.with_context(|| {
                format!("Cannot read line {} of '{}'", line_no, self.path.display())
            })?;
            if line.trim().is_empty() {
                continue;
            }

            let seq: ProteinSequence = serde_json::from_str(&line).with_context(|| {
                format!("Malformed record on line {} of '{}'", line_no, self.path.display())
            })?;
            validate_record(&seq).with_context(|| {
                format!("Invalid record on line {} of '{}'", line_no, self.path.display())
            })?;

            if !seen.insert(seq.name.clone()) {
                bail!("Duplicate sequence name '{}' on line {}", seq.name, line_no);
            }
            sequences.push(seq);
        }

        tracing::info!("Loaded {} sequences from '{}'", sequences.len(), self.path.display());
        Ok(sequences)
    }
}

fn validate_record(seq: &ProteinSequence) -> Result<()> {
    if seq.name.trim().is_empty() {
        bail!("empty sequence name");
    }
    // The name becomes part of bert_results_<name>.pt
    if seq.name == "." || seq.name == ".." || seq.name.contains(['/', '\\']) {
        bail!("'{}' cannot be used in an output file name", seq.name);
    }
    if seq.is_empty() {
        bail!("'{}' has no input_ids", seq.name);
    }
    if let Some(mask) = &seq.input_mask {
        if mask.len() != seq.len() {
            bail!("'{}': input_mask has {} entries, expected {}", seq.name, mask.len(), seq.len());
        }
        if mask.iter().any(|&m| m > 1) {
            bail!("'{}': input_mask must contain only 0 and 1", seq.name);
        }
        // Real tokens first, padding after.
        if mask.windows(2).any(|w| w[0] < w[1]) {
            bail!("'{}': input_mask has padding before real tokens", seq.name);
        }
        if mask.first() != Some(&1) {
            bail!("'{}': input_mask has no real tokens", seq.name);
        }
    }
    if let Some(segments) = &seq.segment_ids {
        if segments.len() != seq.len() {
            bail!("'{}': segment_ids has {} entries, expected {}", seq.name, segments.len(), seq.len());
        }
    }
    Ok(())
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn write_dataset(test_name: &str, body: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("protbert_loader_{test_name}"));
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join("data.jsonl");
        fs::write(&path, body).unwrap();
        path
    }

    #[test]
    fn test_loads_records_in_file_order() {
        let path = write_dataset(
            "order",
            "{\"name\":\"b\",\"input_ids\":[2,5,3]}\n\n{\"name\":\"a\",\"input_ids\":[2,6,6,3]}\n",
        );
        let seqs = JsonlSequenceLoader::new(&path).load_all().unwrap();
        let names: Vec<_> = seqs.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["b", "a"]);
    }

    #[test]
    fn test_malformed_line_is_an_error() {
        let path = write_dataset("malformed", "{\"name\":\"a\",\"input_ids\":[2,3]}\nnot json\n");
        let err = JsonlSequenceLoader::new(&path).load_all().unwrap_err();
        assert!(format!("{err:#}").contains("line 2"));
    }

    #[test]
    fn test_duplicate_names_rejected() {
        let path = write_dataset(
            "duplicate",
            "{\"name\":\"a\",\"input_ids\":[2,3]}\n{\"name\":\"a\",\"input_ids\":[2,4,3]}\n",
        );
        assert!(JsonlSequenceLoader::new(&path).load_all().is_err());
    }

    #[test]
    fn test_path_like_name_rejected_before_later_records() {
        let path = write_dataset(
            "path_name",
            "{\"name\":\"ok\",\"input_ids\":[2,3]}\n{\"name\":\"../escape\",\"input_ids\":[2,4,3]}\n",
        );
        let err = JsonlSequenceLoader::new(&path).load_all().unwrap_err();
        assert!(format!("{err:#}").contains("line 2"));
    }

    #[test]
    fn test_mask_length_mismatch_rejected() {
        let path = write_dataset(
            "mask_len",
            "{\"name\":\"a\",\"input_ids\":[2,5,3],\"input_mask\":[1,1]}\n",
        );
        assert!(JsonlSequenceLoader::new(&path).load_all().is_err());
    }

    #[test]
    fn test_leading_padding_rejected() {
        let path = write_dataset(
            "mask_order",
            "{\"name\":\"a\",\"input_ids\":[0,5,3],\"input_mask\":[0,1,1]}\n",
        );
        assert!(JsonlSequenceLoader::new(&path).load_all().is_err());
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let loader = JsonlSequenceLoader::new("/nonexistent/protbert/data.jsonl");
        assert!(loader.load_all().is_err());
    }
}
