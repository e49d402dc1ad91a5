// ============================================================
// Layer 3 — ProteinSequence Domain Type
// ============================================================
// One record of the preprocessed inference dataset. The
// sequence has already been tokenised upstream; we only carry
// the ids, the optional masks, and the identifier used to
// name the output file.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProteinSequence {
    /// Sequence identifier; becomes part of the output file name
    pub name: String,

    /// Token ids, including any [CLS]/[SEP] added by preprocessing
    pub input_ids: Vec<u32>,

    /// 1 = real token, 0 = padding. Absent means "all real".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input_mask: Option<Vec<u32>>,

    /// Token type ids. Absent means all zeros.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub segment_ids: Option<Vec<u32>>,
}

impl ProteinSequence {
    pub fn new(name: impl Into<String>, input_ids: Vec<u32>) -> Self {
        Self {
            name: name.into(),
            input_ids,
            input_mask: None,
            segment_ids: None,
        }
    }

    #[cfg(test)]
    pub fn with_mask(mut self, mask: Vec<u32>) -> Self {
        self.input_mask = Some(mask);
        self
    }

    #[cfg(test)]
    pub fn with_segments(mut self, segments: Vec<u32>) -> Self {
        self.segment_ids = Some(segments);
        self
    }

    /// Number of tokens, padding included
    pub fn len(&self) -> usize {
        self.input_ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.input_ids.is_empty()
    }

    /// The attention mask, defaulting to all ones
    pub fn effective_mask(&self) -> Vec<u32> {
        match &self.input_mask {
            Some(mask) => mask.clone(),
            None => vec![1; self.input_ids.len()],
        }
    }

    /// The token type ids, defaulting to all zeros
    pub fn effective_segments(&self) -> Vec<u32> {
        match &self.segment_ids {
            Some(segments) => segments.clone(),
            None => vec![0; self.input_ids.len()],
        }
    }

    /// Number of real (unmasked) tokens
    pub fn real_len(&self) -> usize {
        self.effective_mask().iter().filter(|&&m| m != 0).count()
    }

    /// Cut the sequence (and its masks) down to `max_len` tokens
    pub fn truncate(&mut self, max_len: usize) {
        self.input_ids.truncate(max_len);
        if let Some(mask) = self.input_mask.as_mut() {
            mask.truncate(max_len);
        }
        if let Some(segments) = self.segment_ids.as_mut() {
            segments.truncate(max_len);
        }
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_mask_means_all_real() {
        let seq = ProteinSequence::new("P12345", vec![2, 5, 6, 7, 3]);
        assert_eq!(seq.effective_mask(), vec![1, 1, 1, 1, 1]);
        assert_eq!(seq.effective_segments(), vec![0, 0, 0, 0, 0]);
        assert_eq!(seq.real_len(), 5);
    }

    #[test]
    fn test_real_len_ignores_padding() {
        let seq = ProteinSequence::new("P1", vec![2, 5, 3, 0, 0])
            .with_mask(vec![1, 1, 1, 0, 0]);
        assert_eq!(seq.real_len(), 3);
    }

    #[test]
    fn test_truncate_cuts_masks_too() {
        let mut seq = ProteinSequence::new("P1", vec![2, 5, 6, 7, 3])
            .with_mask(vec![1, 1, 1, 1, 1])
            .with_segments(vec![0, 0, 0, 0, 0]);
        seq.truncate(3);
        assert_eq!(seq.input_ids, vec![2, 5, 6]);
        assert_eq!(seq.input_mask.as_ref().map(Vec::len), Some(3));
        assert_eq!(seq.segment_ids.as_ref().map(Vec::len), Some(3));
    }

    #[test]
    fn test_json_record_without_masks() {
        let seq: ProteinSequence =
            serde_json::from_str(r#"{"name":"Q9","input_ids":[2,9,3]}"#).unwrap();
        assert_eq!(seq.name, "Q9");
        assert!(seq.input_mask.is_none());
    }
}
