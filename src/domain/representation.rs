// ============================================================
// Layer 3 — Representation Domain Type
// ============================================================
// The hidden states the encoder produced for one sequence,
// copied off the device into a plain row-major buffer.
// Once produced it belongs to the caller and is persisted
// independently of every other sequence.

#[derive(Debug, Clone, PartialEq)]
pub struct Representation {
    /// Identifier of the sequence this output belongs to
    pub name: String,

    /// [tokens, hidden]
    pub shape: [usize; 2],

    /// Row-major values, `shape[0] * shape[1]` long
    pub values: Vec<f32>,
}

impl Representation {
    pub fn new(name: impl Into<String>, shape: [usize; 2], values: Vec<f32>) -> Self {
        debug_assert_eq!(shape[0] * shape[1], values.len());
        Self { name: name.into(), shape, values }
    }

    pub fn tokens(&self) -> usize {
        self.shape[0]
    }

    pub fn hidden_size(&self) -> usize {
        self.shape[1]
    }

    /// Hidden vector of a single token
    #[cfg(test)]
    pub fn token(&self, index: usize) -> Option<&[f32]> {
        if index >= self.tokens() {
            return None;
        }
        let h = self.hidden_size();
        Some(&self.values[index * h..(index + 1) * h])
    }

    /// Little-endian bytes of the values, as stored on disk
    pub fn to_le_bytes(&self) -> Vec<u8> {
        self.values.iter().flat_map(|v| v.to_le_bytes()).collect()
    }
}
