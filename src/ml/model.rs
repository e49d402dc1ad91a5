// ============================================================
// Layer 5 — Protein BERT Encoder
// ============================================================
// A BERT-style encoder over amino-acid tokens:
//
//   token + position + token-type embeddings
//       → N × (self-attention → add & norm → GELU FFN → add & norm)
//       → final LayerNorm
//
// The output is the per-token hidden state tensor; there is no
// task head. Padding positions are excluded from attention via
// the key padding mask.

use burn::{
    nn::{
        attention::{MhaInput, MultiHeadAttention, MultiHeadAttentionConfig},
        Dropout, DropoutConfig,
        Embedding, EmbeddingConfig,
        LayerNorm, LayerNormConfig,
        Linear, LinearConfig,
    },
    prelude::*,
};

/// Architecture of the encoder, stored next to the weights as
/// model_config.json so a checkpoint can be rebuilt exactly.
#[derive(Config, Debug)]
pub struct ProtBertConfig {
    /// Amino-acid vocabulary plus special tokens
    #[config(default = 30)]
    pub vocab_size: usize,

    /// Longest sequence the position embedding covers
    #[config(default = 1024)]
    pub max_position: usize,

    /// Width of every hidden state (the representation width)
    #[config(default = 768)]
    pub hidden_size: usize,

    /// Attention heads per layer; must divide hidden_size
    #[config(default = 12)]
    pub num_heads: usize,

    /// Number of stacked encoder blocks
    #[config(default = 12)]
    pub num_layers: usize,

    /// Inner width of the feed-forward sublayer
    #[config(default = 3072)]
    pub intermediate_size: usize,

    /// Number of distinct segment ids
    #[config(default = 2)]
    pub type_vocab_size: usize,

    /// Inactive at inference; kept so checkpoints round-trip
    #[config(default = 0.1)]
    pub dropout: f64,
}

impl ProtBertConfig {
    pub fn init<B: Backend>(&self, device: &B::Device) -> ProtBertModel<B> {
        let token_embedding    = EmbeddingConfig::new(self.vocab_size, self.hidden_size).init(device);
        let position_embedding = EmbeddingConfig::new(self.max_position, self.hidden_size).init(device);
        let type_embedding     = EmbeddingConfig::new(self.type_vocab_size, self.hidden_size).init(device);
        let embedding_norm     = LayerNormConfig::new(self.hidden_size).init(device);
        let layers: Vec<EncoderBlock<B>> = (0..self.num_layers)
            .map(|_| self.build_encoder_block(device))
            .collect();
        let final_norm = LayerNormConfig::new(self.hidden_size).init(device);
        let dropout    = DropoutConfig::new(self.dropout).init();
        ProtBertModel {
            token_embedding, position_embedding, type_embedding,
            embedding_norm, layers, final_norm, dropout,
            vocab_size:      self.vocab_size,
            type_vocab_size: self.type_vocab_size,
            max_position:    self.max_position,
        }
    }

    fn build_encoder_block<B: Backend>(&self, device: &B::Device) -> EncoderBlock<B> {
        let self_attn   = MultiHeadAttentionConfig::new(self.hidden_size, self.num_heads)
            .with_dropout(self.dropout)
            .init(device);
        let ffn_linear1 = LinearConfig::new(self.hidden_size, self.intermediate_size).init(device);
        let ffn_linear2 = LinearConfig::new(self.intermediate_size, self.hidden_size).init(device);
        let norm1   = LayerNormConfig::new(self.hidden_size).init(device);
        let norm2   = LayerNormConfig::new(self.hidden_size).init(device);
        let dropout = DropoutConfig::new(self.dropout).init();
        EncoderBlock { self_attn, ffn_linear1, ffn_linear2, norm1, norm2, dropout }
    }
}

/// One post-norm transformer encoder layer
#[derive(Module, Debug)]
pub struct EncoderBlock<B: Backend> {
    /// Self-attention over the sequence, padding keys masked out
    pub self_attn:   MultiHeadAttention<B>,
    /// hidden → intermediate
    pub ffn_linear1: Linear<B>,
    /// intermediate → hidden
    pub ffn_linear2: Linear<B>,
    /// Applied after the attention residual
    pub norm1:       LayerNorm<B>,
    /// Applied after the feed-forward residual
    pub norm2:       LayerNorm<B>,
    pub dropout:     Dropout,
}

impl<B: Backend> EncoderBlock<B> {
    /// x: [batch, seq, hidden], pad_mask: [batch, seq] (true = padding)
    pub fn forward(&self, x: Tensor<B, 3>, pad_mask: Tensor<B, 2, Bool>) -> Tensor<B, 3> {
        let attn_input  = MhaInput::self_attn(x.clone()).mask_pad(pad_mask);
        let attn_output = self.self_attn.forward(attn_input).context;
        let x = self.norm1.forward(x + self.dropout.forward(attn_output));
        let ffn_out = self.ffn_linear2.forward(
            burn::tensor::activation::gelu(self.ffn_linear1.forward(x.clone()))
        );
        self.norm2.forward(x + self.dropout.forward(ffn_out))
    }
}

/// The full encoder. Produces hidden states only; there is no task head.
#[derive(Module, Debug)]
pub struct ProtBertModel<B: Backend> {
    /// [vocab_size, hidden]
    pub token_embedding:    Embedding<B>,
    /// [max_position, hidden]
    pub position_embedding: Embedding<B>,
    /// [type_vocab_size, hidden]
    pub type_embedding:     Embedding<B>,
    pub embedding_norm:     LayerNorm<B>,
    pub layers:             Vec<EncoderBlock<B>>,
    pub final_norm:         LayerNorm<B>,
    pub dropout:            Dropout,

    /// Token ids must be below this
    pub vocab_size:         usize,
    /// Segment ids must be below this
    pub type_vocab_size:    usize,
    /// Sequences are clipped to this many tokens
    pub max_position:       usize,
}

impl<B: Backend> ProtBertModel<B> {
    /// input_ids, token_type_ids, attention_mask: [batch, seq]
    /// → hidden states [batch, seq, hidden]
    pub fn forward(
        &self,
        input_ids:      Tensor<B, 2, Int>,
        token_type_ids: Tensor<B, 2, Int>,
        attention_mask: Tensor<B, 2, Int>,
    ) -> Tensor<B, 3> {
        let [batch_size, seq_len] = input_ids.dims();
        let device = input_ids.device();

        let tok_emb  = self.token_embedding.forward(input_ids);
        let type_emb = self.type_embedding.forward(token_type_ids);

        let positions = Tensor::<B, 1, Int>::arange(0..seq_len as i64, &device)
            .unsqueeze::<2>()
            .expand([batch_size, seq_len]);
        let pos_emb = self.position_embedding.forward(positions);

        let mut x = self.dropout.forward(
            self.embedding_norm.forward(tok_emb + pos_emb + type_emb)
        );

        let pad_mask = attention_mask.equal_elem(0);
        for layer in &self.layers {
            x = layer.forward(x, pad_mask.clone());
        }
        self.final_norm.forward(x)
    }
}

/// A small architecture for tests that run on the CPU backend
#[cfg(test)]
pub(crate) fn tiny_config() -> ProtBertConfig {
    ProtBertConfig::new()
        .with_vocab_size(25)
        .with_max_position(32)
        .with_hidden_size(16)
        .with_num_heads(2)
        .with_num_layers(2)
        .with_intermediate_size(32)
        .with_dropout(0.0)
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;

    #[test]
    fn test_forward_shape() {
        let device = Default::default();
        let model: ProtBertModel<NdArray> = tiny_config().init(&device);

        let ids  = Tensor::<NdArray, 1, Int>::from_ints([2, 5, 6, 3, 2, 7, 3, 0].as_slice(), &device)
            .reshape([2, 4]);
        let types = ids.zeros_like();
        let mask = Tensor::<NdArray, 1, Int>::from_ints([1, 1, 1, 1, 1, 1, 1, 0].as_slice(), &device)
            .reshape([2, 4]);

        let hidden = model.forward(ids, types, mask);
        assert_eq!(hidden.dims(), [2, 4, 16]);
    }

    #[test]
    fn test_padding_does_not_change_real_tokens() {
        let device = Default::default();
        let model: ProtBertModel<NdArray> = tiny_config().init(&device);

        let short = Tensor::<NdArray, 1, Int>::from_ints([2, 5, 3].as_slice(), &device)
            .reshape([1, 3]);
        let short_mask = short.ones_like();
        let a = model.forward(short.clone(), short.zeros_like(), short_mask);

        let padded = Tensor::<NdArray, 1, Int>::from_ints([2, 5, 3, 0, 0].as_slice(), &device)
            .reshape([1, 5]);
        let padded_mask = Tensor::<NdArray, 1, Int>::from_ints([1, 1, 1, 0, 0].as_slice(), &device)
            .reshape([1, 5]);
        let b = model
            .forward(padded.clone(), padded.zeros_like(), padded_mask)
            .slice([0..1, 0..3, 0..16]);

        let diff: Vec<f32> = (a - b).abs().into_data().to_vec().unwrap();
        let max_diff = diff.iter().copied().fold(0.0_f32, f32::max);
        assert!(max_diff < 1e-3, "max diff {max_diff}");
    }
}
