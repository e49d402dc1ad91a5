// ============================================================
// Layer 4 — Protein Batcher
// ============================================================
// Implements Burn's Batcher trait to stack a Vec of
// ProteinSequence records into [batch, seq] tensors.
//
// Records may differ in length, so every batch is padded to
// its own longest record (pad id 0, mask 0). The sequence
// names and real lengths ride along with the tensors: that is
// what keeps each output row tied to the right identifier no
// matter how the loader orders or shuffles batches.

use burn::{
    data::dataloader::batcher::Batcher,
    prelude::*,
};

use crate::domain::sequence::ProteinSequence;

const PAD_ID: i32 = 0;

/// One padded batch ready for the encoder
#[derive(Debug, Clone)]
pub struct ProteinBatch<B: Backend> {
    /// [batch_size, seq_len]
    pub input_ids: Tensor<B, 2, Int>,

    /// [batch_size, seq_len]
    pub token_type_ids: Tensor<B, 2, Int>,

    /// [batch_size, seq_len], 1 = real token and 0 = padding
    pub attention_mask: Tensor<B, 2, Int>,

    /// Sequence identifiers, row-aligned with the tensors
    pub names: Vec<String>,

    /// Number of real tokens per row
    pub lengths: Vec<usize>,
}

/// Builds padded batches on one device. Each data-parallel rank
/// owns a batcher for its own device.
#[derive(Clone, Debug)]
pub struct ProteinBatcher<B: Backend> {
    /// Where the batch tensors are allocated
    pub device: B::Device,
}

impl<B: Backend> ProteinBatcher<B> {
    pub fn new(device: B::Device) -> Self {
        Self { device }
    }
}

impl<B: Backend> Batcher<ProteinSequence, ProteinBatch<B>> for ProteinBatcher<B> {
    fn batch(&self, items: Vec<ProteinSequence>) -> ProteinBatch<B> {
        let batch_size = items.len();
        let seq_len    = items.iter().map(ProteinSequence::len).max().unwrap_or(0);

        let mut ids_flat  = Vec::with_capacity(batch_size * seq_len);
        let mut type_flat = Vec::with_capacity(batch_size * seq_len);
        let mut mask_flat = Vec::with_capacity(batch_size * seq_len);

        for item in &items {
            let pad = seq_len - item.len();

            ids_flat.extend(item.input_ids.iter().map(|&x| x as i32));
            ids_flat.extend(std::iter::repeat(PAD_ID).take(pad));

            type_flat.extend(item.effective_segments().into_iter().map(|x| x as i32));
            type_flat.extend(std::iter::repeat(0).take(pad));

            mask_flat.extend(item.effective_mask().into_iter().map(|x| x as i32));
            mask_flat.extend(std::iter::repeat(0).take(pad));
        }

        let input_ids = Tensor::<B, 1, Int>::from_ints(
            ids_flat.as_slice(), &self.device
        ).reshape([batch_size, seq_len]);

        let token_type_ids = Tensor::<B, 1, Int>::from_ints(
            type_flat.as_slice(), &self.device
        ).reshape([batch_size, seq_len]);

        let attention_mask = Tensor::<B, 1, Int>::from_ints(
            mask_flat.as_slice(), &self.device
        ).reshape([batch_size, seq_len]);

        let lengths = items.iter().map(ProteinSequence::real_len).collect();
        let names   = items.into_iter().map(|s| s.name).collect();

        ProteinBatch { input_ids, token_type_ids, attention_mask, names, lengths }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;

    #[test]
    fn test_batch_pads_to_longest() {
        let batcher = ProteinBatcher::<NdArray>::new(Default::default());
        let batch = batcher.batch(vec![
            ProteinSequence::new("a", vec![2, 5, 3]),
            ProteinSequence::new("b", vec![2, 5, 6, 7, 3]),
        ]);

        assert_eq!(batch.input_ids.dims(), [2, 5]);
        assert_eq!(batch.names, vec!["a", "b"]);
        assert_eq!(batch.lengths, vec![3, 5]);

        let mask: Vec<i64> = batch.attention_mask.into_data().convert::<i64>().to_vec().unwrap();
        assert_eq!(mask, vec![1, 1, 1, 0, 0, 1, 1, 1, 1, 1]);

        let ids: Vec<i64> = batch.input_ids.into_data().convert::<i64>().to_vec().unwrap();
        assert_eq!(&ids[..5], &[2, 5, 3, 0, 0]);
    }

    #[test]
    fn test_existing_padding_is_kept_in_lengths() {
        let batcher = ProteinBatcher::<NdArray>::new(Default::default());
        let batch = batcher.batch(vec![
            ProteinSequence::new("p", vec![2, 5, 3, 0]).with_mask(vec![1, 1, 1, 0]),
        ]);
        assert_eq!(batch.lengths, vec![3]);
        assert_eq!(batch.input_ids.dims(), [1, 4]);
    }
}
