// ============================================================
// Layer 5 — Predictor
// ============================================================
// Runs the frozen encoder over every batch of the dataset.
//
// One rank per device. With a single device the loop runs on
// the calling thread; otherwise each rank gets a scoped thread,
// its own copy of the model forked onto its device, and a
// strided shard of the dataset. Results are gathered rank by
// rank, batch by batch.

use anyhow::{anyhow, bail, Result};
use burn::{data::dataloader::DataLoaderBuilder, prelude::*};
use std::sync::Arc;

use crate::data::{
    batcher::ProteinBatcher,
    dataset::{ProteinDataset, ShardDataset},
};
use crate::domain::{representation::Representation, sequence::ProteinSequence};
use crate::ml::{
    distributed::{ExecutionContext, RankInfo},
    model::ProtBertModel,
    BatchPredictor, LoaderSettings,
};

pub struct BertPredictor<B: Backend> {
    model:   ProtBertModel<B>,
    devices: Vec<B::Device>,
}

impl<B: Backend> BertPredictor<B> {
    /// `model` must already live on `devices[0]`
    pub fn new(model: ProtBertModel<B>, devices: Vec<B::Device>) -> Self {
        Self { model, devices }
    }

    fn device_for(&self, rank: &RankInfo) -> B::Device {
        self.devices[rank.local_rank % self.devices.len()].clone()
    }

    /// Every id must index into its embedding table; an id past the
    /// end makes the lookup panic instead of returning an error.
    fn check_token_ids(&self, sequences: &[ProteinSequence]) -> Result<()> {
        let vocab_size      = self.model.vocab_size;
        let type_vocab_size = self.model.type_vocab_size;

        for seq in sequences {
            if let Some(id) = seq.input_ids.iter().find(|&&id| id as usize >= vocab_size) {
                bail!(
                    "Sequence '{}' has token id {} but the model vocabulary has {} entries",
                    seq.name, id, vocab_size
                );
            }
            let segments = seq.segment_ids.as_deref().unwrap_or_default();
            if let Some(id) = segments.iter().find(|&&id| id as usize >= type_vocab_size) {
                bail!(
                    "Sequence '{}' has segment id {} but the model has {} token types",
                    seq.name, id, type_vocab_size
                );
            }
        }
        Ok(())
    }
}

impl<B: Backend> BatchPredictor for BertPredictor<B> {
    fn predict(
        &self,
        sequences: Vec<ProteinSequence>,
        ctx:       &ExecutionContext,
        settings:  &LoaderSettings,
    ) -> Result<Vec<Vec<Representation>>> {
        if self.devices.is_empty() {
            bail!("No devices available for prediction");
        }
        self.check_token_ids(&sequences)?;

        let limit = settings
            .max_seq_len
            .map_or(self.model.max_position, |m| m.min(self.model.max_position));
        let dataset = Arc::new(ProteinDataset::truncated(sequences, limit));

        if !ctx.is_distributed() {
            let rank   = RankInfo { local_rank: 0, model_parallel_rank: 0 };
            let shard  = ShardDataset::new(dataset, 0, 1);
            let device = self.device_for(&rank);
            return run_shard(&self.model, shard, device, settings, rank);
        }

        let per_rank: Vec<Result<Vec<Vec<Representation>>>> = std::thread::scope(|scope| {
            let handles: Vec<_> = ctx
                .ranks()
                .map(|rank| {
                    let device = self.device_for(&rank);
                    let model  = self.model.clone().fork(&device);
                    let shard  = ShardDataset::new(dataset.clone(), rank.local_rank, ctx.world_size);
                    scope.spawn(move || run_shard(&model, shard, device, settings, rank))
                })
                .collect();

            handles
                .into_iter()
                .map(|h| h.join().unwrap_or_else(|_| Err(anyhow!("Prediction worker panicked"))))
                .collect()
        });

        let mut batches = Vec::new();
        for result in per_rank {
            batches.extend(result?);
        }
        Ok(batches)
    }
}

fn run_shard<B: Backend>(
    model:    &ProtBertModel<B>,
    shard:    ShardDataset,
    device:   B::Device,
    settings: &LoaderSettings,
    rank:     RankInfo,
) -> Result<Vec<Vec<Representation>>> {
    use burn::data::dataset::Dataset;

    let shard_len = shard.len();
    if shard_len == 0 {
        tracing::info!("Rank {} has no sequences to process", rank.local_rank);
        return Ok(Vec::new());
    }

    let batcher = ProteinBatcher::<B>::new(device);
    let mut builder = DataLoaderBuilder::new(batcher)
        .batch_size(settings.batch_size)
        .num_workers(settings.num_workers);
    if let Some(seed) = settings.shuffle_seed {
        builder = builder.shuffle(seed);
    }
    let loader = builder.build(shard);

    let mut out = Vec::new();
    for batch in loader.iter() {
        let hidden = model.forward(batch.input_ids, batch.token_type_ids, batch.attention_mask);
        out.push(split_representations(hidden, &batch.names, &batch.lengths)?);
    }

    tracing::info!(
        "Rank {} (model-parallel rank {}): {} sequences in {} batches",
        rank.local_rank, rank.model_parallel_rank, shard_len, out.len()
    );
    Ok(out)
}

/// Copy hidden states [batch, seq, hidden] to the host and cut
/// each row down to its real tokens.
pub fn split_representations<B: Backend>(
    hidden:  Tensor<B, 3>,
    names:   &[String],
    lengths: &[usize],
) -> Result<Vec<Representation>> {
    let [batch_size, seq_len, hidden_size] = hidden.dims();
    if names.len() != batch_size || lengths.len() != batch_size {
        bail!(
            "Batch has {} rows but {} names and {} lengths",
            batch_size, names.len(), lengths.len()
        );
    }

    let values: Vec<f32> = hidden
        .into_data()
        .convert::<f32>()
        .to_vec()
        .map_err(|e| anyhow!("Cannot read hidden states: {e:?}"))?;

    names
        .iter()
        .zip(lengths)
        .enumerate()
        .map(|(row, (name, &len))| {
            if len > seq_len {
                bail!("'{}' claims {} tokens in a batch of width {}", name, len, seq_len);
            }
            let start = row * seq_len * hidden_size;
            let end   = start + len * hidden_size;
            Ok(Representation::new(name.clone(), [len, hidden_size], values[start..end].to_vec()))
        })
        .collect()
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::ml::model::tiny_config;
    use burn::backend::NdArray;

    fn sequences(n: usize) -> Vec<ProteinSequence> {
        (0..n)
            .map(|i| ProteinSequence::new(format!("prot{i}"), vec![2; 3 + i % 4]))
            .collect()
    }

    fn predictor(devices: usize) -> BertPredictor<NdArray> {
        let device = Default::default();
        let model = tiny_config().init::<NdArray>(&device).no_grad();
        BertPredictor::new(model, vec![device; devices])
    }

    #[test]
    fn test_split_trims_padding_rows() {
        let device = Default::default();
        let hidden = Tensor::<NdArray, 1>::from_floats(
            [0.0, 1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0, 10.0, 11.0].as_slice(),
            &device,
        )
        .reshape([2, 3, 2]);
        let names = vec!["a".to_string(), "b".to_string()];
        let reps = split_representations(hidden, &names, &[2, 3]).unwrap();

        assert_eq!(reps[0].shape, [2, 2]);
        assert_eq!(reps[0].values, vec![0.0, 1.0, 2.0, 3.0]);
        assert_eq!(reps[1].shape, [3, 2]);
        assert_eq!(reps[1].values, vec![6.0, 7.0, 8.0, 9.0, 10.0, 11.0]);
    }

    #[test]
    fn test_split_rejects_mismatched_names() {
        let device = Default::default();
        let hidden = Tensor::<NdArray, 3>::zeros([2, 3, 2], &device);
        assert!(split_representations(hidden, &["a".to_string()], &[3]).is_err());
    }

    #[test]
    fn test_single_rank_keeps_dataset_order() {
        let settings = LoaderSettings { batch_size: 3, ..Default::default() };
        let batches = predictor(1)
            .predict(sequences(7), &ExecutionContext::single(), &settings)
            .unwrap();

        assert_eq!(batches.len(), 3);
        let names: Vec<_> = batches.iter().flatten().map(|r| r.name.clone()).collect();
        let expected: Vec<_> = (0..7).map(|i| format!("prot{i}")).collect();
        assert_eq!(names, expected);

        for rep in batches.iter().flatten() {
            assert_eq!(rep.hidden_size(), 16);
        }
        assert_eq!(batches[0][1].tokens(), 4);
    }

    #[test]
    fn test_two_ranks_cover_every_sequence_once() {
        let settings = LoaderSettings { batch_size: 2, ..Default::default() };
        let batches = predictor(2)
            .predict(sequences(5), &ExecutionContext::new(2), &settings)
            .unwrap();

        let mut names: Vec<_> = batches.iter().flatten().map(|r| r.name.clone()).collect();
        assert_eq!(names.len(), 5);
        names.sort();
        names.dedup();
        assert_eq!(names.len(), 5);
    }

    /// Sequence `lenN` has exactly N tokens, so a row's name and
    /// its token count must agree.
    fn distinct_lengths(n: usize) -> Vec<ProteinSequence> {
        (2..n + 2)
            .map(|len| ProteinSequence::new(format!("len{len}"), vec![4; len]))
            .collect()
    }

    fn assert_rows_match_inputs(batches: &[Vec<Representation>], n: usize) {
        let mut rows: Vec<(String, usize)> = batches
            .iter()
            .flatten()
            .map(|r| (r.name.clone(), r.tokens()))
            .collect();
        rows.sort();
        let mut expected: Vec<(String, usize)> =
            (2..n + 2).map(|len| (format!("len{len}"), len)).collect();
        expected.sort();
        assert_eq!(rows, expected);
    }

    #[test]
    fn test_names_follow_rows_when_shuffled_with_workers() {
        let settings = LoaderSettings {
            batch_size:   3,
            shuffle_seed: Some(7),
            num_workers:  3,
            max_seq_len:  None,
        };
        let batches = predictor(1)
            .predict(distinct_lengths(10), &ExecutionContext::single(), &settings)
            .unwrap();
        assert_rows_match_inputs(&batches, 10);
    }

    #[test]
    fn test_names_follow_rows_across_shuffled_ranks() {
        let settings = LoaderSettings {
            batch_size:   2,
            shuffle_seed: Some(42),
            num_workers:  2,
            max_seq_len:  None,
        };
        let batches = predictor(2)
            .predict(distinct_lengths(9), &ExecutionContext::new(2), &settings)
            .unwrap();
        assert_rows_match_inputs(&batches, 9);
    }

    #[test]
    fn test_token_id_outside_vocabulary_is_an_error() {
        let seqs = vec![
            ProteinSequence::new("fine", vec![2, 5, 3]),
            ProteinSequence::new("bad", vec![2, 99, 3]),
        ];
        let err = predictor(1)
            .predict(seqs, &ExecutionContext::single(), &LoaderSettings::default())
            .unwrap_err();
        let msg = format!("{err:#}");
        assert!(msg.contains("'bad'") && msg.contains("99"), "{msg}");
    }

    #[test]
    fn test_token_id_outside_vocabulary_fails_on_every_rank_count() {
        let seqs = vec![
            ProteinSequence::new("a", vec![2, 5, 3]),
            ProteinSequence::new("b", vec![2, 4_000_000_000, 3]),
        ];
        let result = predictor(2).predict(seqs, &ExecutionContext::new(2), &LoaderSettings::default());
        assert!(result.is_err());
    }

    #[test]
    fn test_segment_id_outside_type_vocabulary_is_an_error() {
        let seqs = vec![ProteinSequence::new("seg", vec![2, 5, 3]).with_segments(vec![0, 2, 0])];
        let err = predictor(1)
            .predict(seqs, &ExecutionContext::single(), &LoaderSettings::default())
            .unwrap_err();
        assert!(format!("{err:#}").contains("segment id 2"));
    }

    #[test]
    fn test_long_sequences_clipped_to_model_positions() {
        let long = vec![ProteinSequence::new("long", vec![5; 40])];
        let batches = predictor(1)
            .predict(long, &ExecutionContext::single(), &LoaderSettings::default())
            .unwrap();
        assert_eq!(batches[0][0].tokens(), 32);
    }
}
