// ============================================================
// Layer 4 — Sentiment Batcher
// ============================================================
// Turns a handful of dataset rows into model-ready tensors.
//
// Two stages:
//
//   rows (&[i64])  ──batch()──▶  RowBatch        (plain Vecs, validated)
//   RowBatch       ──to_tensors::<B>()──▶  SentimentBatch<B>
//
// Keeping the first stage backend-free lets the same batch be
// sent to the autodiff backend for training or to the inner
// backend for evaluation.
//
// Every row is padded with 0 (or truncated) to max_seq_length.
// The true length is clamped into [1, max_seq_length] and is
// encoded as a one-hot mask over time steps so the model can
// pick the LSTM output at the last real token:
//
//   len = 3, max_seq_length = 5  →  mask = [0, 0, 1, 0, 0]
//
// Reference: Burn Book §4 (Batcher)

use burn::prelude::*;
use burn::tensor::TensorData;
use thiserror::Error;

/// Sentiment polarity: 0 = negative, 1 = positive.
pub const NUM_CLASSES: usize = 2;

/// Row-level problems found while building a batch.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum BatchError {
    #[error("cannot build a batch from zero rows")]
    Empty,
    #[error("row of width {0} has no room for tokens, label and length")]
    TooNarrow(usize),
    #[error("label {0} is outside 0..{NUM_CLASSES}")]
    Label(i64),
    #[error("token id {id} is outside the vocabulary of {vocab_size}")]
    Token { id: i64, vocab_size: usize },
}

/// A validated, padded batch held in plain vectors.
#[derive(Debug, Clone, PartialEq)]
pub struct RowBatch {
    /// Row-major `[batch_size, seq_len]` token ids.
    pub inputs:      Vec<i64>,
    pub targets:     Vec<i64>,
    pub seq_lengths: Vec<usize>,
    pub batch_size:  usize,
    pub seq_len:     usize,
}

/// Tensors for one forward pass.
#[derive(Debug, Clone)]
pub struct SentimentBatch<B: Backend> {
    /// `[batch_size, seq_len]`
    pub inputs:    Tensor<B, 2, Int>,
    /// `[batch_size, seq_len, 1]`, one-hot at the last real time step.
    pub last_step: Tensor<B, 3>,
    /// `[batch_size]`
    pub targets:   Tensor<B, 1, Int>,
}

#[derive(Debug, Clone)]
pub struct SentimentBatcher {
    max_seq_length: usize,
    vocab_size:     usize,
}

impl SentimentBatcher {
    pub fn new(max_seq_length: usize, vocab_size: usize) -> Self {
        Self { max_seq_length, vocab_size }
    }

    /// Pad/truncate and validate rows laid out as `[tokens.., label, length]`.
    pub fn batch(&self, rows: &[&[i64]]) -> Result<RowBatch, BatchError> {
        if rows.is_empty() {
            return Err(BatchError::Empty);
        }

        let seq_len = self.max_seq_length;
        let mut inputs      = Vec::with_capacity(rows.len() * seq_len);
        let mut targets     = Vec::with_capacity(rows.len());
        let mut seq_lengths = Vec::with_capacity(rows.len());

        for row in rows {
            if row.len() < 3 {
                return Err(BatchError::TooNarrow(row.len()));
            }
            let (tokens, tail) = row.split_at(row.len() - 2);
            let (label, length) = (tail[0], tail[1]);

            if label < 0 || label >= NUM_CLASSES as i64 {
                return Err(BatchError::Label(label));
            }

            let kept = &tokens[..tokens.len().min(seq_len)];
            if let Some(&id) = kept.iter().find(|&&id| id < 0 || id >= self.vocab_size as i64) {
                return Err(BatchError::Token { id, vocab_size: self.vocab_size });
            }
            inputs.extend_from_slice(kept);
            inputs.extend(std::iter::repeat(0).take(seq_len - kept.len()));

            targets.push(label);
            seq_lengths.push((length.max(1) as usize).min(kept.len()).max(1));
        }

        Ok(RowBatch {
            inputs,
            targets,
            seq_lengths,
            batch_size: rows.len(),
            seq_len,
        })
    }
}

impl RowBatch {
    pub fn to_tensors<B: Backend>(&self, device: &B::Device) -> SentimentBatch<B> {
        let mut mask = vec![0.0f32; self.batch_size * self.seq_len];
        for (row, &len) in self.seq_lengths.iter().enumerate() {
            mask[row * self.seq_len + len - 1] = 1.0;
        }

        let inputs = Tensor::<B, 2, Int>::from_data(
            TensorData::new(self.inputs.clone(), [self.batch_size, self.seq_len]),
            device,
        );
        let last_step = Tensor::<B, 3>::from_data(
            TensorData::new(mask, [self.batch_size, self.seq_len, 1]),
            device,
        );
        let targets = Tensor::<B, 1, Int>::from_data(
            TensorData::new(self.targets.clone(), [self.batch_size]),
            device,
        );

        SentimentBatch { inputs, last_step, targets }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;

    #[test]
    fn test_pads_and_truncates_to_max_length() {
        let batcher = SentimentBatcher::new(4, 100);
        let short: &[i64] = &[5, 6, 1, 2];
        let long:  &[i64] = &[1, 2, 3, 4, 5, 6, 0, 6];

        let b = batcher.batch(&[short, long]).unwrap();
        assert_eq!(b.batch_size, 2);
        assert_eq!(b.seq_len, 4);
        assert_eq!(b.inputs, vec![5, 6, 0, 0, 1, 2, 3, 4]);
        assert_eq!(b.targets, vec![1, 0]);
        // 6 real tokens truncated to 4
        assert_eq!(b.seq_lengths, vec![2, 4]);
    }

    #[test]
    fn test_length_is_clamped_to_at_least_one() {
        let batcher = SentimentBatcher::new(3, 10);
        let row: &[i64] = &[1, 2, 3, 0, 0];
        assert_eq!(batcher.batch(&[row]).unwrap().seq_lengths, vec![1]);
    }

    #[test]
    fn test_rejects_bad_rows() {
        let batcher = SentimentBatcher::new(3, 10);
        assert_eq!(batcher.batch(&[]), Err(BatchError::Empty));
        assert_eq!(batcher.batch(&[&[1, 1][..]]), Err(BatchError::TooNarrow(2)));
        assert_eq!(batcher.batch(&[&[1, 2, 1][..]]), Err(BatchError::Label(2)));
        assert_eq!(
            batcher.batch(&[&[10, 0, 1][..]]),
            Err(BatchError::Token { id: 10, vocab_size: 10 })
        );
    }

    #[test]
    fn test_tensor_shapes_and_mask() {
        let device = Default::default();
        let batcher = SentimentBatcher::new(5, 50);
        let rows: Vec<&[i64]> = vec![&[3, 4, 5, 1, 3][..], &[7, 0, 0, 0, 1][..]];

        let t = batcher.batch(&rows).unwrap().to_tensors::<NdArray>(&device);
        assert_eq!(t.inputs.dims(), [2, 5]);
        assert_eq!(t.last_step.dims(), [2, 5, 1]);
        assert_eq!(t.targets.dims(), [2]);

        let mask = t.last_step.into_data().to_vec::<f32>().unwrap();
        assert_eq!(
            mask,
            vec![0.0, 0.0, 1.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 0.0]
        );
    }
}
