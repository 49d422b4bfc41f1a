// ============================================================
// Layer 3 — Core Traits (Abstractions)
// ============================================================
// The training loop only talks to its collaborators through
// these traits:
//
//   Vocabulary         — how many token ids exist
//   Preprocessor       — makes sure the numeric shards are on disk
//   SequenceClassifier — the model's batch/step/checkpoint contract
//
// The burn LSTM classifier implements SequenceClassifier in the
// ml layer; tests use small deterministic fakes instead.

use std::path::Path;

use crate::domain::dataset::Rows;
use crate::domain::error::TrainError;

// ─── Vocabulary ───────────────────────────────────────────────────────────────
/// Black-box token vocabulary; only its size matters for training.
pub trait Vocabulary {
    fn size(&self) -> usize;
}

// ─── Preprocessor ─────────────────────────────────────────────────────────────
/// Produces the shard files consumed by the dataset loader.
/// Must be idempotent: calling it when shards already exist is fine.
pub trait Preprocessor {
    fn run(&self, max_seq_length: usize) -> anyhow::Result<()>;
}

// ─── SequenceClassifier ───────────────────────────────────────────────────────
/// Whether a step updates parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepMode {
    Train,
    Eval,
}

/// Result of one step over one batch.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StepOutput {
    pub loss:    f64,
    /// Rows whose predicted class matched the label.
    pub correct: usize,
    pub total:   usize,
}

impl StepOutput {
    pub fn accuracy(&self) -> f64 {
        if self.total == 0 { 0.0 } else { self.correct as f64 / self.total as f64 }
    }
}

/// A trainable sequence classifier with its optimiser state.
///
/// Invariants every implementation upholds:
///   - `global_step` grows by exactly one per `StepMode::Train` step
///     and never otherwise
///   - `learning_rate` only ever decreases or stays the same
///   - `save` followed by `restore` reproduces step, rate and parameters
pub trait SequenceClassifier: Sized {
    type Batch;

    /// Draw one batch from `rows` and shape it for `step`.
    fn get_batch(&mut self, rows: Rows<'_>) -> Result<Self::Batch, TrainError>;

    /// Run one forward pass, plus a parameter update in `Train` mode.
    fn step(&mut self, batch: Self::Batch, mode: StepMode) -> Result<StepOutput, TrainError>;

    fn global_step(&self) -> usize;

    fn learning_rate(&self) -> f64;

    /// Multiply the learning rate by the configured decay factor.
    fn decay_learning_rate(&mut self);

    /// Write a full snapshot (parameters, optimiser, step, rate) into `dir`.
    fn save(&self, dir: &Path) -> Result<(), TrainError>;

    /// Load a snapshot written by `save`.
    fn restore(self, dir: &Path) -> Result<Self, TrainError>;
}
