// ============================================================
// Layer 3 — Training Error Taxonomy
// ============================================================
// Every fallible operation below the application layer returns
// TrainError. The variants map one-to-one onto how the run
// reacts to them:
//
//   DataLoad          → fatal at startup
//   ConfigParse       → recovered: warning logged, default kept
//   InsufficientData  → fatal before the first step
//   CheckpointCorrupt → fatal (never silently start from scratch)
//   StepExecution     → fatal mid-run, never retried
//
// The application layer wraps these in anyhow for context.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TrainError {
    /// Shard directory missing/empty, malformed shard, or width mismatch.
    #[error("cannot load dataset from '{}': {reason}", path.display())]
    DataLoad { path: PathBuf, reason: String },

    /// An override value could not be parsed or validated.
    #[error("invalid value '{value}' for option '{key}': expected {expected}")]
    ConfigParse {
        key:      String,
        value:    String,
        expected: &'static str,
    },

    /// Batch size larger than the usable training rows.
    #[error("batch size {batch_size} exceeds the {train_rows} usable training rows")]
    InsufficientData { batch_size: usize, train_rows: usize },

    /// A checkpoint record exists but it or its snapshot cannot be read.
    #[error("checkpoint '{}' is unreadable: {reason}", path.display())]
    CheckpointCorrupt { path: PathBuf, reason: String },

    /// The optimisation (or evaluation) step failed.
    #[error("step {global_step} failed: {reason}")]
    StepExecution { global_step: usize, reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl TrainError {
    pub fn data_load(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::DataLoad { path: path.into(), reason: reason.into() }
    }

    pub fn corrupt(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        Self::CheckpointCorrupt { path: path.into(), reason: reason.to_string() }
    }

    pub fn step(global_step: usize, reason: impl Into<String>) -> Self {
        Self::StepExecution { global_step, reason: reason.into() }
    }
}
