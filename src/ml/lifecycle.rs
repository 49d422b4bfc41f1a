// ============================================================
// Layer 5 — Model Lifecycle
// ============================================================
// Decides whether a run continues an earlier one:
//
//   checkpoint record?  ──no──────────────▶ Fresh (build + save hyper.params)
//        │yes
//        ▼
//   snapshot dir exists? ──no─(warn)──────▶ Fresh
//        │yes
//        ▼
//   model.restore(snapshot) ─────────────▶ Restored
//
// A record that cannot be parsed, or a snapshot that exists but
// cannot be loaded, is CheckpointCorrupt. Falling back to fresh
// weights there would silently throw away training progress.
//
// Hyperparameters: by default the caller supplies them again on
// every run and a mismatch with hyper.params is only warned
// about. With `trust_saved` the artifact wins.

use std::path::{Path, PathBuf};

use crate::domain::{error::TrainError, hyper_params::HyperParams, traits::SequenceClassifier};
use crate::infra::checkpoint::CheckpointManager;

/// A model plus how it came to be.
#[derive(Debug)]
pub enum Lifecycle<M> {
    Fresh(M),
    Restored { model: M, snapshot: PathBuf },
}

impl<M> Lifecycle<M> {
    pub fn into_model(self) -> M {
        match self {
            Lifecycle::Fresh(model) | Lifecycle::Restored { model, .. } => model,
        }
    }

    pub fn snapshot(&self) -> Option<&Path> {
        match self {
            Lifecycle::Fresh(_) => None,
            Lifecycle::Restored { snapshot, .. } => Some(snapshot),
        }
    }
}

/// Restore the latest snapshot in `checkpoints`, or build a new model.
///
/// `build` constructs an untrained model from the hyperparameters;
/// a restore starts from such a model and loads the snapshot into it.
pub fn create_or_restore<M, F>(
    checkpoints: &CheckpointManager,
    params:      &HyperParams,
    vocab_size:  usize,
    build:       F,
) -> Result<Lifecycle<M>, TrainError>
where
    M: SequenceClassifier,
    F: FnOnce(&HyperParams) -> M,
{
    match checkpoints.latest()? {
        Some(snapshot) if snapshot.is_dir() => {
            tracing::info!("Reading model parameters from '{}'", snapshot.display());
            let model = build(params).restore(&snapshot)?;
            tracing::info!(
                "Restored global step {} at learning rate {}",
                model.global_step(),
                model.learning_rate()
            );
            Ok(Lifecycle::Restored { model, snapshot })
        }
        stale => {
            if let Some(missing) = stale {
                tracing::warn!(
                    "Checkpoint record points at '{}', which does not exist; starting fresh",
                    missing.display()
                );
            }
            tracing::info!("Created model with fresh parameters");
            let model = build(params);
            checkpoints.save_hyper_params(params, vocab_size)?;
            Ok(Lifecycle::Fresh(model))
        }
    }
}

/// The hyperparameters and vocabulary size a run should use.
///
/// Without `trust_saved` the supplied values are returned unchanged.
/// With it, a stored hyper.params replaces them and an unreadable one
/// is an error; otherwise an unreadable one is only warned about.
/// Either way any difference from the stored artifact is logged.
pub fn resolve_params(
    checkpoints: &CheckpointManager,
    params:      &HyperParams,
    vocab_size:  usize,
    trust_saved: bool,
) -> Result<(HyperParams, usize), TrainError> {
    let stored = match checkpoints.load_hyper_params(params) {
        Ok(stored) => stored,
        Err(e) if !trust_saved => {
            tracing::warn!("Ignoring saved hyperparameters: {e}");
            None
        }
        Err(e) => return Err(e),
    };
    let Some((saved, saved_vocab)) = stored else {
        return Ok((params.clone(), vocab_size));
    };

    let diff = params.differences(&saved, vocab_size, saved_vocab);
    if diff.is_empty() {
        return Ok((params.clone(), vocab_size));
    }

    if trust_saved {
        tracing::info!("Using saved hyperparameters; overriding {}", diff.join(", "));
        Ok((saved, saved_vocab))
    } else {
        tracing::warn!(
            "Supplied hyperparameters differ from '{}' in {}; \
             restoring may fail or behave differently (see --trust-saved-params)",
            checkpoints.dir().display(),
            diff.join(", ")
        );
        Ok((params.clone(), vocab_size))
    }
}
