// ============================================================
// Layer 6 — Checkpoint Manager
// ============================================================
// Owns the checkpoint directory. Nothing else writes to it.
//
// Directory layout:
//   data/checkpoints/
//     sentiment.ckpt-10/        ← snapshot after global step 10
//       model.mpk               ← network parameters
//       optimizer.mpk           ← Adam moments
//       state.json              ← {"global_step": 10, "learning_rate": 0.001}
//     sentiment.ckpt-20/
//     checkpoint                ← record: latest snapshot + retained ones
//     hyper.params              ← numeric hyperparameter artifact
//     metrics.csv               ← see metrics.rs
//
// Publishing order matters for outside readers (e.g. a serving
// process polling for new weights): the snapshot directory is
// written completely first, then the `checkpoint` record is
// replaced atomically (write temp file, fsync, rename). A reader
// that follows the record therefore never sees a half-written
// snapshot.
//
// Snapshots older than the newest `keep` are deleted after each
// publish so a short rollback window survives.
//
// Reference: Burn Book §5 (Records and Checkpointing)
//            Rust Book §9 (Error Handling)

use serde::{Deserialize, Serialize};
use std::{
    fs,
    io::Write,
    path::{Path, PathBuf},
};

use crate::domain::{error::TrainError, hyper_params::HyperParams, traits::SequenceClassifier};

pub const RECORD_FILE:     &str = "checkpoint";
pub const PARAMS_FILE:     &str = "hyper.params";
pub const STATE_FILE:      &str = "state.json";
pub const SNAPSHOT_PREFIX: &str = "sentiment.ckpt";

/// Contents of the `checkpoint` record file.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CheckpointRecord {
    /// Snapshot directory name used for restoration.
    pub latest: String,
    /// Every retained snapshot, oldest first; `latest` is last.
    pub all:    Vec<String>,
}

/// Scalar training state stored in every snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrainingState {
    pub global_step:   usize,
    pub learning_rate: f64,
}

pub struct CheckpointManager {
    dir:  PathBuf,
    /// Snapshots to retain; 0 keeps all of them.
    keep: usize,
}

impl CheckpointManager {
    /// Open (creating if needed) a checkpoint directory.
    pub fn new(dir: impl Into<PathBuf>, keep: usize) -> Result<Self, TrainError> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir, keep })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn snapshot_name(step: usize) -> String {
        format!("{SNAPSHOT_PREFIX}-{step}")
    }

    pub fn snapshot_path(&self, step: usize) -> PathBuf {
        self.dir.join(Self::snapshot_name(step))
    }

    /// Read the `checkpoint` record. `Ok(None)` when none has been written.
    pub fn read_record(&self) -> Result<Option<CheckpointRecord>, TrainError> {
        let path = self.dir.join(RECORD_FILE);
        if !path.exists() {
            return Ok(None);
        }
        let text = fs::read_to_string(&path).map_err(|e| TrainError::corrupt(&path, e))?;
        let record: CheckpointRecord =
            serde_json::from_str(&text).map_err(|e| TrainError::corrupt(&path, e))?;
        if record.latest.is_empty() {
            return Err(TrainError::corrupt(&path, "record names no snapshot"));
        }
        Ok(Some(record))
    }

    /// Path of the snapshot the record points at. The path may not exist.
    pub fn latest(&self) -> Result<Option<PathBuf>, TrainError> {
        Ok(self.read_record()?.map(|r| self.dir.join(r.latest)))
    }

    /// Snapshot `model` under its current global step and publish it as latest.
    pub fn save<M: SequenceClassifier>(&self, model: &M) -> Result<PathBuf, TrainError> {
        let step = model.global_step();
        let path = self.snapshot_path(step);

        // a leftover from an interrupted run at the same step
        if path.exists() {
            fs::remove_dir_all(&path)?;
        }
        fs::create_dir_all(&path)?;
        model.save(&path)?;
        self.publish(&Self::snapshot_name(step))?;

        tracing::debug!("Saved checkpoint: step {} → '{}'", step, path.display());
        Ok(path)
    }

    fn publish(&self, name: &str) -> Result<(), TrainError> {
        // a corrupt record is replaced rather than blocking new checkpoints
        let mut record = self.read_record().ok().flatten().unwrap_or_default();
        record.all.retain(|n| n != name);
        record.all.push(name.to_string());
        record.latest = name.to_string();

        let mut pruned = Vec::new();
        if self.keep > 0 && record.all.len() > self.keep {
            let excess = record.all.len() - self.keep;
            pruned = record.all.drain(..excess).collect();
        }

        let json = serde_json::to_string_pretty(&record)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        write_atomic(&self.dir.join(RECORD_FILE), json.as_bytes())?;

        for old in pruned {
            let path = self.dir.join(&old);
            match fs::remove_dir_all(&path) {
                Ok(()) => tracing::debug!("Pruned checkpoint '{}'", path.display()),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => tracing::warn!("Could not prune '{}': {}", path.display(), e),
            }
        }
        Ok(())
    }

    // ─── hyper.params ─────────────────────────────────────────────────────────

    /// Write the numeric hyperparameter artifact.
    pub fn save_hyper_params(&self, params: &HyperParams, vocab_size: usize) -> Result<PathBuf, TrainError> {
        let path = self.dir.join(PARAMS_FILE);
        let json = serde_json::to_string(&params.to_artifact(vocab_size).to_vec())
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        write_atomic(&path, json.as_bytes())?;
        tracing::debug!("Saved hyperparameters to '{}'", path.display());
        Ok(path)
    }

    /// Read the artifact back as (params, vocab_size), keeping the
    /// caller's checkpoint_dir. `Ok(None)` when it was never written.
    pub fn load_hyper_params(&self, params: &HyperParams) -> Result<Option<(HyperParams, usize)>, TrainError> {
        let path = self.dir.join(PARAMS_FILE);
        if !path.exists() {
            return Ok(None);
        }
        let text = fs::read_to_string(&path).map_err(|e| TrainError::corrupt(&path, e))?;
        let values: Vec<f64> = serde_json::from_str(&text).map_err(|e| TrainError::corrupt(&path, e))?;
        params
            .from_artifact(&values)
            .map(Some)
            .ok_or_else(|| TrainError::corrupt(&path, "values out of range or wrong field count"))
    }
}

// ─── Snapshot state file ──────────────────────────────────────────────────────

pub fn write_state(dir: &Path, state: &TrainingState) -> Result<(), TrainError> {
    let json = serde_json::to_string_pretty(state)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
    write_atomic(&dir.join(STATE_FILE), json.as_bytes())?;
    Ok(())
}

pub fn read_state(dir: &Path) -> Result<TrainingState, TrainError> {
    let path = dir.join(STATE_FILE);
    let text = fs::read_to_string(&path).map_err(|e| TrainError::corrupt(&path, e))?;
    let state: TrainingState = serde_json::from_str(&text).map_err(|e| TrainError::corrupt(&path, e))?;
    if !(state.learning_rate.is_finite() && state.learning_rate > 0.0) {
        return Err(TrainError::corrupt(&path, "learning rate must be a positive number"));
    }
    Ok(state)
}

/// Write to a sibling temp file, fsync, then rename over `path`.
fn write_atomic(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let mut tmp_name = path.file_name().unwrap_or_default().to_os_string();
    tmp_name.push(".tmp");
    let tmp = path.with_file_name(tmp_name);

    let mut f = fs::File::create(&tmp)?;
    f.write_all(bytes)?;
    f.sync_all()?;
    fs::rename(&tmp, path)
}
