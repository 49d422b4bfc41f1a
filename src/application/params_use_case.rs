// ============================================================
// Layer 2 — ParamsUseCase
// ============================================================
// Reads back what a checkpoint directory says about its run:
// the hyper.params artifact and the state of the latest snapshot.
// Used by external tooling that rebuilds a model for serving.

use anyhow::{Context, Result};
use std::path::PathBuf;

use crate::domain::hyper_params::{HyperParams, ARTIFACT_FIELDS};
use crate::infra::checkpoint::{read_state, CheckpointManager, TrainingState};

/// Everything known about a checkpoint directory.
#[derive(Debug, Clone, PartialEq)]
pub struct CheckpointReport {
    pub params:     Option<(HyperParams, usize)>,
    pub latest:     Option<PathBuf>,
    pub state:      Option<TrainingState>,
}

impl CheckpointReport {
    /// `name value` lines in artifact order, then the latest snapshot.
    pub fn render(&self) -> String {
        let mut out = String::new();
        match &self.params {
            Some((params, vocab_size)) => {
                for (name, value) in ARTIFACT_FIELDS.iter().zip(params.to_artifact(*vocab_size)) {
                    out.push_str(&format!("{name:<22}{value}\n"));
                }
            }
            None => out.push_str("no hyper.params saved\n"),
        }
        match (&self.latest, &self.state) {
            (Some(path), Some(state)) => out.push_str(&format!(
                "latest checkpoint     {} (global step {}, learning rate {})\n",
                path.display(),
                state.global_step,
                state.learning_rate
            )),
            (Some(path), None) => {
                out.push_str(&format!("latest checkpoint     {} (missing)\n", path.display()))
            }
            (None, _) => out.push_str("no checkpoint saved\n"),
        }
        out
    }
}

pub struct ParamsUseCase {
    checkpoint_dir: PathBuf,
}

impl ParamsUseCase {
    pub fn new(checkpoint_dir: impl Into<PathBuf>) -> Self {
        Self { checkpoint_dir: checkpoint_dir.into() }
    }

    pub fn execute(&self) -> Result<CheckpointReport> {
        anyhow::ensure!(
            self.checkpoint_dir.is_dir(),
            "checkpoint directory '{}' does not exist",
            self.checkpoint_dir.display()
        );
        let ckpt = CheckpointManager::new(&self.checkpoint_dir, 0)?;

        let params = ckpt
            .load_hyper_params(&HyperParams::default())
            .context("Cannot read hyper.params")?;
        let latest = ckpt.latest()?;
        let state = match &latest {
            Some(path) if path.is_dir() => Some(read_state(path)?),
            _ => None,
        };

        Ok(CheckpointReport { params, latest, state })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::checkpoint::write_state;
    use std::fs;

    #[test]
    fn test_reports_params_and_latest_state() {
        let tmp = tempfile::tempdir().unwrap();
        let ckpt = CheckpointManager::new(tmp.path(), 5).unwrap();
        ckpt.save_hyper_params(&HyperParams::default(), 321).unwrap();

        let snapshot = ckpt.snapshot_path(30);
        fs::create_dir_all(&snapshot).unwrap();
        write_state(&snapshot, &TrainingState { global_step: 30, learning_rate: 0.001 }).unwrap();
        fs::write(
            tmp.path().join("checkpoint"),
            r#"{"latest": "sentiment.ckpt-30", "all": ["sentiment.ckpt-30"]}"#,
        )
        .unwrap();

        let report = ParamsUseCase::new(tmp.path()).execute().unwrap();
        assert_eq!(report.params.as_ref().map(|(_, v)| *v), Some(321));
        assert_eq!(report.state.map(|s| s.global_step), Some(30));

        let text = report.render();
        assert!(text.starts_with("vocab_size            321\n"));
        assert!(text.contains("global step 30"));
    }

    #[test]
    fn test_empty_directory_reports_nothing() {
        let tmp = tempfile::tempdir().unwrap();
        let report = ParamsUseCase::new(tmp.path()).execute().unwrap();
        assert_eq!(report.params, None);
        assert_eq!(report.latest, None);
        assert!(report.render().contains("no checkpoint saved"));
    }

    #[test]
    fn test_missing_directory_fails() {
        let tmp = tempfile::tempdir().unwrap();
        assert!(ParamsUseCase::new(tmp.path().join("nope")).execute().is_err());
    }
}
