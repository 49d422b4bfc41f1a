// ============================================================
// Layer 6 — Metrics Logger
// ============================================================
// Records one row per checkpoint window to a CSV file.
//
// Output file: <checkpoint_dir>/metrics.csv
//
//   global_step,learning_rate,step_time,train_loss,eval_loss,eval_accuracy
//   10,0.001000,0.041200,0.693100,0.690200,0.560000
//   20,0.001000,0.039900,0.681700,0.684400,0.600000
//
// The file is appended to across runs, so a restored run keeps
// extending the same learning curve. eval columns are empty when
// the evaluation range had no rows.
//
// Reference: Rust Book §12 (I/O and File Handling)

use serde::{Deserialize, Serialize};
use std::{
    fs::{self, OpenOptions},
    io::Write,
    path::{Path, PathBuf},
};

use crate::domain::error::TrainError;

pub const METRICS_FILE: &str = "metrics.csv";

/// Averages over one `steps_per_checkpoint` window.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WindowMetrics {
    pub global_step:   usize,
    pub learning_rate: f64,
    /// Mean wall-clock seconds per training step.
    pub step_time:     f64,
    pub train_loss:    f64,
    pub eval_loss:     Option<f64>,
    pub eval_accuracy: Option<f64>,
}

pub struct MetricsLogger {
    csv_path: PathBuf,
}

impl MetricsLogger {
    /// Writes the CSV header if the file doesn't exist yet.
    pub fn new(dir: &Path) -> Result<Self, TrainError> {
        fs::create_dir_all(dir)?;
        let csv_path = dir.join(METRICS_FILE);

        if !csv_path.exists() {
            let mut f = fs::File::create(&csv_path)?;
            writeln!(f, "global_step,learning_rate,step_time,train_loss,eval_loss,eval_accuracy")?;
            tracing::debug!("Created metrics CSV: '{}'", csv_path.display());
        }
        Ok(Self { csv_path })
    }

    pub fn log(&self, m: &WindowMetrics) -> Result<(), TrainError> {
        let mut f = OpenOptions::new().append(true).open(&self.csv_path)?;
        let opt = |v: Option<f64>| v.map(|x| format!("{x:.6}")).unwrap_or_default();

        writeln!(
            f,
            "{},{:.6},{:.6},{:.6},{},{}",
            m.global_step,
            m.learning_rate,
            m.step_time,
            m.train_loss,
            opt(m.eval_loss),
            opt(m.eval_accuracy),
        )?;
        Ok(())
    }

    pub fn csv_path(&self) -> &Path {
        &self.csv_path
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rows_are_appended_under_one_header() {
        let tmp = tempfile::tempdir().unwrap();
        let m = WindowMetrics {
            global_step:   10,
            learning_rate: 0.001,
            step_time:     0.5,
            train_loss:    0.69,
            eval_loss:     Some(0.7),
            eval_accuracy: None,
        };

        MetricsLogger::new(tmp.path()).unwrap().log(&m).unwrap();
        // reopening must not write a second header
        MetricsLogger::new(tmp.path()).unwrap().log(&WindowMetrics { global_step: 20, ..m }).unwrap();

        let text = fs::read_to_string(tmp.path().join(METRICS_FILE)).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[1], "10,0.001000,0.500000,0.690000,0.700000,");
        assert!(lines[2].starts_with("20,"));
    }
}
