// ============================================================
// Layer 4 — Shard Preprocessor Hook
// ============================================================
// Turning raw review text into padded numeric shards happens
// outside this crate. What runs here is the idempotent hook the
// training pipeline calls before loading: it checks that the
// processed-data directory is in place and reports what it found.
//
// Running it twice, or on a directory that is already complete,
// changes nothing.

use anyhow::{Context, Result};
use std::{fs, path::PathBuf};

use crate::domain::traits::Preprocessor;

/// Shards produced ahead of time by an external preprocessing job.
pub struct PrebuiltShards {
    dir: PathBuf,
}

impl PrebuiltShards {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

impl Preprocessor for PrebuiltShards {
    fn run(&self, max_seq_length: usize) -> Result<()> {
        anyhow::ensure!(
            self.dir.is_dir(),
            "processed data directory '{}' does not exist; \
             preprocess the corpus with max_seq_length {} first",
            self.dir.display(),
            max_seq_length
        );

        let shards = fs::read_dir(&self.dir)
            .with_context(|| format!("Cannot read directory '{}'", self.dir.display()))?
            .filter_map(|e| e.ok())
            .filter(|e| e.path().is_file())
            .count();

        if shards == 0 {
            tracing::warn!("'{}' contains no shard files", self.dir.display());
        } else {
            tracing::info!("Found {} preprocessed shards in '{}'", shards, self.dir.display());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_existing_directory_is_a_no_op() {
        let tmp = tempfile::tempdir().unwrap();
        fs::write(tmp.path().join("part0"), "1,0,1\n").unwrap();
        let pre = PrebuiltShards::new(tmp.path());
        pre.run(500).unwrap();
        pre.run(500).unwrap();
        assert_eq!(fs::read_to_string(tmp.path().join("part0")).unwrap(), "1,0,1\n");
    }

    #[test]
    fn test_missing_directory_fails() {
        let tmp = tempfile::tempdir().unwrap();
        assert!(PrebuiltShards::new(tmp.path().join("processed")).run(500).is_err());
    }
}
