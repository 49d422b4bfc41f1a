// ============================================================
// Layer 4 — Shard Loader (Dataset Assembler)
// ============================================================
// Loads every regular file in the processed-data directory as a
// numeric shard and stacks them into one Dataset.
//
// Shard format: headerless CSV, one row per example, integers
// only, every row the same width:
//
//   12,845,3,0,0,...,0,1,3
//   └── token ids ───┘ │ └ sequence length
//                     label
//
// Assembly steps:
//   1. List regular files (sorted by name, nothing filtered out)
//   2. Parse each shard, checking it is rectangular
//   3. Check every shard has the same row width
//   4. Concatenate, then shuffle the row order once
//   5. Cut the train/eval ranges (see splitter.rs)
//
// Any failure aborts the whole load with TrainError::DataLoad;
// a partially assembled dataset is never returned.
//
// Reference: csv crate documentation
//            Rust Book §9 (Error Handling)

use rand::Rng;
use std::{
    fs,
    path::{Path, PathBuf},
};

use crate::data::splitter::{split_ranges, Split, SplitPolicy};
use crate::domain::{dataset::Dataset, error::TrainError};

/// Narrowest usable row: one token, the label, the length.
pub const MIN_ROW_WIDTH: usize = 3;

pub struct ShardLoader {
    dir: PathBuf,
}

impl ShardLoader {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// All regular files in the directory, in file-name order.
    pub fn shard_paths(&self) -> Result<Vec<PathBuf>, TrainError> {
        let entries = fs::read_dir(&self.dir)
            .map_err(|e| TrainError::data_load(&self.dir, format!("cannot read directory: {e}")))?;

        let mut paths = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| TrainError::data_load(&self.dir, e.to_string()))?;
            let path  = entry.path();
            if path.is_file() {
                paths.push(path);
            }
        }
        paths.sort();
        Ok(paths)
    }

    /// Concatenate every shard in file order (no shuffling).
    pub fn load(&self) -> Result<Dataset, TrainError> {
        let paths = self.shard_paths()?;
        if paths.is_empty() {
            return Err(TrainError::data_load(&self.dir, "directory contains no shard files"));
        }

        let mut values: Vec<i64> = Vec::new();
        let mut width: Option<usize> = None;

        for path in &paths {
            let (shard, shard_width) = read_shard(path)?;
            match width {
                None => width = Some(shard_width),
                Some(w) if w != shard_width => {
                    return Err(TrainError::data_load(
                        path,
                        format!("row width {shard_width} does not match width {w} of earlier shards"),
                    ));
                }
                Some(_) => {}
            }
            tracing::debug!(
                "Loaded shard '{}' ({} rows)",
                path.display(),
                shard.len() / shard_width
            );
            values.extend(shard);
        }

        // paths is non-empty and every shard sets or matches the width
        let width = width.unwrap_or(MIN_ROW_WIDTH);
        let dataset = Dataset::new(values, width);
        tracing::info!(
            "Assembled {} rows of width {} from {} shards",
            dataset.len(),
            width,
            paths.len()
        );
        Ok(dataset)
    }

    /// Load, shuffle once, and cut the train/eval ranges.
    pub fn assemble<R: Rng + ?Sized>(
        &self,
        policy: SplitPolicy,
        rng:    &mut R,
    ) -> Result<(Dataset, Split), TrainError> {
        let mut dataset = self.load()?;
        dataset.shuffle(rng);
        let split = split_ranges(dataset.len(), policy);
        Ok((dataset, split))
    }
}

/// Parse one CSV shard into a flat row-major buffer and its width.
fn read_shard(path: &Path) -> Result<(Vec<i64>, usize), TrainError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .trim(csv::Trim::All)
        .from_path(path)
        .map_err(|e| TrainError::data_load(path, e.to_string()))?;

    let mut values = Vec::new();
    let mut width  = 0usize;

    for (line, record) in reader.records().enumerate() {
        // csv rejects rows whose length differs from the first row
        let record = record.map_err(|e| TrainError::data_load(path, e.to_string()))?;
        if line == 0 {
            width = record.len();
            if width < MIN_ROW_WIDTH {
                return Err(TrainError::data_load(
                    path,
                    format!("rows have {width} columns, need at least {MIN_ROW_WIDTH}"),
                ));
            }
        }
        for field in record.iter() {
            let v = field.parse::<i64>().map_err(|_| {
                TrainError::data_load(path, format!("row {}: '{field}' is not an integer", line + 1))
            })?;
            values.push(v);
        }
    }

    if values.is_empty() {
        return Err(TrainError::data_load(path, "shard contains no rows"));
    }
    Ok((values, width))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, SeedableRng};

    fn write(dir: &Path, name: &str, body: &str) {
        fs::write(dir.join(name), body).unwrap();
    }

    #[test]
    fn test_empty_directory_is_a_load_error() {
        let tmp = tempfile::tempdir().unwrap();
        let err = ShardLoader::new(tmp.path()).load().unwrap_err();
        assert!(matches!(err, TrainError::DataLoad { .. }));
    }

    #[test]
    fn test_missing_directory_is_a_load_error() {
        let tmp = tempfile::tempdir().unwrap();
        let err = ShardLoader::new(tmp.path().join("nope")).load().unwrap_err();
        assert!(matches!(err, TrainError::DataLoad { .. }));
    }

    #[test]
    fn test_shards_are_concatenated_in_name_order() {
        let tmp = tempfile::tempdir().unwrap();
        write(tmp.path(), "b.csv", "7,8,1,2\n");
        write(tmp.path(), "a.csv", "1,2,0,2\n3,4,1,1\n");

        let d = ShardLoader::new(tmp.path()).load().unwrap();
        assert_eq!(d.len(), 3);
        assert_eq!(d.width(), 4);
        assert_eq!(d.row(0), &[1, 2, 0, 2]);
        assert_eq!(d.row(2), &[7, 8, 1, 2]);
    }

    #[test]
    fn test_every_regular_file_counts_as_a_shard() {
        let tmp = tempfile::tempdir().unwrap();
        write(tmp.path(), "part0.npy.csv", "1,0,1\n");
        write(tmp.path(), "notes", "2,1,1\n");
        fs::create_dir(tmp.path().join("subdir")).unwrap();

        let loader = ShardLoader::new(tmp.path());
        assert_eq!(loader.shard_paths().unwrap().len(), 2);
        assert_eq!(loader.load().unwrap().len(), 2);
    }

    #[test]
    fn test_width_mismatch_between_shards() {
        let tmp = tempfile::tempdir().unwrap();
        write(tmp.path(), "a.csv", "1,2,0,2\n");
        write(tmp.path(), "b.csv", "1,0,1\n");
        let err = ShardLoader::new(tmp.path()).load().unwrap_err();
        assert!(err.to_string().contains("does not match"));
    }

    #[test]
    fn test_malformed_shards() {
        let tmp = tempfile::tempdir().unwrap();
        write(tmp.path(), "a.csv", "1,2,0,2\n1,x,0,2\n");
        assert!(ShardLoader::new(tmp.path()).load().is_err());

        let tmp = tempfile::tempdir().unwrap();
        write(tmp.path(), "a.csv", "1,2,0,2\n1,0,2\n");
        assert!(ShardLoader::new(tmp.path()).load().is_err());

        let tmp = tempfile::tempdir().unwrap();
        write(tmp.path(), "a.csv", "1,2\n");
        assert!(ShardLoader::new(tmp.path()).load().is_err());

        let tmp = tempfile::tempdir().unwrap();
        write(tmp.path(), "a.csv", "");
        assert!(ShardLoader::new(tmp.path()).load().is_err());
    }

    #[test]
    fn test_assemble_shuffles_and_splits() {
        let tmp = tempfile::tempdir().unwrap();
        let body: String = (0..100).map(|i| format!("{i},0,1\n")).collect();
        write(tmp.path(), "a.csv", &body);

        let mut rng = StdRng::seed_from_u64(3);
        let (d, split) = ShardLoader::new(tmp.path())
            .assemble(SplitPolicy::Legacy, &mut rng)
            .unwrap();

        assert_eq!(d.len(), 100);
        assert_eq!((split.train.start, split.train.end), (0, 70));
        assert_eq!((split.eval.start, split.eval.end), (71, 99));

        let mut ids: Vec<i64> = (0..d.len()).map(|i| d.row(i)[0]).collect();
        assert_ne!(ids, (0..100).collect::<Vec<i64>>());
        ids.sort();
        assert_eq!(ids, (0..100).collect::<Vec<i64>>());
    }
}
