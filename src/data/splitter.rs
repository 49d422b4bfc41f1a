// ============================================================
// Layer 4 — Train/Evaluation Splitter
// ============================================================
// Cuts the (already shuffled) dataset into a training range and
// an evaluation range. Nothing is copied: the ranges are index
// windows into the one Dataset.
//
// Split ratio: 70% training, the rest evaluation.
//
//   cut = floor(0.7 * N)
//
//   Legacy     train = [0, cut)   eval = [cut + 1, N - 1)
//   Contiguous train = [0, cut)   eval = [cut, N)
//
// Legacy reproduces the historical cut exactly, including the
// skipped row at the boundary and the skipped last row, so that
// existing runs resume against the same partition. Contiguous
// uses every row.
//
// Reference: Rust Book §8 (Vectors)

use std::str::FromStr;

use crate::domain::dataset::SplitRange;

/// Share of rows used for training, as a ratio of integers.
pub const TRAIN_NUMERATOR:   usize = 7;
pub const TRAIN_DENOMINATOR: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SplitPolicy {
    #[default]
    Legacy,
    Contiguous,
}

impl FromStr for SplitPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "legacy"     => Ok(Self::Legacy),
            "contiguous" => Ok(Self::Contiguous),
            other => Err(format!("unknown split policy '{other}' (expected legacy or contiguous)")),
        }
    }
}

/// The two index ranges of one dataset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Split {
    pub train: SplitRange,
    pub eval:  SplitRange,
}

impl Split {
    /// Rows belonging to neither range.
    pub fn dropped(&self, total: usize) -> usize {
        total - self.train.len() - self.eval.len()
    }
}

/// Compute the train/eval ranges for a dataset of `total` rows.
pub fn split_ranges(total: usize, policy: SplitPolicy) -> Split {
    let cut = total * TRAIN_NUMERATOR / TRAIN_DENOMINATOR;
    let train = SplitRange::new(0, cut);

    let eval = match policy {
        SplitPolicy::Legacy => {
            let end = total.saturating_sub(1);
            SplitRange::new((cut + 1).min(end), end)
        }
        SplitPolicy::Contiguous => SplitRange::new(cut, total),
    };

    tracing::debug!(
        "Dataset split ({:?}): train {}..{}, eval {}..{}",
        policy, train.start, train.end, eval.start, eval.end
    );
    Split { train, eval }
}
