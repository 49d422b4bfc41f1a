// ============================================================
// Layer 1 — CLI Commands and Arguments
// ============================================================
// Defines the two subcommands, `train` and `params`.
//
// Hyperparameters are not clap flags. They come from an optional
// JSON file and then from free-form trailing arguments, later
// values winning:
//
//   sentiment-trainer train --cpu --config run.json \
//       batch_size 50 learning_rate=0.01 --max_epoch 20
//
// Unknown keys are ignored and bad values keep the default with
// a warning, so a typo never aborts a long run at startup.
//
// Reference: Rust Book §12 (Building a CLI Program)

use anyhow::{Context, Result};
use clap::{Args, Subcommand};
use std::{fs, path::PathBuf};

use crate::application::train_use_case::{ComputeBackend, TrainConfig};
use crate::data::splitter::SplitPolicy;
use crate::domain::hyper_params::{overrides_from_args, overrides_from_json, HyperParams, OPTIONS};

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Train the sentiment model, resuming from the latest checkpoint if any
    Train(TrainArgs),

    /// Print the saved hyperparameters and the latest checkpoint
    Params(ParamsArgs),
}

#[derive(Args, Debug)]
#[command(after_help = options_help())]
pub struct TrainArgs {
    /// Directory holding the preprocessed CSV shards
    #[arg(long, default_value = "data/processed/")]
    pub data_dir: PathBuf,

    /// Vocabulary file: tokenizer JSON or one token per line
    #[arg(long = "vocab", default_value = "data/vocab.txt")]
    pub vocab_path: PathBuf,

    /// Vocabulary size; skips reading the vocabulary file
    #[arg(long)]
    pub vocab_size: Option<usize>,

    /// JSON object of hyperparameter overrides, applied before the trailing ones
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Seed for the shuffle and batch sampling
    #[arg(long)]
    pub seed: Option<u64>,

    /// Train/eval split: `legacy` drops the boundary and last row, `contiguous` uses every row
    #[arg(long, default_value = "legacy")]
    pub split: SplitPolicy,

    /// Snapshots to retain (0 keeps all)
    #[arg(long, default_value_t = 5)]
    pub keep_checkpoints: usize,

    /// Let a saved hyper.params replace the supplied hyperparameters on restore
    #[arg(long)]
    pub trust_saved_params: bool,

    /// Run on the CPU (NdArray) backend instead of WGPU
    #[arg(long)]
    pub cpu: bool,

    /// Hyperparameter overrides: `key value` or `key=value`
    #[arg(trailing_var_arg = true, allow_hyphen_values = true, value_name = "OVERRIDES")]
    pub overrides: Vec<String>,
}

fn options_help() -> String {
    let mut help = String::from("Hyperparameters:\n");
    let defaults = HyperParams::default();
    for o in OPTIONS {
        help.push_str(&format!(
            "  {:<22}{:<7}{} [default: {}]\n",
            o.name,
            o.kind.as_str(),
            o.help,
            defaults.value_of(o.name)
        ));
    }
    help
}

/// The boundary between Layer 1 and Layer 2: the application
/// layer never sees clap types.
impl TryFrom<TrainArgs> for TrainConfig {
    type Error = anyhow::Error;

    fn try_from(a: TrainArgs) -> Result<Self> {
        let mut pairs = Vec::new();
        if let Some(path) = &a.config {
            let text = fs::read_to_string(path)
                .with_context(|| format!("Cannot read config file '{}'", path.display()))?;
            pairs.extend(overrides_from_json(&text)?);
        }
        pairs.extend(overrides_from_args(&a.overrides));

        Ok(TrainConfig {
            data_dir:           a.data_dir,
            vocab_path:         a.vocab_path,
            vocab_size:         a.vocab_size,
            seed:               a.seed,
            split:              a.split,
            keep_checkpoints:   a.keep_checkpoints,
            trust_saved_params: a.trust_saved_params,
            backend:            if a.cpu { ComputeBackend::Cpu } else { ComputeBackend::Wgpu },
            params:             HyperParams::from_overrides(pairs),
        })
    }
}

#[derive(Args, Debug)]
pub struct ParamsArgs {
    /// Checkpoint directory written by `train`
    #[arg(long, default_value = "data/checkpoints/")]
    pub checkpoint_dir: PathBuf,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::Cli;
    use clap::Parser;

    fn train_config(argv: &[&str]) -> TrainConfig {
        let cli = Cli::try_parse_from(argv).unwrap();
        match cli.command {
            Commands::Train(args) => TrainConfig::try_from(args).unwrap(),
            other => panic!("expected train, got {other:?}"),
        }
    }

    #[test]
    fn test_defaults() {
        let cfg = train_config(&["sentiment-trainer", "train"]);
        assert_eq!(cfg.data_dir, PathBuf::from("data/processed/"));
        assert_eq!(cfg.split, SplitPolicy::Legacy);
        assert_eq!(cfg.keep_checkpoints, 5);
        assert_eq!(cfg.backend, ComputeBackend::Wgpu);
        assert_eq!(cfg.params, HyperParams::default());
    }

    #[test]
    fn test_flags_and_trailing_overrides() {
        let cfg = train_config(&[
            "sentiment-trainer", "train", "--cpu", "--seed", "3", "--split", "contiguous",
            "batch_size", "10", "hidden_size=64", "--learning_rate", "0.1",
        ]);
        assert_eq!(cfg.backend, ComputeBackend::Cpu);
        assert_eq!(cfg.seed, Some(3));
        assert_eq!(cfg.split, SplitPolicy::Contiguous);
        assert_eq!(cfg.params.batch_size, 10);
        assert_eq!(cfg.params.hidden_size, 64);
        assert_eq!(cfg.params.learning_rate, 0.1);
    }

    #[test]
    fn test_trailing_overrides_beat_config_file() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("run.json");
        fs::write(&path, r#"{"batch_size": 50, "hidden_size": 32}"#).unwrap();

        let cfg = train_config(&[
            "sentiment-trainer", "train", "--config", path.to_str().unwrap(), "batch_size", "10",
        ]);
        assert_eq!(cfg.params.batch_size, 10);
        assert_eq!(cfg.params.hidden_size, 32);
    }

    #[test]
    fn test_bad_config_file_is_an_error() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("run.json");
        fs::write(&path, "[1, 2, 3]").unwrap();

        let cli = Cli::try_parse_from(["sentiment-trainer", "train", "--config", path.to_str().unwrap()]).unwrap();
        let Commands::Train(args) = cli.command else { panic!("expected train") };
        assert!(TrainConfig::try_from(args).is_err());
    }

    #[test]
    fn test_unknown_split_is_rejected() {
        assert!(Cli::try_parse_from(["sentiment-trainer", "train", "--split", "random"]).is_err());
    }
}
