// ============================================================
// Layer 2 — TrainUseCase
// ============================================================
// Orchestrates one training run in order:
//
//   Step 1: Make sure the shards exist    (Layer 4 - data)
//   Step 2: Read the vocabulary size      (Layer 6 - infra)
//   Step 3: Load, shuffle, split shards   (Layer 4 - data)
//   Step 4: Resolve hyperparameters       (Layer 5 - ml)
//   Step 5: Create or restore the model   (Layer 5 - ml)
//   Step 6: Run the training loop         (Layer 5 - ml)
//
// The burn backend is picked here and nowhere else: the whole
// pipeline below is generic over AutodiffBackend.
//
// Reference: Burn Book §2 (Backends)

use anyhow::{Context, Result};
use burn::{
    backend::{ndarray::NdArrayDevice, wgpu::WgpuDevice, Autodiff, NdArray, Wgpu},
    tensor::backend::AutodiffBackend,
};
use rand::{rngs::StdRng, Rng, SeedableRng};
use std::path::PathBuf;

use crate::data::{
    loader::ShardLoader,
    preprocessor::PrebuiltShards,
    splitter::SplitPolicy,
};
use crate::domain::{
    hyper_params::HyperParams,
    traits::{Preprocessor, Vocabulary},
};
use crate::infra::{checkpoint::CheckpointManager, metrics::MetricsLogger, vocab_store::VocabStore};
use crate::ml::{
    lifecycle::{create_or_restore, resolve_params},
    trainable::SentimentModel,
    trainer::{RunSummary, Trainer},
};

/// Device family the model runs on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ComputeBackend {
    #[default]
    Wgpu,
    Cpu,
}

// ─── Training Configuration ──────────────────────────────────────────────────
// Everything a run needs besides the hyperparameters themselves:
// where the inputs live and how the run is set up.
#[derive(Debug, Clone)]
pub struct TrainConfig {
    pub data_dir:           PathBuf,
    pub vocab_path:         PathBuf,
    /// Takes precedence over `vocab_path` when set.
    pub vocab_size:         Option<usize>,
    pub seed:               Option<u64>,
    pub split:              SplitPolicy,
    pub keep_checkpoints:   usize,
    pub trust_saved_params: bool,
    pub backend:            ComputeBackend,
    pub params:             HyperParams,
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self {
            data_dir:           PathBuf::from("data/processed/"),
            vocab_path:         PathBuf::from("data/vocab.txt"),
            vocab_size:         None,
            seed:               None,
            split:              SplitPolicy::Legacy,
            keep_checkpoints:   5,
            trust_saved_params: false,
            backend:            ComputeBackend::Wgpu,
            params:             HyperParams::default(),
        }
    }
}

// ─── TrainUseCase ─────────────────────────────────────────────────────────────
pub struct TrainUseCase {
    config: TrainConfig,
}

impl TrainUseCase {
    pub fn new(config: TrainConfig) -> Self {
        Self { config }
    }

    /// Run training on the configured backend.
    pub fn execute(&self) -> Result<RunSummary> {
        match self.config.backend {
            ComputeBackend::Wgpu => {
                let device = WgpuDevice::default();
                tracing::info!("Using WGPU device: {:?}", device);
                self.execute_on::<Autodiff<Wgpu>>(device)
            }
            ComputeBackend::Cpu => {
                tracing::info!("Using NdArray CPU backend");
                self.execute_on::<Autodiff<NdArray>>(NdArrayDevice::Cpu)
            }
        }
    }

    fn execute_on<B: AutodiffBackend>(&self, device: B::Device) -> Result<RunSummary> {
        let cfg = &self.config;

        // ── Step 1: Shards ────────────────────────────────────────────────────
        PrebuiltShards::new(&cfg.data_dir).run(cfg.params.max_seq_length)?;

        // ── Step 2: Vocabulary ────────────────────────────────────────────────
        let vocab = match cfg.vocab_size {
            Some(n) => VocabStore::fixed(n),
            None    => VocabStore::load(&cfg.vocab_path)?,
        };

        // ── Step 3: Dataset ───────────────────────────────────────────────────
        // One generator drives the shuffle and, through the model seed,
        // batch sampling: the same --seed reproduces the same run.
        let mut rng = match cfg.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None       => StdRng::from_entropy(),
        };
        let (dataset, split) = ShardLoader::new(&cfg.data_dir).assemble(cfg.split, &mut rng)?;
        tracing::info!(
            "Split: {} train, {} eval, {} unused",
            split.train.len(),
            split.eval.len(),
            split.dropped(dataset.len())
        );

        // ── Step 4: Hyperparameters ───────────────────────────────────────────
        let checkpoints = CheckpointManager::new(&cfg.params.checkpoint_dir, cfg.keep_checkpoints)
            .with_context(|| format!("Cannot open '{}'", cfg.params.checkpoint_dir.display()))?;
        let (params, vocab_size) =
            resolve_params(&checkpoints, &cfg.params, vocab.size(), cfg.trust_saved_params)?;

        tracing::info!("Creating {} layers of {} units.", params.num_layers, params.hidden_size);
        tracing::info!(
            "max_epoch {} batch_size {} learning_rate {} lr_decay_factor {} vocab_size {}",
            params.max_epoch,
            params.batch_size,
            params.learning_rate,
            params.lr_decay_factor,
            vocab_size
        );

        // ── Step 5: Model ─────────────────────────────────────────────────────
        let model_seed: u64 = rng.gen();
        let lifecycle = create_or_restore(&checkpoints, &params, vocab_size, |p| {
            SentimentModel::<B>::new(p, vocab_size, model_seed, &device)
        })?;
        let resumed_from = lifecycle.snapshot().map(|p| p.to_path_buf());
        let mut model = lifecycle.into_model();

        // ── Step 6: Training loop ─────────────────────────────────────────────
        let metrics = MetricsLogger::new(checkpoints.dir())?;
        let summary = Trainer::new(&params, &checkpoints)
            .with_metrics(&metrics)
            .run(&mut model, &dataset, &split)?;
        let summary = RunSummary { resumed_from, ..summary };

        tracing::info!("Metrics written to '{}'", metrics.csv_path().display());
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::checkpoint::PARAMS_FILE;
    use std::fs;

    fn write_shards(dir: &std::path::Path, rows: usize) {
        fs::create_dir_all(dir).unwrap();
        let mut text = String::new();
        for r in 0..rows {
            let label = r % 2;
            text.push_str(&format!("{},{},{},0,{},3\n", 1 + r % 7, 2 + label, 3, label));
        }
        fs::write(dir.join("part0.csv"), text).unwrap();
    }

    fn config(root: &std::path::Path) -> TrainConfig {
        let ckpt = root.join("ckpt");
        TrainConfig {
            data_dir:   root.join("processed"),
            vocab_size: Some(10),
            seed:       Some(7),
            backend:    ComputeBackend::Cpu,
            params:     HyperParams::from_overrides([
                ("hidden_size", "4"),
                ("batch_size", "4"),
                ("max_epoch", "2"),
                ("steps_per_checkpoint", "3"),
                ("max_seq_length", "4"),
                ("checkpoint_dir", ckpt.to_str().unwrap()),
            ]),
            ..TrainConfig::default()
        }
    }

    #[test]
    fn test_end_to_end_on_cpu_then_resume() {
        let tmp = tempfile::tempdir().unwrap();
        write_shards(&tmp.path().join("processed"), 20);

        // 20 rows → 14 train → 3 batches × 2 epochs
        let first = TrainUseCase::new(config(tmp.path())).execute().unwrap();
        assert_eq!(first.start_step, 0);
        assert_eq!(first.resumed_from, None);
        assert_eq!(first.final_step, 6);
        assert_eq!(first.checkpoints.len(), 2);
        assert!(tmp.path().join("ckpt").join(PARAMS_FILE).exists());

        let second = TrainUseCase::new(config(tmp.path())).execute().unwrap();
        assert_eq!(second.start_step, 6);
        assert_eq!(second.resumed_from.as_deref(), first.checkpoints.last().map(|p| p.as_path()));
        assert_eq!(second.final_step, 12);
        assert!(second.learning_rate <= first.learning_rate);
    }

    #[test]
    fn test_missing_data_directory_fails() {
        let tmp = tempfile::tempdir().unwrap();
        assert!(TrainUseCase::new(config(tmp.path())).execute().is_err());
    }
}
