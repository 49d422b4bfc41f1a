// ============================================================
// Layer 5 — Trainable Sentiment Model
// ============================================================
// Bundles everything that makes up "the model" from the training
// loop's point of view:
//
//   network       — SentimentClassifier parameters
//   optim         — Adam with norm gradient clipping
//   global_step   — optimisation steps ever taken (survives restore)
//   learning_rate — current rate, lowered by decay_learning_rate()
//   rng           — batch sampling
//
// and implements the SequenceClassifier contract on top of burn.
//
// Training runs on an AutodiffBackend. Evaluation calls
// network.valid(), which returns the same weights on the inner
// backend: no autodiff graph and dropout switched off.
//
// Snapshot files (inside one checkpoint directory):
//   model.mpk      ← network record
//   optimizer.mpk  ← Adam moments, keyed by parameter id
//   state.json     ← global_step + learning_rate
//
// Full-precision records are used so that save → restore gives
// back bit-identical parameters.
//
// Reference: Burn Book §5 (Training, Records)
//            Kingma & Ba (2015) Adam

use burn::{
    grad_clipping::GradientClippingConfig,
    module::AutodiffModule,
    optim::{adaptor::OptimizerAdaptor, Adam, AdamConfig, GradientsParams, Optimizer},
    prelude::*,
    record::{FullPrecisionSettings, NamedMpkFileRecorder, Recorder},
    tensor::backend::AutodiffBackend,
};
use rand::{rngs::StdRng, SeedableRng};
use std::path::Path;

use crate::data::batcher::{RowBatch, SentimentBatcher};
use crate::domain::{
    dataset::Rows,
    error::TrainError,
    hyper_params::HyperParams,
    traits::{SequenceClassifier, StepMode, StepOutput},
};
use crate::infra::checkpoint::{read_state, write_state, TrainingState};
use crate::ml::model::{
    count_correct, SentimentClassifier, SentimentClassifierConfig, SentimentClassifierRecord,
};

type SnapshotRecorder = NamedMpkFileRecorder<FullPrecisionSettings>;

const MODEL_FILE:     &str = "model";
const OPTIMIZER_FILE: &str = "optimizer";

pub struct SentimentModel<B: AutodiffBackend> {
    network:         SentimentClassifier<B>,
    optim:           OptimizerAdaptor<Adam, SentimentClassifier<B>, B>,
    batcher:         SentimentBatcher,
    batch_size:      usize,
    global_step:     usize,
    learning_rate:   f64,
    lr_decay_factor: f64,
    rng:             StdRng,
    device:          B::Device,
}

impl<B: AutodiffBackend> SentimentModel<B> {
    /// Fresh, randomly initialised model with step 0.
    pub fn new(params: &HyperParams, vocab_size: usize, seed: u64, device: &B::Device) -> Self {
        let network = SentimentClassifierConfig::new(vocab_size, params.hidden_size, params.num_layers)
            .with_keep_prob(params.dropout)
            .init(device);
        let optim = AdamConfig::new()
            .with_grad_clipping(Some(GradientClippingConfig::Norm(params.grad_clip as f32)))
            .init();

        tracing::info!(
            "Model ready: {} LSTM layers × {} units, {} parameters",
            params.num_layers,
            params.hidden_size,
            network.num_params()
        );

        Self {
            network,
            optim,
            batcher:         SentimentBatcher::new(params.max_seq_length, vocab_size),
            batch_size:      params.batch_size,
            global_step:     0,
            learning_rate:   params.learning_rate,
            lr_decay_factor: params.lr_decay_factor,
            rng:             StdRng::seed_from_u64(seed),
            device:          device.clone(),
        }
    }

    pub fn network(&self) -> &SentimentClassifier<B> {
        &self.network
    }

    fn train_step(&mut self, batch: &RowBatch) -> Result<StepOutput, TrainError> {
        let tensors = batch.to_tensors::<B>(&self.device);
        let targets = tensors.targets.clone();
        let (loss, logits) = self.network.forward_loss(tensors);

        let loss_value: f64 = loss.clone().into_scalar().elem::<f64>();
        if !loss_value.is_finite() {
            return Err(TrainError::step(
                self.global_step + 1,
                format!("loss diverged to {loss_value}"),
            ));
        }
        let correct = count_correct(logits, targets);

        // Backward pass + Adam update
        let grads = GradientsParams::from_grads(loss.backward(), &self.network);
        self.network = self.optim.step(self.learning_rate, self.network.clone(), grads);
        self.global_step += 1;

        Ok(StepOutput { loss: loss_value, correct, total: batch.batch_size })
    }

    fn eval_step(&self, batch: &RowBatch) -> Result<StepOutput, TrainError> {
        let network = self.network.valid();
        let tensors = batch.to_tensors::<B::InnerBackend>(&self.device);
        let targets = tensors.targets.clone();
        let (loss, logits) = network.forward_loss(tensors);

        let loss_value: f64 = loss.into_scalar().elem::<f64>();
        if !loss_value.is_finite() {
            return Err(TrainError::step(
                self.global_step,
                format!("evaluation loss is {loss_value}"),
            ));
        }
        Ok(StepOutput {
            loss:    loss_value,
            correct: count_correct(logits, targets),
            total:   batch.batch_size,
        })
    }

    fn write_error(path: &Path, e: impl std::fmt::Display) -> TrainError {
        TrainError::Io(std::io::Error::other(format!("cannot write '{}': {e}", path.display())))
    }
}

/// (embedding weight, LSTM depth, output weight): what a snapshot must match.
fn architecture<B: Backend>(network: &SentimentClassifier<B>) -> ([usize; 2], usize, [usize; 2]) {
    (
        network.embedding.weight.dims(),
        network.layers.len(),
        network.output.weight.dims(),
    )
}

impl<B: AutodiffBackend> SequenceClassifier for SentimentModel<B> {
    type Batch = RowBatch;

    fn get_batch(&mut self, rows: Rows<'_>) -> Result<RowBatch, TrainError> {
        let picked = rows.sample(self.batch_size, &mut self.rng);
        self.batcher
            .batch(&picked)
            .map_err(|e| TrainError::step(self.global_step, e.to_string()))
    }

    fn step(&mut self, batch: RowBatch, mode: StepMode) -> Result<StepOutput, TrainError> {
        match mode {
            StepMode::Train => self.train_step(&batch),
            StepMode::Eval  => self.eval_step(&batch),
        }
    }

    fn global_step(&self) -> usize {
        self.global_step
    }

    fn learning_rate(&self) -> f64 {
        self.learning_rate
    }

    fn decay_learning_rate(&mut self) {
        let before = self.learning_rate;
        self.learning_rate *= self.lr_decay_factor;
        tracing::info!("Learning rate decayed {:.6} → {:.6}", before, self.learning_rate);
    }

    fn save(&self, dir: &Path) -> Result<(), TrainError> {
        let recorder = SnapshotRecorder::new();

        let model_path = dir.join(MODEL_FILE);
        <SnapshotRecorder as Recorder<B>>::record(&recorder, self.network.clone().into_record(), model_path.clone())
            .map_err(|e| Self::write_error(&model_path, e))?;

        let optim_path = dir.join(OPTIMIZER_FILE);
        <SnapshotRecorder as Recorder<B>>::record(&recorder, self.optim.to_record(), optim_path.clone())
            .map_err(|e| Self::write_error(&optim_path, e))?;

        write_state(dir, &TrainingState {
            global_step:   self.global_step,
            learning_rate: self.learning_rate,
        })
    }

    fn restore(self, dir: &Path) -> Result<Self, TrainError> {
        let state    = read_state(dir)?;
        let recorder = SnapshotRecorder::new();

        let model_path = dir.join(MODEL_FILE);
        let model_record: SentimentClassifierRecord<B> = <SnapshotRecorder as Recorder<B>>::load(&recorder, model_path.clone(), &self.device)
            .map_err(|e| TrainError::corrupt(&model_path, e))?;

        let optim_path = dir.join(OPTIMIZER_FILE);
        let optim_record = <SnapshotRecorder as Recorder<B>>::load(&recorder, optim_path.clone(), &self.device)
            .map_err(|e| TrainError::corrupt(&optim_path, e))?;

        // Loading a record into a module of another depth panics inside
        // burn, so compare the record's shapes before applying it.
        let expected = architecture(&self.network);
        let saved = (
            model_record.embedding.weight.dims(),
            model_record.layers.len(),
            model_record.output.weight.dims(),
        );
        if saved != expected {
            return Err(TrainError::corrupt(
                &model_path,
                format!(
                    "snapshot shapes {saved:?} do not match the configured model {expected:?}; \
                     supply the hyperparameters the checkpoint was trained with"
                ),
            ));
        }
        let network = self.network.load_record(model_record);

        Ok(Self {
            network,
            optim:         self.optim.load_record(optim_record),
            global_step:   state.global_step,
            learning_rate: state.learning_rate,
            ..self
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::dataset::{Dataset, SplitRange};
    use burn::backend::{Autodiff, NdArray};

    type TestBackend = Autodiff<NdArray>;

    fn params() -> HyperParams {
        HyperParams::from_overrides([
            ("hidden_size", "8"),
            ("batch_size", "4"),
            ("max_seq_length", "6"),
            ("learning_rate", "0.01"),
            ("lr_decay_factor", "0.5"),
            ("dropout", "0.9"),
        ])
    }

    fn dataset() -> Dataset {
        // 16 rows of width 8: six tokens, label, length
        let values = (0..16i64)
            .flat_map(|r| {
                let label = r % 2;
                vec![1 + r % 5, 2, 3 + label, 4, 0, 0, label, 4]
            })
            .collect();
        Dataset::new(values, 8)
    }

    fn output_weights(model: &SentimentModel<TestBackend>) -> Vec<f32> {
        model.network().output.weight.val().into_data().to_vec::<f32>().unwrap()
    }

    #[test]
    fn test_train_step_advances_global_step_only() {
        let device = Default::default();
        let data = dataset();
        let rows = data.rows(SplitRange::new(0, 16));
        let mut model = SentimentModel::<TestBackend>::new(&params(), 10, 1, &device);

        let initial = output_weights(&model);
        let batch = model.get_batch(rows).unwrap();
        assert_eq!(batch.batch_size, 4);
        let out = model.step(batch, StepMode::Train).unwrap();
        assert!(out.loss.is_finite());
        assert_eq!(model.global_step(), 1);
        let trained = output_weights(&model);
        assert_ne!(trained, initial);

        let batch = model.get_batch(rows).unwrap();
        model.step(batch, StepMode::Eval).unwrap();
        assert_eq!(model.global_step(), 1);
        assert_eq!(output_weights(&model), trained);
    }

    #[test]
    fn test_decay_multiplies_by_factor() {
        let device = Default::default();
        let mut model = SentimentModel::<TestBackend>::new(&params(), 10, 1, &device);
        model.decay_learning_rate();
        assert!((model.learning_rate() - 0.005).abs() < 1e-12);
    }

    #[test]
    fn test_bad_token_is_a_step_error() {
        let device = Default::default();
        let data = Dataset::new(vec![42, 0, 1, 42, 1, 1, 42, 0, 1, 42, 1, 1], 3);
        let mut model = SentimentModel::<TestBackend>::new(&params(), 10, 1, &device);
        let err = model.get_batch(data.rows(SplitRange::new(0, 4))).unwrap_err();
        assert!(matches!(err, TrainError::StepExecution { .. }));
    }

    #[test]
    fn test_save_then_restore_round_trips() {
        let tmp = tempfile::tempdir().unwrap();
        let device = Default::default();
        let data = dataset();
        let rows = data.rows(SplitRange::new(0, 16));

        let mut model = SentimentModel::<TestBackend>::new(&params(), 10, 1, &device);
        for _ in 0..3 {
            let batch = model.get_batch(rows).unwrap();
            model.step(batch, StepMode::Train).unwrap();
        }
        model.decay_learning_rate();
        model.save(tmp.path()).unwrap();

        let restored = SentimentModel::<TestBackend>::new(&params(), 10, 2, &device)
            .restore(tmp.path())
            .unwrap();

        assert_eq!(restored.global_step(), 3);
        assert_eq!(restored.learning_rate(), model.learning_rate());
        assert_eq!(output_weights(&restored), output_weights(&model));
    }

    fn restore_with(saved: &HyperParams, configured: &HyperParams) -> Result<SentimentModel<TestBackend>, TrainError> {
        let tmp = tempfile::tempdir().unwrap();
        let device = Default::default();
        SentimentModel::<TestBackend>::new(saved, 10, 1, &device).save(tmp.path()).unwrap();
        SentimentModel::<TestBackend>::new(configured, 10, 1, &device).restore(tmp.path())
    }

    #[test]
    fn test_restore_with_other_layer_count_is_corrupt() {
        let one = HyperParams { num_layers: 1, ..params() };
        let two = HyperParams { num_layers: 2, ..params() };
        let err = restore_with(&one, &two).err().unwrap();
        assert!(matches!(err, TrainError::CheckpointCorrupt { .. }));
    }

    #[test]
    fn test_restore_with_other_hidden_size_is_corrupt() {
        let narrow = params();
        let wide = HyperParams { hidden_size: 16, ..params() };
        let err = restore_with(&narrow, &wide).err().unwrap();
        assert!(matches!(err, TrainError::CheckpointCorrupt { .. }));
    }

    #[test]
    fn test_restore_from_empty_directory_is_corrupt() {
        let tmp = tempfile::tempdir().unwrap();
        let device = Default::default();
        let err = SentimentModel::<TestBackend>::new(&params(), 10, 1, &device)
            .restore(tmp.path())
            .err()
            .unwrap();
        assert!(matches!(err, TrainError::CheckpointCorrupt { .. }));
    }
}
