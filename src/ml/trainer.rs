// ============================================================
// Layer 5 — Training Loop Driver
// ============================================================
// Fixed-length loop over `num_batches * max_epoch` steps:
//
//   for each step:
//     batch  = model.get_batch(train rows)
//     output = model.step(batch, Train)
//     step_time += elapsed / steps_per_checkpoint
//     loss      += output.loss / steps_per_checkpoint
//
//     if model.global_step() % steps_per_checkpoint == 0:
//       report  step, rate, step_time, loss
//       decay   PlateauDecay::observe(loss)
//       save    CheckpointManager::save
//       reset   accumulators
//       eval    one batch from the eval rows, Eval mode
//
// Cadence follows the model's own global step, so a restored run
// checkpoints on the same boundaries as the run it continues.
// There is no early stopping; any step error ends the run.
//
// Reference: Burn Book §5 (Custom Training Loop)

use std::{path::PathBuf, time::Instant};

use crate::data::splitter::Split;
use crate::domain::{
    dataset::{Dataset, Rows},
    error::TrainError,
    hyper_params::HyperParams,
    traits::{SequenceClassifier, StepMode, StepOutput},
};
use crate::infra::{
    checkpoint::CheckpointManager,
    metrics::{MetricsLogger, WindowMetrics},
};
use crate::ml::schedule::{LossHistory, PlateauDecay};

/// What a finished run did.
#[derive(Debug, Clone)]
pub struct RunSummary {
    /// Training steps executed by this run.
    pub steps:         usize,
    pub start_step:    usize,
    pub final_step:    usize,
    pub learning_rate: f64,
    /// Snapshot directories written, in order.
    pub checkpoints:   Vec<PathBuf>,
    pub decays:        usize,
    pub loss_history:  LossHistory,
    pub last_eval:     Option<StepOutput>,
    /// Snapshot the model was restored from; `None` for a fresh model.
    pub resumed_from:  Option<PathBuf>,
}

/// Full batches per epoch. Zero is an error, not an empty run.
pub fn num_batches(train_rows: usize, batch_size: usize) -> Result<usize, TrainError> {
    match train_rows / batch_size.max(1) {
        0 => Err(TrainError::InsufficientData { batch_size, train_rows }),
        n => Ok(n),
    }
}

pub struct Trainer<'a> {
    params:      &'a HyperParams,
    checkpoints: &'a CheckpointManager,
    metrics:     Option<&'a MetricsLogger>,
}

impl<'a> Trainer<'a> {
    pub fn new(params: &'a HyperParams, checkpoints: &'a CheckpointManager) -> Self {
        Self { params, checkpoints, metrics: None }
    }

    pub fn with_metrics(mut self, metrics: &'a MetricsLogger) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn run<M: SequenceClassifier>(
        &self,
        model:   &mut M,
        dataset: &Dataset,
        split:   &Split,
    ) -> Result<RunSummary, TrainError> {
        let train = dataset.rows(split.train);
        let eval  = dataset.rows(split.eval);

        let batches = num_batches(train.len(), self.params.batch_size)?;
        let total   = batches * self.params.max_epoch;
        let every   = self.params.steps_per_checkpoint;
        let scale   = 1.0 / every as f64;

        let start_step = model.global_step();
        tracing::info!(
            "Training {} steps ({} batches × {} epochs) from global step {}",
            total, batches, self.params.max_epoch, start_step
        );
        if eval.is_empty() {
            tracing::warn!("Evaluation range is empty; checkpoints will not be evaluated");
        }

        let mut decay       = PlateauDecay::new();
        let mut checkpoints = Vec::new();
        let mut last_eval   = None;
        let mut step_time   = 0.0f64;
        let mut loss        = 0.0f64;

        for _ in 0..total {
            let started = Instant::now();
            let batch   = model.get_batch(train)?;
            let output  = model.step(batch, StepMode::Train)?;
            step_time += started.elapsed().as_secs_f64() * scale;
            loss      += output.loss * scale;

            let global_step = model.global_step();
            if global_step % every != 0 {
                continue;
            }

            let learning_rate = model.learning_rate();
            println!(
                "global step {} learning rate {:.4} step-time {:.2} loss {:.4}",
                global_step, learning_rate, step_time, loss
            );

            decay.observe(model, loss);
            checkpoints.push(self.checkpoints.save(&*model)?);

            let window = WindowMetrics {
                global_step,
                learning_rate,
                step_time,
                train_loss:    loss,
                eval_loss:     None,
                eval_accuracy: None,
            };
            step_time = 0.0;
            loss      = 0.0;

            let evaluated = self.evaluate(model, eval)?;
            if let Some(out) = evaluated {
                println!("  eval: loss {:.4} accuracy {:.1}%", out.loss, out.accuracy() * 100.0);
                last_eval = Some(out);
            }

            if let Some(metrics) = self.metrics {
                metrics.log(&WindowMetrics {
                    eval_loss:     evaluated.map(|o| o.loss),
                    eval_accuracy: evaluated.map(|o| o.accuracy()),
                    ..window
                })?;
            }
        }

        let summary = RunSummary {
            steps:         model.global_step() - start_step,
            start_step,
            final_step:    model.global_step(),
            learning_rate: model.learning_rate(),
            checkpoints,
            decays:        decay.decays(),
            loss_history:  decay.into_history(),
            last_eval,
            resumed_from:  None,
        };
        tracing::info!(
            "Training complete: global step {}, {} checkpoints, {} learning-rate decays",
            summary.final_step,
            summary.checkpoints.len(),
            summary.decays
        );
        Ok(summary)
    }

    fn evaluate<M: SequenceClassifier>(
        &self,
        model: &mut M,
        eval:  Rows<'_>,
    ) -> Result<Option<StepOutput>, TrainError> {
        if eval.is_empty() {
            return Ok(None);
        }
        let batch = model.get_batch(eval)?;
        model.step(batch, StepMode::Eval).map(Some)
    }
}
