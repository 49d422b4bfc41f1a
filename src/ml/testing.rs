// Deterministic in-memory classifier for exercising the loop
// driver, lifecycle and decay policy without burn.

use std::path::Path;

use crate::domain::{
    dataset::Rows,
    error::TrainError,
    traits::{SequenceClassifier, StepMode, StepOutput},
};
use crate::infra::checkpoint::{read_state, write_state, TrainingState};

#[derive(Debug, Clone)]
pub struct FakeModel {
    pub global_step:   usize,
    pub learning_rate: f64,
    pub decay_factor:  f64,
    pub batch_size:    usize,
    /// Training losses, indexed by global step (cycled).
    pub losses:        Vec<f64>,
    pub eval_loss:     f64,
    /// Global step whose training step fails.
    pub fail_at:       Option<usize>,
    pub train_calls:   usize,
    pub eval_calls:    usize,
    /// Rate seen at every decay, in order.
    pub lr_trace:      Vec<f64>,
}

impl FakeModel {
    pub fn new(learning_rate: f64, decay_factor: f64) -> Self {
        Self {
            global_step: 0,
            learning_rate,
            decay_factor,
            batch_size: 2,
            losses: vec![1.0],
            eval_loss: 0.5,
            fail_at: None,
            train_calls: 0,
            eval_calls: 0,
            lr_trace: Vec::new(),
        }
    }

    pub fn with_losses(mut self, losses: Vec<f64>) -> Self {
        self.losses = losses;
        self
    }

    pub fn failing_at(mut self, step: usize) -> Self {
        self.fail_at = Some(step);
        self
    }
}

impl SequenceClassifier for FakeModel {
    /// Number of rows drawn.
    type Batch = usize;

    fn get_batch(&mut self, rows: Rows<'_>) -> Result<usize, TrainError> {
        Ok(rows.len().min(self.batch_size))
    }

    fn step(&mut self, batch: usize, mode: StepMode) -> Result<StepOutput, TrainError> {
        match mode {
            StepMode::Train => {
                let next = self.global_step + 1;
                if self.fail_at == Some(next) {
                    return Err(TrainError::step(next, "scripted failure"));
                }
                let loss = self.losses[self.global_step % self.losses.len()];
                self.global_step = next;
                self.train_calls += 1;
                Ok(StepOutput { loss, correct: batch, total: batch })
            }
            StepMode::Eval => {
                self.eval_calls += 1;
                Ok(StepOutput { loss: self.eval_loss, correct: batch / 2, total: batch })
            }
        }
    }

    fn global_step(&self) -> usize {
        self.global_step
    }

    fn learning_rate(&self) -> f64 {
        self.learning_rate
    }

    fn decay_learning_rate(&mut self) {
        self.learning_rate *= self.decay_factor;
        self.lr_trace.push(self.learning_rate);
    }

    fn save(&self, dir: &Path) -> Result<(), TrainError> {
        write_state(dir, &TrainingState {
            global_step:   self.global_step,
            learning_rate: self.learning_rate,
        })
    }

    fn restore(self, dir: &Path) -> Result<Self, TrainError> {
        let state = read_state(dir)?;
        Ok(Self {
            global_step:   state.global_step,
            learning_rate: state.learning_rate,
            ..self
        })
    }
}
