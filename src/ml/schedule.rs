// ============================================================
// Layer 5 — Learning-Rate Plateau Decay
// ============================================================
// Reacts to the mean training loss of each checkpoint window:
//
//   history = [.., a, b, c]     current = x
//   x > max(a, b, c)  →  model.decay_learning_rate()
//
// Only the last PLATEAU_WINDOW entries are consulted, and at
// least that many must exist, so the first windows of a run
// never decay. One bad window is enough to trigger a decay even
// when the longer trend still improves.

use crate::domain::traits::SequenceClassifier;

/// Number of recent windows the decay decision looks at.
pub const PLATEAU_WINDOW: usize = 3;

/// Append-only record of window losses.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LossHistory {
    losses: Vec<f64>,
}

impl LossHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, loss: f64) {
        self.losses.push(loss);
    }

    pub fn len(&self) -> usize {
        self.losses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.losses.is_empty()
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.losses
    }

    /// True when `current` is worse than every one of the last
    /// `PLATEAU_WINDOW` losses.
    pub fn should_decay(&self, current: f64) -> bool {
        if self.losses.len() < PLATEAU_WINDOW {
            return false;
        }
        let recent = &self.losses[self.losses.len() - PLATEAU_WINDOW..];
        let worst = recent.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        current > worst
    }
}

/// Decay policy plus the history it owns.
#[derive(Debug, Clone, Default)]
pub struct PlateauDecay {
    history: LossHistory,
    decays:  usize,
}

impl PlateauDecay {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decide on `current`, decaying `model` if needed, then record it.
    /// Returns whether a decay happened.
    pub fn observe<M: SequenceClassifier>(&mut self, model: &mut M, current: f64) -> bool {
        let decayed = self.history.should_decay(current);
        if decayed {
            model.decay_learning_rate();
            self.decays += 1;
        }
        self.history.push(current);
        decayed
    }

    pub fn history(&self) -> &LossHistory {
        &self.history
    }

    /// Decays triggered so far.
    pub fn decays(&self) -> usize {
        self.decays
    }

    pub fn into_history(self) -> LossHistory {
        self.history
    }
}
