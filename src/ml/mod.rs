// ============================================================
// Layer 5 — ML / Training Layer
// ============================================================
// Everything that touches the model and its optimisation.
// Only model.rs and trainable.rs import burn; the lifecycle,
// decay policy and loop driver work against the
// SequenceClassifier trait and are tested with a fake.
//
//   model.rs      — embedding → stacked LSTM → dropout → linear
//                   head over the last real time step
//
//   trainable.rs  — SentimentModel: network + Adam + global step
//                   + learning rate, implementing SequenceClassifier
//
//   lifecycle.rs  — create a fresh model or restore the latest
//                   checkpoint; resolve hyper.params
//
//   schedule.rs   — loss history and plateau learning-rate decay
//
//   trainer.rs    — the fixed-length training loop with its
//                   checkpoint / evaluate cadence
//
// Reference: Burn Book §3 (Building Blocks), §5 (Training)
//            Hochreiter & Schmidhuber (1997) LSTM

/// Recurrent sentiment classifier architecture
pub mod model;

/// burn-backed step contract implementation
pub mod trainable;

/// Fresh-or-restore model creation
pub mod lifecycle;

/// Plateau learning-rate decay
pub mod schedule;

/// Training loop driver
pub mod trainer;

#[cfg(test)]
pub(crate) mod testing;
