// ============================================================
// Layer 6 — Infrastructure Layer
// ============================================================
// File-backed concerns used by several other layers:
//
//   checkpoint.rs   — checkpoint directory: step-tagged snapshots,
//                     the atomically published "checkpoint" record,
//                     retention and the hyper.params artifact
//
//   vocab_store.rs  — vocabulary size from a tokenizer JSON or a
//                     plain token list
//
//   metrics.rs      — one CSV row per checkpoint window
//
// Reference: Rust Book §7 (Modules)
//            Rust Book §9 (Error Handling)

/// Checkpoint snapshots, record and hyperparameter artifact
pub mod checkpoint;

/// Vocabulary size lookup
pub mod vocab_store;

/// Training metrics CSV logger
pub mod metrics;
