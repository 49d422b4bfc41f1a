// ============================================================
// Layer 4 — Data Pipeline
// ============================================================
// From preprocessed shard files to model-ready batches:
//
//   shard files (CSV)
//       │
//       ▼
//   PrebuiltShards    → makes sure the shards are in place
//       │
//       ▼
//   ShardLoader       → reads + concatenates every shard, shuffles
//       │
//       ▼
//   split_ranges      → train / eval index ranges
//       │
//       ▼
//   SentimentBatcher  → pads/truncates sampled rows into tensors
//
// Each step is independently testable.
//
// Reference: Rust Book §13 (Iterators and Closures)

/// Reads numeric shard files into one dataset
pub mod loader;

/// Idempotent check that the processed shards exist
pub mod preprocessor;

/// Train/eval range computation
pub mod splitter;

/// Row batches and their tensor form
pub mod batcher;
