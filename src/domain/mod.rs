// ============================================================
// Layer 3 — Domain Layer
// ============================================================
// Pure Rust types and traits shared by every other layer.
//
// Rules for this layer:
//   - NO burn framework types
//   - NO file I/O
//   - Only plain structs, enums, and traits
//
// Reference: Rust Book §5 (Structs), §10 (Traits)

// Error taxonomy of a training run
pub mod error;

// Immutable training configuration and its override table
pub mod hyper_params;

// The assembled dataset, its row views and split ranges
pub mod dataset;

// Collaborator contracts (vocabulary, preprocessor, model)
pub mod traits;
