// ============================================================
// Layer 6 — Vocabulary Store
// ============================================================
// Training only needs one number from the vocabulary: how many
// token ids exist (it sizes the embedding table). The store reads
// that number from whatever vocabulary artifact the preprocessing
// step left behind:
//
//   *.json  → a HuggingFace tokenizer file, size incl. added tokens
//   other   → plain text, one token per non-empty line
//
// Or it can be pinned explicitly (--vocab-size).

use anyhow::{Context, Result};
use std::{fs, path::Path};
use tokenizers::Tokenizer;

use crate::domain::traits::Vocabulary;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VocabStore {
    size: usize,
}

impl VocabStore {
    pub fn fixed(size: usize) -> Self {
        Self { size }
    }

    pub fn load(path: &Path) -> Result<Self> {
        let size = if path.extension().and_then(|e| e.to_str()) == Some("json") {
            Tokenizer::from_file(path)
                .map_err(|e| anyhow::anyhow!("Cannot load tokenizer from '{}': {}", path.display(), e))?
                .get_vocab_size(true)
        } else {
            fs::read_to_string(path)
                .with_context(|| format!("Cannot read vocabulary '{}'", path.display()))?
                .lines()
                .filter(|l| !l.trim().is_empty())
                .count()
        };

        anyhow::ensure!(size > 0, "vocabulary '{}' is empty", path.display());
        tracing::info!("Vocabulary '{}' has {} tokens", path.display(), size);
        Ok(Self { size })
    }
}

impl Vocabulary for VocabStore {
    fn size(&self) -> usize {
        self.size
    }
}
