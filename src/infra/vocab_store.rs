// ============================================================
// Layer 6 — Vocabulary Store
// ============================================================
// Persists the vocabulary next to the model checkpoint so that
// generation uses exactly the ids the model was trained with,
// without reloading the corpus.
//
// File: <checkpoint_dir>/vocab.json
//   { "format_version": 1, "tokens": ["!", "(", ..., "zoo"] }
// Position in `tokens` is the id.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::data::vocab::Vocabulary;
use crate::domain::error::LmError;
use crate::infra::checkpoint::{read_json, CHECKPOINT_FORMAT_VERSION};

#[derive(Debug, Serialize, Deserialize)]
struct VocabFile {
    format_version: u32,
    tokens:         Vec<String>,
}

pub struct VocabStore {
    path: PathBuf,
}

impl VocabStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { path: dir.into().join("vocab.json") }
    }

    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    pub fn save(&self, vocab: &Vocabulary) -> Result<()> {
        let file = VocabFile {
            format_version: CHECKPOINT_FORMAT_VERSION,
            tokens:         vocab.tokens().to_vec(),
        };
        std::fs::write(&self.path, serde_json::to_string(&file)?)
            .with_context(|| format!("Cannot write vocabulary to '{}'", self.path.display()))?;

        tracing::info!("Vocabulary of {} tokens saved to '{}'", vocab.len(), self.path.display());
        Ok(())
    }

    pub fn load(&self) -> Result<Vocabulary, LmError> {
        let display = self.path.display().to_string();
        let file: VocabFile = read_json(&self.path)?;

        if file.format_version != CHECKPOINT_FORMAT_VERSION {
            return Err(LmError::checkpoint(
                display,
                format!("unsupported format version {}", file.format_version),
            ));
        }

        let vocab = Vocabulary::from_tokens(file.tokens)
            .ok_or_else(|| LmError::checkpoint(display.clone(), "vocabulary contains duplicate tokens"))?;
        if vocab.is_empty() {
            return Err(LmError::checkpoint(display, "vocabulary is empty"));
        }
        Ok(vocab)
    }
}
