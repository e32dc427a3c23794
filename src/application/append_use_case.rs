// ============================================================
// Layer 2 — Append Use Case
// ============================================================
// Adds scraped posts to the corpus file, or replaces its contents
// when asked to overwrite. The scraper itself is outside this
// program; it hands over a JSON array of
// { "title": ..., "body": ... } objects.

use anyhow::{Context, Result};
use std::fs;

use crate::domain::post::RawPost;
use crate::infra::corpus_store::CorpusStore;

pub struct AppendUseCase {
    input:     String,
    corpus:    String,
    overwrite: bool,
}

impl AppendUseCase {
    pub fn new(input: impl Into<String>, corpus: impl Into<String>) -> Self {
        Self { input: input.into(), corpus: corpus.into(), overwrite: false }
    }

    /// Start the corpus over instead of extending it.
    pub fn with_overwrite(mut self, overwrite: bool) -> Self {
        self.overwrite = overwrite;
        self
    }

    /// Returns (posts appended, posts now in the corpus).
    pub fn execute(&self) -> Result<(usize, usize)> {
        let json = fs::read_to_string(&self.input)
            .with_context(|| format!("Cannot read scraped posts from '{}'", self.input))?;
        let raw: Vec<RawPost> = serde_json::from_str(&json)
            .with_context(|| format!("'{}' is not a JSON array of posts", self.input))?;

        let store = CorpusStore::new(&self.corpus);
        let total = if self.overwrite { store.overwrite(&raw)? } else { store.append(&raw)? };
        Ok((raw.len(), total))
    }
}
