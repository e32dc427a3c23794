// ============================================================
// Layer 6 — Corpus Store
// ============================================================
// The corpus lives in one bincode file holding every Post record
// as (id, title_tokens, body_tokens).
//
// The file is not a streaming format. Appending means reading the
// existing records, extending the list and rewriting the whole
// file. New posts get ids that continue from the current record
// count.

use anyhow::{Context, Result};
use std::{fs, path::PathBuf};

use crate::domain::error::LmError;
use crate::domain::post::{Corpus, Post, RawPost};
use crate::domain::traits::CorpusSource;

pub struct CorpusStore {
    path: PathBuf,
}

impl CorpusStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn display(&self) -> String {
        self.path.display().to_string()
    }

    /// Append scraped posts and rewrite the file.
    /// Returns the number of records stored afterwards.
    pub fn append(&self, raw_posts: &[RawPost]) -> Result<usize> {
        let has_contents = fs::metadata(&self.path).map(|m| m.len() > 0).unwrap_or(false);

        let existing = if has_contents {
            self.read_records()?
        } else {
            tracing::debug!("No existing corpus at '{}', starting a new one", self.display());
            Vec::new()
        };
        self.write_with(existing, raw_posts)
    }

    /// Replace the whole corpus with `raw_posts`, ids starting at 0.
    pub fn overwrite(&self, raw_posts: &[RawPost]) -> Result<usize> {
        tracing::debug!("Overwriting corpus at '{}'", self.display());
        self.write_with(Vec::new(), raw_posts)
    }

    fn write_with(&self, mut contents: Corpus, raw_posts: &[RawPost]) -> Result<usize> {
        let offset = contents.len() as u64;
        contents.extend(
            raw_posts
                .iter()
                .enumerate()
                .map(|(i, raw)| Post::from_raw(offset + i as u64, raw)),
        );

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .with_context(|| format!("Cannot create directory '{}'", parent.display()))?;
        }

        let bytes = bincode::serialize(&contents).context("Cannot encode corpus")?;
        fs::write(&self.path, bytes)
            .with_context(|| format!("Cannot write corpus to '{}'", self.display()))?;

        tracing::info!(
            "Saved {} new posts to '{}' ({} total)",
            raw_posts.len(),
            self.display(),
            contents.len()
        );
        Ok(contents.len())
    }

    fn read_records(&self) -> Result<Corpus, LmError> {
        let bytes = fs::read(&self.path).map_err(|e| LmError::corpus(self.display(), e))?;
        if bytes.is_empty() {
            return Err(LmError::corpus(self.display(), "file is empty"));
        }
        bincode::deserialize(&bytes).map_err(|e| LmError::corpus(self.display(), e))
    }
}

impl CorpusSource for CorpusStore {
    fn load_all(&self) -> Result<Corpus, LmError> {
        let posts = self.read_records()?;
        if posts.is_empty() {
            return Err(LmError::corpus(self.display(), "file contains no posts"));
        }
        tracing::info!("Loaded {} posts from '{}'", posts.len(), self.display());
        Ok(posts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn raw(title: &str, body: &str) -> RawPost {
        RawPost { title: title.to_string(), body: body.to_string() }
    }

    #[test]
    fn test_append_then_load() {
        let dir   = TempDir::new().unwrap();
        let store = CorpusStore::new(dir.path().join("posts.bin"));

        assert_eq!(store.append(&[raw("First post", "hello there")]).unwrap(), 1);
        let posts = store.load_all().unwrap();

        assert_eq!(posts.len(), 1);
        assert_eq!(posts[0].id, 0);
        assert_eq!(posts[0].title, vec!["First", "post"]);
        assert_eq!(posts[0].body, vec!["hello", "there"]);
    }

    #[test]
    fn test_append_continues_ids() {
        let dir   = TempDir::new().unwrap();
        let store = CorpusStore::new(dir.path().join("posts.bin"));

        store.append(&[raw("a", "b"), raw("c", "d")]).unwrap();
        assert_eq!(store.append(&[raw("e", "f")]).unwrap(), 3);

        let ids: Vec<u64> = store.load_all().unwrap().iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![0, 1, 2]);
    }

    #[test]
    fn test_overwrite_discards_existing_posts() {
        let dir   = TempDir::new().unwrap();
        let store = CorpusStore::new(dir.path().join("posts.bin"));

        store.append(&[raw("a", "b"), raw("c", "d")]).unwrap();
        assert_eq!(store.overwrite(&[raw("new", "post here")]).unwrap(), 1);

        let posts = store.load_all().unwrap();
        assert_eq!(posts.len(), 1);
        assert_eq!(posts[0].id, 0);
        assert_eq!(posts[0].body, vec!["post", "here"]);
    }

    #[test]
    fn test_overwrite_ignores_corrupt_file() {
        let dir  = TempDir::new().unwrap();
        let path = dir.path().join("junk.bin");
        fs::write(&path, [0xffu8; 3]).unwrap();

        let store = CorpusStore::new(path);
        assert_eq!(store.overwrite(&[raw("a", "b")]).unwrap(), 1);
        assert_eq!(store.load_all().unwrap().len(), 1);
    }

    #[test]
    fn test_append_creates_parent_directory() {
        let dir   = TempDir::new().unwrap();
        let store = CorpusStore::new(dir.path().join("nested/posts.bin"));
        assert_eq!(store.append(&[raw("a", "b")]).unwrap(), 1);
    }

    #[test]
    fn test_missing_file_is_corpus_error() {
        let dir   = TempDir::new().unwrap();
        let store = CorpusStore::new(dir.path().join("missing.bin"));
        assert!(matches!(store.load_all(), Err(LmError::CorpusLoad { .. })));
    }

    #[test]
    fn test_empty_file_is_corpus_error() {
        let dir  = TempDir::new().unwrap();
        let path = dir.path().join("empty.bin");
        fs::write(&path, b"").unwrap();
        assert!(matches!(CorpusStore::new(path).load_all(), Err(LmError::CorpusLoad { .. })));
    }

    #[test]
    fn test_corrupt_file_is_corpus_error() {
        let dir  = TempDir::new().unwrap();
        let path = dir.path().join("junk.bin");
        fs::write(&path, [0xffu8; 3]).unwrap();
        assert!(matches!(CorpusStore::new(path).load_all(), Err(LmError::CorpusLoad { .. })));
    }

    #[test]
    fn test_zero_posts_is_corpus_error() {
        let dir   = TempDir::new().unwrap();
        let store = CorpusStore::new(dir.path().join("posts.bin"));
        store.append(&[]).unwrap();
        assert!(matches!(store.load_all(), Err(LmError::CorpusLoad { .. })));
    }
}
