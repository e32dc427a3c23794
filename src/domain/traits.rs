// ============================================================
// Layer 3 — Core Traits
// ============================================================
// The application layer asks for a corpus through this trait
// and never sees how or where the posts are stored.
//
// Implementations:
//   - CorpusStore → bincode file on disk

use crate::domain::error::LmError;
use crate::domain::post::Corpus;

/// Anything that can hand over the full list of posts for a run.
pub trait CorpusSource {
    /// Load every post. Fails if there is nothing to train on.
    fn load_all(&self) -> Result<Corpus, LmError>;
}
