// ============================================================
// Layer 3 — Error Kinds
// ============================================================
// Every failure the core can report. None of these are retried:
// loading, training and sampling are single-attempt operations,
// so callers either surface the error or abort the run.

use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum LmError {
    /// A token that is not in the vocabulary was looked up.
    #[error("unknown token '{0}'")]
    UnknownToken(String),

    /// An index outside `0..len` was used on a window provider or vocabulary.
    #[error("index {index} out of bounds for length {len}")]
    IndexOutOfBounds { index: usize, len: usize },

    /// The corpus file is missing, unreadable, corrupt or empty.
    #[error("cannot load corpus '{path}': {reason}")]
    CorpusLoad { path: String, reason: String },

    /// A checkpoint file is missing or does not match the current run.
    #[error("cannot load checkpoint '{path}': {reason}")]
    CheckpointLoad { path: String, reason: String },

    /// Windows must hold at least one token.
    #[error("sequence length must be at least 1")]
    ZeroSequenceLength,

    #[error("cannot sample without at least one seed token")]
    EmptySeed,

    /// The model produced weights that do not form a distribution.
    #[error("cannot sample from distribution: {0}")]
    DegenerateDistribution(String),
}

impl LmError {
    pub fn corpus(path: impl Into<String>, reason: impl ToString) -> Self {
        Self::CorpusLoad { path: path.into(), reason: reason.to_string() }
    }

    pub fn checkpoint(path: impl Into<String>, reason: impl ToString) -> Self {
        Self::CheckpointLoad { path: path.into(), reason: reason.to_string() }
    }
}
