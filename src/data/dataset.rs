// ============================================================
// Layer 4 — Windowed Sequence Provider
// ============================================================
// Exposes the indexed stream as overlapping (input, target)
// windows of fixed length L, where target is input shifted by
// one position:
//
//   stream:  [a b c d e]      L = 2
//   window 0: input [a b]  target [b c]
//   window 1: input [b c]  target [c d]
//   window 2: input [c d]  target [d e]
//
// There are max(0, S - L) windows for a stream of length S.
// Windows are materialised on demand and never stored.

use burn::data::dataset::Dataset;

use crate::data::vocab::IndexedStream;
use crate::domain::error::LmError;

/// One training example: L input ids and the L ids that follow each of them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Window {
    pub input:  Vec<usize>,
    pub target: Vec<usize>,
}

pub struct WindowDataset {
    stream:          IndexedStream,
    sequence_length: usize,
}

impl WindowDataset {
    pub fn new(stream: IndexedStream, sequence_length: usize) -> Self {
        Self { stream, sequence_length }
    }

    pub fn sequence_length(&self) -> usize {
        self.sequence_length
    }

    /// Number of windows: `max(0, S - L)`.
    pub fn size(&self) -> usize {
        self.stream.len().saturating_sub(self.sequence_length)
    }

    /// The window starting at offset `index` of the stream.
    pub fn window(&self, index: usize) -> Result<Window, LmError> {
        let size = self.size();
        if index >= size {
            return Err(LmError::IndexOutOfBounds { index, len: size });
        }

        let ids = self.stream.ids();
        let l   = self.sequence_length;
        Ok(Window {
            input:  ids[index..index + l].to_vec(),
            target: ids[index + 1..index + l + 1].to_vec(),
        })
    }
}

impl Dataset<Window> for WindowDataset {
    fn get(&self, index: usize) -> Option<Window> {
        self.window(index).ok()
    }

    fn len(&self) -> usize {
        self.size()
    }
}
