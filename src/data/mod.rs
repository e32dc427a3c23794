// ============================================================
// Layer 4 — Data Pipeline
// ============================================================
// Everything between the raw corpus and tensor batches:
//
//   Corpus (raw posts)
//       │
//       ▼
//   Normalizer        → clean lowercase tokens, punctuation split off
//       │
//       ▼
//   Vocabulary        → frozen token <-> id bijection
//       │
//       ▼
//   IndexedStream     → all bodies flattened into one id sequence
//       │
//       ▼
//   WindowDataset     → overlapping (input, target) windows
//       │
//       ▼
//   WindowBatcher     → [B, L] Int tensors, in sequential order
//
// Reference: Burn Book §4 (Datasets)

/// Punctuation splitting and lowercasing
pub mod normalizer;

/// Vocabulary and indexed stream builders
pub mod vocab;

/// Implements Burn's Dataset trait over overlapping windows
pub mod dataset;

/// Tensor batches and sequential / prefetched batch iteration
pub mod batcher;
