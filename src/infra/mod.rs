// ============================================================
// Layer 6 — Infrastructure Layer
// ============================================================
// Everything that touches the filesystem:
//
//   corpus_store.rs — bincode corpus file, load and append
//   checkpoint.rs   — model / optimiser records, progress and
//                     training config
//   vocab_store.rs  — vocabulary saved next to the checkpoint
//   metrics.rs      — per-epoch loss CSV
//
// Reference: Rust Book §9 (Error Handling with anyhow)
//            Burn Book §5 (Checkpointing)

/// Binary corpus file
pub mod corpus_store;

/// Model checkpoint saving and loading
pub mod checkpoint;

/// Vocabulary persistence
pub mod vocab_store;

/// Training metrics CSV logger
pub mod metrics;
