// ============================================================
// Layer 3 — Domain Layer
// ============================================================
// Plain Rust types that describe the corpus and the ways it
// can fail. Nothing in here touches Burn, the filesystem or
// the model.
//
//   post.rs   — Post records and raw scraper output
//   error.rs  — LmError, the error kinds every layer reports
//   traits.rs — CorpusSource, the seam between storage and use cases

pub mod post;

pub mod error;

pub mod traits;
