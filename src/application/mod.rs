// ============================================================
// Layer 2 — Application / Use Cases
// ============================================================
// Workflow coordination only: each use case calls into the data,
// ml and infra layers in order and returns a result to the CLI.

// Corpus → trained checkpoint → sample
pub mod train_use_case;

// Checkpoint → sample
pub mod generate_use_case;

// Scraper output → corpus file
pub mod append_use_case;
