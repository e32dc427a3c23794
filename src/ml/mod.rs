// ============================================================
// Layer 5 — ML / Model Layer (Burn)
// ============================================================
// All Burn model code lives here.
//
//   model.rs   — embedding → stacked LSTM → linear projection,
//                plus the recurrent state it carries and the
//                SequenceModel trait the other two files rely on
//
//   trainer.rs — truncated BPTT training over sequential batches
//
//   sampler.rs — autoregressive next-token sampling
//
// Reference: Burn Book §3 (Building Blocks), §5 (Training)
//            Hochreiter & Schmidhuber (1997) LSTM

/// Language model architecture and recurrent state
pub mod model;

/// Epoch loop with carried, detached state
pub mod trainer;

/// Seeded, weighted next-token sampling
pub mod sampler;

/// Backend used for training (gradients enabled).
pub type TrainBackend = burn::backend::Autodiff<burn::backend::Wgpu>;

/// Backend used for generation (no autodiff, dropout off).
pub type InferBackend = burn::backend::Wgpu;
