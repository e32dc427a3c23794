// ============================================================
// Layer 5 — Training Loop
// ============================================================
// Truncated backpropagation-through-time over sequential batches.
//
// Per epoch:
//   - recurrent state starts at zero, one row per batch row
//   - each batch runs forward from the carried state
//   - the new state is detached before the next batch, so
//     activations flow across batch boundaries but gradients don't
//   - one Adam step per batch
//
// A shorter trailing batch continues from the first rows of the
// carried state. Loss is logged every `log_every` batches; logging
// never affects control flow.
//
// Reference: Burn Book §5, Kingma & Ba (2015) Adam

use std::sync::Arc;

use anyhow::Result;
use burn::{
    module::AutodiffModule,
    optim::{GradientsParams, Optimizer},
    prelude::*,
    tensor::backend::AutodiffBackend,
};

use crate::data::{
    batcher::{EpochBatches, WindowBatcher},
    dataset::WindowDataset,
};
use crate::domain::error::LmError;
use crate::ml::model::{next_token_loss, RecurrentState, SequenceModel};

#[derive(Debug, Clone)]
pub struct TrainerConfig {
    pub epochs:      usize,
    pub batch_size:  usize,
    pub lr:          f64,
    /// Report loss on every n-th batch of an epoch.
    pub log_every:   usize,
    /// Bounded prefetch queue depth, 0 to batch inline.
    pub prefetch:    usize,
    /// Number given to the first epoch of this run.
    pub start_epoch: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EpochSummary {
    pub epoch:     usize,
    pub batches:   usize,
    /// NaN when the epoch had no batches.
    pub mean_loss: f64,
}

/// Train `model` for `cfg.epochs` epochs and return it.
///
/// `on_epoch_end` runs after every epoch with the current model and
/// optimiser; an error from it aborts training.
pub fn train_epochs<B, M, O, F>(
    mut model:        M,
    optim:            &mut O,
    dataset:          &Arc<WindowDataset>,
    cfg:              &TrainerConfig,
    device:           &B::Device,
    mut on_epoch_end: F,
) -> Result<M>
where
    B: AutodiffBackend,
    M: SequenceModel<B> + AutodiffModule<B>,
    O: Optimizer<M, B>,
    F: FnMut(&M, &O, &EpochSummary) -> Result<()>,
{
    if dataset.sequence_length() == 0 {
        return Err(LmError::ZeroSequenceLength.into());
    }

    let batcher   = WindowBatcher::new();
    let log_every = cfg.log_every.max(1);

    if dataset.size() == 0 {
        tracing::warn!(
            "Stream is not longer than sequence_length={}, epochs will be empty",
            dataset.sequence_length()
        );
    }

    for epoch in cfg.start_epoch..cfg.start_epoch + cfg.epochs {
        let mut state: RecurrentState<B> = model.init_state(cfg.batch_size, device);
        let mut loss_sum = 0.0f64;
        let mut batches  = 0usize;

        for (b, windows) in EpochBatches::new(dataset, cfg.batch_size, cfg.prefetch).enumerate() {
            let batch = batcher.batch::<B>(windows, device);
            let rows  = batch.inputs.dims()[0];

            state = match state.batch_size() {
                n if n == rows => state,
                n if n > rows  => state.truncate(rows),
                _              => model.init_state(rows, device),
            };

            let (logits, next_state) = model.forward(batch.inputs, state);
            let loss = next_token_loss(logits, batch.targets);

            state = next_state.detach();

            let loss_val: f64 = loss.clone().into_scalar().elem::<f64>();
            loss_sum += loss_val;
            batches  += 1;

            let grads = loss.backward();
            let grads = GradientsParams::from_grads(grads, &model);
            model = optim.step(cfg.lr, model, grads);

            if b % log_every == 0 {
                tracing::info!(epoch, batch = b, loss = loss_val, "training progress");
            }
        }

        let summary = EpochSummary {
            epoch,
            batches,
            mean_loss: if batches > 0 { loss_sum / batches as f64 } else { f64::NAN },
        };
        tracing::info!(
            "Epoch {} done: {} batches, mean loss {:.4}",
            summary.epoch, summary.batches, summary.mean_loss
        );

        on_epoch_end(&model, optim, &summary)?;
    }

    tracing::info!("Training complete!");
    Ok(model)
}
