// ============================================================
// Layer 2 — TrainUseCase
// ============================================================
// Orchestrates the full training pipeline in order:
//
//   Step 1: Load the corpus file          (Layer 6 - infra)
//   Step 2: Normalise every post          (Layer 4 - data)
//   Step 3: Build the vocabulary          (Layer 4 - data)
//   Step 4: Flatten into an id stream     (Layer 4 - data)
//   Step 5: Wrap it as a window dataset   (Layer 4 - data)
//   Step 6: Build or resume model + Adam  (Layer 5 / 6)
//   Step 7: Save config and vocabulary    (Layer 6 - infra)
//   Step 8: Train, checkpoint per epoch   (Layer 5 - ml)
//   Step 9: Sample from the seed query    (Layer 5 - ml)

use std::sync::Arc;

use anyhow::{Context, Result};
use burn::{module::AutodiffModule, optim::AdamConfig};
use serde::{Deserialize, Serialize};

use crate::application::generate_use_case::sample_text;
use crate::data::{
    dataset::WindowDataset,
    normalizer::Normalizer,
    vocab::{IndexedStream, StreamSource, Vocabulary},
};
use crate::domain::{error::LmError, post::Corpus, traits::CorpusSource};
use crate::infra::{
    checkpoint::{CheckpointManager, TrainingProgress},
    corpus_store::CorpusStore,
    metrics::{EpochMetrics, MetricsLogger},
    vocab_store::VocabStore,
};
use crate::ml::{
    model::{LanguageModel, LanguageModelConfig},
    trainer::{train_epochs, TrainerConfig},
    TrainBackend,
};

// ─── Training Configuration ──────────────────────────────────────────────────
// Every knob of a training run. Saved as train_config.json so that
// generation can rebuild the same architecture later.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainConfig {
    pub corpus:            String,
    pub checkpoint_dir:    String,
    pub model_name:        String,
    pub optim_name:        String,
    pub epochs:            usize,
    pub batch_size:        usize,
    pub lr:                f64,
    pub sequence_length:   usize,
    pub d_model:           usize,
    pub num_layers:        usize,
    pub dropout:           f64,
    pub log_every:         usize,
    pub prefetch:          usize,
    pub with_titles:       bool,
    pub resume:            bool,
    pub query:             String,
    pub prediction_length: usize,
    pub seed:              Option<u64>,
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self {
            corpus:            "tmp.bin".to_string(),
            checkpoint_dir:    "checkpoints".to_string(),
            model_name:        "model1".to_string(),
            optim_name:        "optim1".to_string(),
            epochs:            1,
            batch_size:        4,
            lr:                0.001,
            sequence_length:   10,
            d_model:           128,
            num_layers:        3,
            dropout:           0.2,
            log_every:         100,
            prefetch:          0,
            with_titles:       false,
            resume:            false,
            query:             "does anyone else".to_string(),
            prediction_length: 50,
            seed:              None,
        }
    }
}

impl TrainConfig {
    pub fn model_config(&self, vocab_size: usize) -> LanguageModelConfig {
        LanguageModelConfig::new(vocab_size)
            .with_d_model(self.d_model)
            .with_num_layers(self.num_layers)
            .with_dropout(self.dropout)
    }

    pub fn stream_source(&self) -> StreamSource {
        if self.with_titles { StreamSource::TitleAndBody } else { StreamSource::Body }
    }

    fn same_architecture(&self, other: &TrainConfig) -> bool {
        self.d_model == other.d_model && self.num_layers == other.num_layers
    }
}

// ─── Prepared data ────────────────────────────────────────────────────────────
/// Everything the trainer needs from the corpus.
pub struct PreparedCorpus {
    pub vocab:   Vocabulary,
    pub dataset: WindowDataset,
}

/// Normalise the corpus, build the vocabulary and window it.
pub fn prepare_corpus(
    corpus:          &Corpus,
    sequence_length: usize,
    source:          StreamSource,
) -> Result<PreparedCorpus, LmError> {
    if sequence_length == 0 {
        return Err(LmError::ZeroSequenceLength);
    }

    let normalizer = Normalizer::new();
    let cleaned: Corpus = corpus.iter().map(|p| normalizer.normalize_post(p)).collect();

    let vocab   = Vocabulary::build(&cleaned);
    let stream  = IndexedStream::build(&cleaned, &vocab, source)?;
    if stream.is_empty() {
        tracing::warn!("Corpus has no tokens to train on for {:?}", source);
    }
    let dataset = WindowDataset::new(stream, sequence_length);

    Ok(PreparedCorpus { vocab, dataset })
}

// ─── TrainUseCase ─────────────────────────────────────────────────────────────
pub struct TrainUseCase {
    config: TrainConfig,
}

impl TrainUseCase {
    pub fn new(config: TrainConfig) -> Self {
        Self { config }
    }

    /// Train, then return text sampled from the configured query.
    pub fn execute(&self) -> Result<String> {
        let cfg = &self.config;

        // ── Steps 1–5: corpus → windows ──────────────────────────────────────
        let corpus = CorpusStore::new(&cfg.corpus).load_all()?;
        let PreparedCorpus { vocab, dataset } =
            prepare_corpus(&corpus, cfg.sequence_length, cfg.stream_source())?;
        tracing::info!(
            "Vocabulary: {} tokens, {} training windows of length {}",
            vocab.len(),
            dataset.size(),
            cfg.sequence_length
        );
        let dataset = Arc::new(dataset);

        // ── Step 6: model and optimiser ───────────────────────────────────────
        let ckpt = CheckpointManager::new(&cfg.checkpoint_dir)?
            .with_model_name(&cfg.model_name)
            .with_optim_name(&cfg.optim_name);
        let vocab_store = VocabStore::new(&cfg.checkpoint_dir);
        let device = burn::backend::wgpu::WgpuDevice::default();

        let model: LanguageModel<TrainBackend> = cfg.model_config(vocab.len()).init(&device);
        let optim = AdamConfig::new().init::<TrainBackend, LanguageModel<TrainBackend>>();
        tracing::info!(
            "Model ready: {} LSTM layers, d_model={}, {} parameters",
            cfg.num_layers,
            cfg.d_model,
            burn::module::Module::num_params(&model)
        );

        let (model, mut optim, start_epoch) = if cfg.resume {
            tracing::info!("Continuing training from checkpoint in '{}'", cfg.checkpoint_dir);
            self.check_resumable(&ckpt, &vocab_store, &vocab)?;

            let progress = ckpt.load_progress()?;
            let model    = ckpt.load_model::<TrainBackend, _>(model, &device)?;
            let optim    = ckpt
                .load_optimizer::<TrainBackend, LanguageModel<TrainBackend>, _>(optim, &device)?;
            (model, optim, progress.epochs_completed)
        } else {
            tracing::info!("Training new model from scratch");
            (model, optim, 0)
        };

        // ── Step 7: persist what generation needs ─────────────────────────────
        ckpt.save_config(cfg)?;
        vocab_store.save(&vocab)?;

        // ── Step 8: train ─────────────────────────────────────────────────────
        let metrics = MetricsLogger::new(&cfg.checkpoint_dir)?;
        let trainer_cfg = TrainerConfig {
            epochs:      cfg.epochs,
            batch_size:  cfg.batch_size,
            lr:          cfg.lr,
            log_every:   cfg.log_every,
            prefetch:    cfg.prefetch,
            start_epoch,
        };

        let mut best_loss = f64::INFINITY;
        let model = train_epochs(model, &mut optim, &dataset, &trainer_cfg, &device, |model, optim, summary| {
            ckpt.save_checkpoint::<TrainBackend, LanguageModel<TrainBackend>, _>(
                model,
                optim,
                &TrainingProgress::new(summary.epoch + 1),
            )?;

            let row = EpochMetrics::from(summary);
            if row.is_improvement(best_loss) {
                best_loss = row.mean_loss;
                tracing::info!("New best mean loss {:.4} at epoch {}", row.mean_loss, row.epoch);
            }
            metrics.log(&row)
        })?;
        tracing::info!(
            "Saved model state to '{}', per-epoch loss in '{}'",
            cfg.checkpoint_dir,
            metrics.csv_path().display()
        );

        // ── Step 9: sample with dropout off ───────────────────────────────────
        let model = model.valid();
        sample_text(&model, &vocab, device, &cfg.query, cfg.prediction_length, cfg.seed, None)
    }

    /// A resumed run must match the saved architecture and vocabulary.
    fn check_resumable(
        &self,
        ckpt:        &CheckpointManager,
        vocab_store: &VocabStore,
        vocab:       &Vocabulary,
    ) -> Result<()> {
        let saved_cfg = ckpt.load_config()?;
        if !saved_cfg.same_architecture(&self.config) {
            return Err(LmError::checkpoint(
                &self.config.checkpoint_dir,
                format!(
                    "saved model has d_model={} num_layers={}, requested d_model={} num_layers={}",
                    saved_cfg.d_model, saved_cfg.num_layers, self.config.d_model, self.config.num_layers
                ),
            ))
            .context("Cannot resume training");
        }

        let saved_vocab = vocab_store.load()?;
        if &saved_vocab != vocab {
            return Err(LmError::checkpoint(
                &self.config.checkpoint_dir,
                format!(
                    "corpus vocabulary ({} tokens) differs from the checkpoint's ({} tokens)",
                    vocab.len(),
                    saved_vocab.len()
                ),
            ))
            .context("Cannot resume training");
        }
        Ok(())
    }
}
