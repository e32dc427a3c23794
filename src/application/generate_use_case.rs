// ============================================================
// Layer 2 — Generate Use Case
// ============================================================
// Rebuilds a trained model from its checkpoint directory and
// extends a seed query with sampled tokens:
//
//   1. train_config.json → architecture
//   2. vocab.json        → token <-> id mapping used in training
//   3. <model_name>.mpk  → parameters
//   4. normalise the query, sample, join with spaces

use anyhow::{Context, Result};
use burn::prelude::*;
use rand::{rngs::StdRng, SeedableRng};

use crate::data::{normalizer::Normalizer, vocab::Vocabulary};
use crate::infra::{checkpoint::CheckpointManager, vocab_store::VocabStore};
use crate::ml::{model::LanguageModel, sampler::Sampler, InferBackend};

pub struct GenerateUseCase {
    vocab:  Vocabulary,
    model:  LanguageModel<InferBackend>,
    device: burn::backend::wgpu::WgpuDevice,
}

impl GenerateUseCase {
    pub fn new(checkpoint_dir: &str, model_name: &str) -> Result<Self> {
        let ckpt   = CheckpointManager::new(checkpoint_dir)?.with_model_name(model_name);
        let cfg    = ckpt.load_config().context("Have you run 'train' first?")?;
        let store  = VocabStore::new(checkpoint_dir);
        if !store.exists() {
            anyhow::bail!("No vocabulary in '{}'. Have you run 'train' first?", checkpoint_dir);
        }
        let vocab  = store.load()?;
        let device = burn::backend::wgpu::WgpuDevice::default();

        tracing::info!("Using pre-existing model '{}' from '{}'", model_name, checkpoint_dir);
        let model: LanguageModel<InferBackend> = cfg.model_config(vocab.len()).init(&device);
        let model = ckpt.load_model::<InferBackend, _>(model, &device)?;

        Ok(Self { vocab, model, device })
    }

    pub fn generate(
        &self,
        query:       &str,
        steps:       usize,
        seed:        Option<u64>,
        max_context: Option<usize>,
    ) -> Result<String> {
        sample_text(&self.model, &self.vocab, self.device.clone(), query, steps, seed, max_context)
    }
}

/// Normalise `query`, sample `steps` tokens after it and join everything.
pub fn sample_text<B: Backend>(
    model:       &LanguageModel<B>,
    vocab:       &Vocabulary,
    device:      B::Device,
    query:       &str,
    steps:       usize,
    seed:        Option<u64>,
    max_context: Option<usize>,
) -> Result<String> {
    let seed_tokens = Normalizer::new().normalize_text(query);
    let mut rng = match seed {
        Some(s) => StdRng::seed_from_u64(s),
        None    => StdRng::from_entropy(),
    };

    let tokens = Sampler::<B, _>::new(model, vocab, device)
        .with_max_context(max_context)
        .sample(&seed_tokens, steps, &mut rng)
        .with_context(|| format!("Cannot generate text from query '{query}'"))?;

    Ok(tokens.join(" "))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::post::Post;
    use crate::ml::model::LanguageModelConfig;
    use burn::backend::NdArray;

    fn setup() -> (Vocabulary, LanguageModel<NdArray>) {
        let body = ["does", "anyone", "else", "like", "rain", "?"];
        let vocab = Vocabulary::build(&[Post::new(0, vec![], body.iter().map(|s| s.to_string()).collect())]);
        let model = LanguageModelConfig::new(vocab.len())
            .with_d_model(8)
            .with_num_layers(1)
            .init::<NdArray>(&Default::default());
        (vocab, model)
    }

    #[test]
    fn test_query_is_normalised_before_lookup() {
        let (vocab, model) = setup();
        let text = sample_text(&model, &vocab, Default::default(), "Does ANYONE else?", 4, Some(3), None).unwrap();

        let words: Vec<&str> = text.split(' ').collect();
        assert_eq!(words.len(), 8);
        assert_eq!(&words[..4], &["does", "anyone", "else", "?"]);
    }

    #[test]
    fn test_fixed_seed_is_reproducible() {
        let (vocab, model) = setup();
        let a = sample_text(&model, &vocab, Default::default(), "like rain", 5, Some(11), None).unwrap();
        let b = sample_text(&model, &vocab, Default::default(), "like rain", 5, Some(11), None).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_unknown_query_word_fails() {
        let (vocab, model) = setup();
        assert!(sample_text(&model, &vocab, Default::default(), "snow", 2, Some(1), None).is_err());
    }
}
