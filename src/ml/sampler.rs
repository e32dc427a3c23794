// ============================================================
// Layer 5 — Autoregressive Sampler
// ============================================================
// Extends a seed phrase one token at a time:
//
//   1. Map the running sequence to ids (unknown token → error)
//   2. Feed it as a single row through the model, from a zero state
//   3. Softmax the logits at the last position
//   4. Draw one id at random, weighted by those probabilities
//   5. Map it back to a token and append it
//
// The whole history is re-fed every step, so cost grows with the
// sequence. Randomness comes from the caller's Rng, which makes
// runs reproducible with a seeded generator.

use burn::{prelude::*, tensor::activation::softmax};
use rand::{
    distributions::{Distribution, WeightedIndex},
    Rng,
};

use crate::data::vocab::Vocabulary;
use crate::domain::error::LmError;
use crate::ml::model::SequenceModel;

pub struct Sampler<'a, B: Backend, M: SequenceModel<B>> {
    model:  &'a M,
    vocab:  &'a Vocabulary,
    device: B::Device,
    /// Feed at most this many trailing tokens per step. `None` feeds everything.
    context: Option<usize>,
}

impl<'a, B: Backend, M: SequenceModel<B>> Sampler<'a, B, M> {
    pub fn new(model: &'a M, vocab: &'a Vocabulary, device: B::Device) -> Self {
        Self { model, vocab, device, context: None }
    }

    pub fn with_max_context(mut self, context: Option<usize>) -> Self {
        self.context = context.filter(|&c| c > 0);
        self
    }

    /// Return `seed` followed by `steps` sampled tokens.
    pub fn sample<R: Rng + ?Sized>(
        &self,
        seed:  &[String],
        steps: usize,
        rng:   &mut R,
    ) -> Result<Vec<String>, LmError> {
        if seed.is_empty() {
            return Err(LmError::EmptySeed);
        }
        if self.model.vocab_size() != self.vocab.len() {
            return Err(LmError::DegenerateDistribution(format!(
                "model predicts {} tokens but the vocabulary has {}",
                self.model.vocab_size(),
                self.vocab.len()
            )));
        }

        let mut sequence = seed.to_vec();
        for _ in 0..steps {
            let start = self.context.map_or(0, |c| sequence.len().saturating_sub(c));
            let ids   = self.vocab.encode(&sequence[start..])?;
            let probs = self.next_token_probs(&ids)?;

            let dist = WeightedIndex::new(&probs)
                .map_err(|e| LmError::DegenerateDistribution(e.to_string()))?;
            let next = dist.sample(rng);

            sequence.push(self.vocab.token(next)?.to_string());
        }

        tracing::debug!("Sampled {} tokens after a seed of {}", steps, seed.len());
        Ok(sequence)
    }

    /// Probability of every vocabulary id following `ids`.
    fn next_token_probs(&self, ids: &[usize]) -> Result<Vec<f32>, LmError> {
        let seq_len = ids.len();
        let flat: Vec<i32> = ids.iter().map(|&x| x as i32).collect();
        let input = Tensor::<B, 1, Int>::from_ints(flat.as_slice(), &self.device)
            .reshape([1, seq_len]);

        let state = self.model.init_state(1, &self.device);
        let (logits, _) = self.model.forward(input, state);

        let [_, _, vocab] = logits.dims();
        let last = logits
            .slice([0..1, seq_len - 1..seq_len, 0..vocab])
            .reshape([vocab]);

        softmax(last, 0)
            .into_data()
            .convert::<f32>()
            .to_vec::<f32>()
            .map_err(|e| LmError::DegenerateDistribution(format!("{e:?}")))
    }
}
