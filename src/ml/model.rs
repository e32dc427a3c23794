use burn::{
    nn::{
        loss::CrossEntropyLossConfig,
        Dropout, DropoutConfig,
        Embedding, EmbeddingConfig,
        Linear, LinearConfig,
        Lstm, LstmConfig, LstmState,
    },
    prelude::*,
};

// NOTE: #[derive(Config)] already generates Clone and Serialize/Deserialize.
#[derive(Config, Debug)]
pub struct LanguageModelConfig {
    pub vocab_size: usize,
    /// Embedding width E and LSTM hidden size H. They are the same value:
    /// embeddings feed the first LSTM layer with no adapter in between.
    #[config(default = 128)]
    pub d_model: usize,
    #[config(default = 3)]
    pub num_layers: usize,
    /// Applied between LSTM layers, and only on autodiff backends.
    #[config(default = 0.2)]
    pub dropout: f64,
}

impl LanguageModelConfig {
    pub fn init<B: Backend>(&self, device: &B::Device) -> LanguageModel<B> {
        let embedding = EmbeddingConfig::new(self.vocab_size, self.d_model).init(device);
        let layers: Vec<Lstm<B>> = (0..self.num_layers)
            .map(|_| LstmConfig::new(self.d_model, self.d_model, true).init(device))
            .collect();
        let output  = LinearConfig::new(self.d_model, self.vocab_size).init(device);
        let dropout = DropoutConfig::new(self.dropout).init();
        LanguageModel {
            embedding, layers, output, dropout,
            vocab_size: self.vocab_size,
            d_model:    self.d_model,
        }
    }
}

// ─── Recurrent state ──────────────────────────────────────────────────────────
/// Hidden and cell memory of every LSTM layer,
/// each shaped [num_layers, batch, d_model].
#[derive(Debug, Clone)]
pub struct RecurrentState<B: Backend> {
    pub hidden: Tensor<B, 3>,
    pub cell:   Tensor<B, 3>,
}

impl<B: Backend> RecurrentState<B> {
    pub fn zeros(num_layers: usize, batch_size: usize, d_model: usize, device: &B::Device) -> Self {
        Self {
            hidden: Tensor::zeros([num_layers, batch_size, d_model], device),
            cell:   Tensor::zeros([num_layers, batch_size, d_model], device),
        }
    }

    pub fn batch_size(&self) -> usize {
        self.hidden.dims()[1]
    }

    /// Cut the state loose from the autodiff graph. Values are kept.
    pub fn detach(self) -> Self {
        Self { hidden: self.hidden.detach(), cell: self.cell.detach() }
    }

    /// Keep only the first `rows` batch rows.
    pub fn truncate(self, rows: usize) -> Self {
        let [layers, _, d] = self.hidden.dims();
        Self {
            hidden: self.hidden.slice([0..layers, 0..rows, 0..d]),
            cell:   self.cell.slice([0..layers, 0..rows, 0..d]),
        }
    }

    fn layer(&self, index: usize) -> LstmState<B, 2> {
        let [_, batch, d] = self.hidden.dims();
        let pick = |t: &Tensor<B, 3>| {
            t.clone().slice([index..index + 1, 0..batch, 0..d]).reshape([batch, d])
        };
        LstmState::new(pick(&self.cell), pick(&self.hidden))
    }

    fn from_layers(layers: Vec<LstmState<B, 2>>) -> Self {
        let (cells, hiddens): (Vec<_>, Vec<_>) =
            layers.into_iter().map(|s| (s.cell, s.hidden)).unzip();
        Self {
            hidden: Tensor::stack(hiddens, 0),
            cell:   Tensor::stack(cells, 0),
        }
    }
}

// ─── SequenceModel ────────────────────────────────────────────────────────────
/// What the trainer and the sampler need from a model. Any type with
/// these capabilities (plus Burn's Module for its parameters) can be
/// trained or sampled from.
pub trait SequenceModel<B: Backend> {
    /// input_ids: [batch, seq_len] → logits: [batch, seq_len, vocab].
    /// Logits are unnormalised.
    fn forward(
        &self,
        input_ids: Tensor<B, 2, Int>,
        state:     RecurrentState<B>,
    ) -> (Tensor<B, 3>, RecurrentState<B>);

    /// A zero state for `batch_size` rows.
    fn init_state(&self, batch_size: usize, device: &B::Device) -> RecurrentState<B>;

    fn vocab_size(&self) -> usize;
}

// ─── LanguageModel ────────────────────────────────────────────────────────────
#[derive(Module, Debug)]
pub struct LanguageModel<B: Backend> {
    pub embedding:  Embedding<B>,
    pub layers:     Vec<Lstm<B>>,
    pub output:     Linear<B>,
    pub dropout:    Dropout,
    pub vocab_size: usize,
    pub d_model:    usize,
}

impl<B: Backend> SequenceModel<B> for LanguageModel<B> {
    fn forward(
        &self,
        input_ids: Tensor<B, 2, Int>,
        state:     RecurrentState<B>,
    ) -> (Tensor<B, 3>, RecurrentState<B>) {
        let mut x = self.embedding.forward(input_ids); // [batch, seq_len, d_model]
        let mut next_states = Vec::with_capacity(self.layers.len());

        for (i, lstm) in self.layers.iter().enumerate() {
            if i > 0 {
                x = self.dropout.forward(x);
            }
            let (out, layer_state) = lstm.forward(x, Some(state.layer(i)));
            x = out;
            next_states.push(layer_state);
        }

        (self.output.forward(x), RecurrentState::from_layers(next_states))
    }

    fn init_state(&self, batch_size: usize, device: &B::Device) -> RecurrentState<B> {
        RecurrentState::zeros(self.layers.len(), batch_size, self.d_model, device)
    }

    fn vocab_size(&self) -> usize {
        self.vocab_size
    }
}

/// Token-level cross-entropy averaged over batch and position.
/// logits: [batch, seq_len, vocab], targets: [batch, seq_len].
pub fn next_token_loss<B: Backend>(logits: Tensor<B, 3>, targets: Tensor<B, 2, Int>) -> Tensor<B, 1> {
    let [batch, seq_len, vocab] = logits.dims();
    let ce = CrossEntropyLossConfig::new().init(&logits.device());
    ce.forward(
        logits.reshape([batch * seq_len, vocab]),
        targets.reshape([batch * seq_len]),
    )
}
