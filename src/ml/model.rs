use burn::{
    nn::{
        loss::CrossEntropyLossConfig,
        Dropout, DropoutConfig,
        Embedding, EmbeddingConfig,
        Linear, LinearConfig,
        Lstm, LstmConfig,
    },
    prelude::*,
};

use crate::data::batcher::{SentimentBatch, NUM_CLASSES};

// NOTE: #[derive(Config)] already generates Clone and Serialize/Deserialize.
#[derive(Config, Debug)]
pub struct SentimentClassifierConfig {
    pub vocab_size:  usize,
    pub hidden_size: usize,
    pub num_layers:  usize,
    /// Probability of keeping a hidden activation.
    #[config(default = 1.0)]
    pub keep_prob:   f64,
}

impl SentimentClassifierConfig {
    pub fn init<B: Backend>(&self, device: &B::Device) -> SentimentClassifier<B> {
        // embedding width equals the LSTM width so every layer is hidden → hidden
        let embedding = EmbeddingConfig::new(self.vocab_size, self.hidden_size).init(device);
        let layers: Vec<Lstm<B>> = (0..self.num_layers)
            .map(|_| LstmConfig::new(self.hidden_size, self.hidden_size, true).init(device))
            .collect();
        let dropout = DropoutConfig::new(1.0 - self.keep_prob).init();
        let output  = LinearConfig::new(self.hidden_size, NUM_CLASSES).init(device);
        SentimentClassifier { embedding, layers, dropout, output }
    }
}

#[derive(Module, Debug)]
pub struct SentimentClassifier<B: Backend> {
    pub embedding: Embedding<B>,
    pub layers:    Vec<Lstm<B>>,
    pub dropout:   Dropout,
    pub output:    Linear<B>,
}

impl<B: Backend> SentimentClassifier<B> {
    /// inputs: [batch, seq_len], last_step: [batch, seq_len, 1] → logits: [batch, NUM_CLASSES]
    pub fn forward(&self, inputs: Tensor<B, 2, Int>, last_step: Tensor<B, 3>) -> Tensor<B, 2> {
        let mut x = self.embedding.forward(inputs);
        for lstm in &self.layers {
            let (hidden, _state) = lstm.forward(x, None);
            x = self.dropout.forward(hidden);
        }

        // The one-hot mask zeroes every time step except the last real token.
        let [batch_size, _, hidden_size] = x.dims();
        let last = (x * last_step).sum_dim(1).reshape([batch_size, hidden_size]);
        self.output.forward(last)
    }

    /// Mean cross-entropy over the batch, plus the logits it was computed from.
    pub fn forward_loss(&self, batch: SentimentBatch<B>) -> (Tensor<B, 1>, Tensor<B, 2>) {
        let logits = self.forward(batch.inputs, batch.last_step);
        let ce = CrossEntropyLossConfig::new().init(&logits.device());
        let loss = ce.forward(logits.clone(), batch.targets);
        (loss, logits)
    }
}

/// Number of rows whose arg-max class equals the target.
pub fn count_correct<B: Backend>(logits: Tensor<B, 2>, targets: Tensor<B, 1, Int>) -> usize {
    let [batch_size, _] = logits.dims();
    // argmax(1) returns [batch, 1]; flatten before comparing with [batch]
    let predicted = logits.argmax(1).reshape([batch_size]);
    let correct: i64 = predicted.equal(targets).int().sum().into_scalar().elem::<i64>();
    correct as usize
}
