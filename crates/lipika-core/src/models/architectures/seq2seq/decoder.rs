use candle_core::{Module, Tensor};
use candle_nn::{Embedding, Linear, VarBuilder};

use crate::error::Result;
use crate::models::shared::lstm::{LstmCell, LstmState};
use crate::models::shared::weights::{load_embedding, load_linear};

use super::attention::Attention;
use super::config::Seq2SeqConfig;

/// Attention decoder advanced one token at a time.
pub struct Decoder {
    embedding: Embedding,
    attention: Attention,
    rnn: LstmCell,
    fc_out: Linear,
}

impl Decoder {
    pub fn load(vb: &VarBuilder, config: &Seq2SeqConfig) -> Result<Self> {
        let embedding = load_embedding(
            &vb.pp("embedding"),
            config.vocab_size,
            config.embedding_dim,
        )?;
        let attention = Attention::load(&vb.pp("attention"), config.hidden_dim)?;
        let rnn = LstmCell::load(
            &vb.pp("rnn"),
            config.decoder_input_dim(),
            config.hidden_dim,
            "l0",
        )?;
        let fc_out = load_linear(
            &vb.pp("fc_out"),
            config.projection_input_dim(),
            config.vocab_size,
            true,
        )?;

        Ok(Self {
            embedding,
            attention,
            rnn,
            fc_out,
        })
    }

    /// One decoding step. `input` is `[batch]` token ids; returns logits
    /// `[batch, vocab_size]` and the advanced state.
    pub fn step(
        &self,
        input: &Tensor,
        state: &LstmState,
        encoder_outputs: &Tensor,
    ) -> Result<(Tensor, LstmState)> {
        let embedded = self.embedding.forward(input)?;

        let weights = self.attention.weights(&state.h, encoder_outputs)?;
        let context = self.attention.context(&weights, encoder_outputs)?;

        let rnn_input = Tensor::cat(&[&embedded, &context], 1)?;
        let next = self.rnn.step(&rnn_input, state)?;

        let projection_input = Tensor::cat(&[&next.h, &context, &embedded], 1)?;
        let logits = self.fc_out.forward(&projection_input)?;

        Ok((logits, next))
    }
}
