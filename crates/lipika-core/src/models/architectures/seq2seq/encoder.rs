use candle_core::{IndexOp, Module, Tensor};
use candle_nn::{Embedding, VarBuilder};

use crate::error::Result;
use crate::models::shared::lstm::{LstmCell, LstmState};
use crate::models::shared::weights::load_embedding;

use super::config::Seq2SeqConfig;

pub struct EncoderOutput {
    /// `[batch, src_len, 2 * hidden]`, forward and backward outputs per position.
    pub outputs: Tensor,
    /// Forward and backward final states summed, `[batch, hidden]` each.
    pub state: LstmState,
}

/// Bidirectional single-layer LSTM encoder.
pub struct Encoder {
    embedding: Embedding,
    forward: LstmCell,
    backward: LstmCell,
}

impl Encoder {
    pub fn load(vb: &VarBuilder, config: &Seq2SeqConfig) -> Result<Self> {
        let embedding = load_embedding(
            &vb.pp("embedding"),
            config.vocab_size,
            config.embedding_dim,
        )?;
        let rnn = vb.pp("rnn");
        let forward = LstmCell::load(&rnn, config.embedding_dim, config.hidden_dim, "l0")?;
        let backward =
            LstmCell::load(&rnn, config.embedding_dim, config.hidden_dim, "l0_reverse")?;

        Ok(Self {
            embedding,
            forward,
            backward,
        })
    }

    /// `src` holds padded ids, `[batch, src_len]`. Padding positions are run
    /// through the recurrence like any other position.
    pub fn forward(&self, src: &Tensor) -> Result<EncoderOutput> {
        let embedded = self.embedding.forward(src)?;
        let (_, src_len, _) = embedded.dims3()?;

        let steps = (0..src_len)
            .map(|t| embedded.i((.., t, ..))?.contiguous())
            .collect::<candle_core::Result<Vec<_>>>()?;

        let (forward_outputs, forward_state) = self.forward.run(&steps, false)?;
        let (backward_outputs, backward_state) = self.backward.run(&steps, true)?;

        let per_position = forward_outputs
            .iter()
            .zip(backward_outputs.iter())
            .map(|(fw, bw)| Tensor::cat(&[fw, bw], 1))
            .collect::<candle_core::Result<Vec<_>>>()?;
        let outputs = Tensor::stack(&per_position, 1)?;

        Ok(EncoderOutput {
            outputs,
            state: forward_state.sum(&backward_state)?,
        })
    }
}
