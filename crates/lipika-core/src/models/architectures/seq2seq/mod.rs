//! Character-level attention seq2seq transliterator.
//!
//! A bidirectional LSTM encodes the padded romanized word; an LSTM decoder
//! with additive attention emits native-script characters one at a time.
//! The parameter names match the PyTorch `Seq2Seq` state dict the training
//! pipeline saves, so `.pt` checkpoints load directly.

mod attention;
mod config;
mod decoder;
mod encoder;

use candle_core::{Device, Tensor};
use candle_nn::VarBuilder;
use tracing::debug;

use crate::error::{Error, Result};
use crate::models::shared::lstm::LstmState;
use crate::vocab::SpecialTokens;

pub use attention::Attention;
pub use config::{Seq2SeqConfig, DEFAULT_EMBEDDING_DIM, DEFAULT_HIDDEN_DIM};
pub use decoder::Decoder;
pub use encoder::{Encoder, EncoderOutput};

pub struct Seq2SeqModel {
    config: Seq2SeqConfig,
    encoder: Encoder,
    decoder: Decoder,
    device: Device,
}

impl Seq2SeqModel {
    /// Build the network from a checkpoint whose embedding tables must have
    /// exactly `vocab_size` rows.
    pub fn load(vb: &VarBuilder, vocab_size: usize) -> Result<Self> {
        let config = Seq2SeqConfig::from_weights(vb, vocab_size)?;
        debug!(
            "Seq2seq dims: vocab={}, emb={}, hidden={}",
            config.vocab_size, config.embedding_dim, config.hidden_dim
        );

        let encoder = Encoder::load(&vb.pp("encoder"), &config)?;
        let decoder = Decoder::load(&vb.pp("decoder"), &config)?;

        Ok(Self {
            config,
            encoder,
            decoder,
            device: vb.device().clone(),
        })
    }

    pub fn config(&self) -> &Seq2SeqConfig {
        &self.config
    }

    pub fn encode(&self, src_ids: &[u32]) -> Result<EncoderOutput> {
        if src_ids.is_empty() {
            return Err(Error::InvalidInput("Empty source sequence".to_string()));
        }
        let src = Tensor::new(src_ids, &self.device)?.unsqueeze(0)?;
        self.encoder.forward(&src)
    }

    /// Advance the decoder by one token. Returns `[1, vocab_size]` logits.
    pub fn decode_step(
        &self,
        input: u32,
        state: &LstmState,
        encoder_outputs: &Tensor,
    ) -> Result<(Tensor, LstmState)> {
        let token = Tensor::new(&[input], &self.device)?;
        self.decoder.step(&token, state, encoder_outputs)
    }

    /// Greedy autoregressive decoding: start from `<sos>`, take the arg-max
    /// at every step, stop on `<eos>` (not emitted) or after `max_steps`.
    pub fn generate(
        &self,
        src_ids: &[u32],
        specials: &SpecialTokens,
        max_steps: usize,
    ) -> Result<Vec<u32>> {
        let EncoderOutput {
            outputs: encoder_outputs,
            mut state,
        } = self.encode(src_ids)?;

        let mut input = specials.sos;
        let mut decoded = Vec::with_capacity(max_steps);

        for _ in 0..max_steps {
            let (logits, next) = self.decode_step(input, &state, &encoder_outputs)?;
            state = next;

            let next_id = argmax_1d(&logits.squeeze(0)?)?;
            if next_id == specials.eos {
                break;
            }
            decoded.push(next_id);
            input = next_id;
        }

        Ok(decoded)
    }
}

/// Index of the largest value; the first one wins ties.
fn argmax_1d(x: &Tensor) -> Result<u32> {
    let v = x.to_vec1::<f32>()?;
    let mut best_idx = 0usize;
    let mut best_val = f32::NEG_INFINITY;
    for (i, &val) in v.iter().enumerate() {
        if val > best_val {
            best_val = val;
            best_idx = i;
        }
    }
    Ok(best_idx as u32)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::test_support::{sample_vocab, weight_tensors, Behavior};
    use candle_core::DType;

    fn model_for(behavior: Behavior, rows_offset: usize) -> Result<(Seq2SeqModel, crate::vocab::CharVocab)> {
        let vocab = sample_vocab();
        let tensors = weight_tensors(&vocab, &behavior, vocab.len() + rows_offset);
        let vb = VarBuilder::from_tensors(tensors, DType::F32, &Device::Cpu);
        let model = Seq2SeqModel::load(&vb, vocab.len())?;
        Ok((model, vocab))
    }

    #[test]
    fn encoder_shapes_follow_config() {
        let (model, vocab) = model_for(Behavior::Chain("హై".chars().collect()), 0).unwrap();
        let ids = vocab.encode("ghar", 10);
        let out = model.encode(&ids).unwrap();
        let hidden = model.config().hidden_dim;

        assert_eq!(out.outputs.dims(), &[1, 10, hidden * 2]);
        assert_eq!(out.state.h.dims(), &[1, hidden]);
        assert_eq!(out.state.c.dims(), &[1, hidden]);
    }

    #[test]
    fn greedy_decoding_follows_the_chain() {
        let (model, vocab) = model_for(Behavior::Chain("హైద".chars().collect()), 0).unwrap();
        let ids = vocab.encode("hyd", 40);
        let out = model.generate(&ids, vocab.specials(), 40).unwrap();
        assert_eq!(vocab.decode(&out), "హైద");
    }

    #[test]
    fn decoding_is_bounded_without_eos() {
        let (model, vocab) = model_for(Behavior::Repeat('ర'), 0).unwrap();
        let ids = vocab.encode("ra", 12);
        let out = model.generate(&ids, vocab.specials(), 12).unwrap();
        assert_eq!(out.len(), 12);
        assert_eq!(vocab.decode(&out), "ర".repeat(12));
    }

    #[test]
    fn immediate_eos_yields_nothing() {
        let (model, vocab) = model_for(Behavior::Chain(Vec::new()), 0).unwrap();
        let ids = vocab.encode("ghar", 40);
        assert!(model.generate(&ids, vocab.specials(), 40).unwrap().is_empty());
    }

    #[test]
    fn vocabulary_size_mismatch_is_fatal() {
        match model_for(Behavior::Chain(Vec::new()), 3) {
            Err(Error::ShapeMismatch { tensor, .. }) => {
                assert_eq!(tensor, "encoder.embedding.weight")
            }
            Err(other) => panic!("expected shape mismatch, got {other}"),
            Ok(_) => panic!("expected shape mismatch"),
        }
    }

    #[test]
    fn argmax_prefers_first_maximum() {
        let t = Tensor::new(&[0.5f32, 2.0, 2.0, -1.0], &Device::Cpu).unwrap();
        assert_eq!(argmax_1d(&t).unwrap(), 1);
    }
}
