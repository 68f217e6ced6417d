//! Dimensions of the attention seq2seq transliterator.

use candle_nn::VarBuilder;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::models::shared::weights::tensor_dims;

/// Embedding width used by the training pipeline.
pub const DEFAULT_EMBEDDING_DIM: usize = 128;
/// Recurrent width used by the training pipeline.
pub const DEFAULT_HIDDEN_DIM: usize = 256;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Seq2SeqConfig {
    pub vocab_size: usize,
    pub embedding_dim: usize,
    pub hidden_dim: usize,
}

impl Seq2SeqConfig {
    pub fn new(vocab_size: usize) -> Self {
        Self {
            vocab_size,
            embedding_dim: DEFAULT_EMBEDDING_DIM,
            hidden_dim: DEFAULT_HIDDEN_DIM,
        }
    }

    /// Read the embedding and hidden widths from the checkpoint and check
    /// the embedding table against the vocabulary size.
    pub fn from_weights(vb: &VarBuilder, vocab_size: usize) -> Result<Self> {
        let embedding = tensor_dims(&vb.pp("encoder.embedding"), "weight")?;
        let [rows, embedding_dim] = embedding[..] else {
            return Err(Error::ShapeMismatch {
                tensor: "encoder.embedding.weight".to_string(),
                expected: "[vocab_size, embedding_dim]".to_string(),
                found: format!("{embedding:?}"),
            });
        };
        if rows != vocab_size {
            return Err(Error::ShapeMismatch {
                tensor: "encoder.embedding.weight".to_string(),
                expected: format!("[{vocab_size}, {embedding_dim}]"),
                found: format!("{embedding:?}"),
            });
        }

        let recurrent = tensor_dims(&vb.pp("encoder.rnn"), "weight_hh_l0")?;
        let [gates, hidden_dim] = recurrent[..] else {
            return Err(Error::ShapeMismatch {
                tensor: "encoder.rnn.weight_hh_l0".to_string(),
                expected: "[4 * hidden_dim, hidden_dim]".to_string(),
                found: format!("{recurrent:?}"),
            });
        };
        if hidden_dim == 0 || gates != hidden_dim * 4 {
            return Err(Error::ShapeMismatch {
                tensor: "encoder.rnn.weight_hh_l0".to_string(),
                expected: format!("[{}, {hidden_dim}]", hidden_dim * 4),
                found: format!("{recurrent:?}"),
            });
        }

        Ok(Self {
            vocab_size,
            embedding_dim,
            hidden_dim,
        })
    }

    /// Width of each encoder output position (both directions).
    pub fn encoder_output_dim(&self) -> usize {
        self.hidden_dim * 2
    }

    /// Width of the decoder's recurrent input: `[embedding ; context]`.
    pub fn decoder_input_dim(&self) -> usize {
        self.embedding_dim + self.encoder_output_dim()
    }

    /// Width of the output projection's input: `[output ; context ; embedding]`.
    pub fn projection_input_dim(&self) -> usize {
        self.hidden_dim * 3 + self.embedding_dim
    }
}
