use candle_core::{Module, Tensor};
use candle_nn::{ops, Linear, VarBuilder};

use crate::error::Result;
use crate::models::shared::weights::load_linear;

/// Additive attention over encoder positions:
/// `softmax(v · tanh(W [h ; enc_t]))`.
pub struct Attention {
    attn: Linear,
    v: Linear,
}

impl Attention {
    pub fn load(vb: &VarBuilder, hidden_dim: usize) -> Result<Self> {
        let attn = load_linear(&vb.pp("attn"), hidden_dim * 3, hidden_dim, true)?;
        let v = load_linear(&vb.pp("v"), hidden_dim, 1, false)?;
        Ok(Self { attn, v })
    }

    /// Attention weights `[batch, src_len]` for decoder state `hidden`
    /// (`[batch, hidden]`) over `encoder_outputs` (`[batch, src_len, 2 * hidden]`).
    pub fn weights(&self, hidden: &Tensor, encoder_outputs: &Tensor) -> Result<Tensor> {
        let (batch, src_len, _) = encoder_outputs.dims3()?;
        let hidden_dim = hidden.dim(1)?;

        let repeated = hidden
            .unsqueeze(1)?
            .broadcast_as((batch, src_len, hidden_dim))?
            .contiguous()?;
        let energy = self
            .attn
            .forward(&Tensor::cat(&[&repeated, encoder_outputs], 2)?)?
            .tanh()?;
        let scores = self.v.forward(&energy)?.squeeze(2)?;

        Ok(ops::softmax(&scores, 1)?)
    }

    /// Weighted sum of encoder outputs, `[batch, 2 * hidden]`.
    pub fn context(&self, weights: &Tensor, encoder_outputs: &Tensor) -> Result<Tensor> {
        Ok(weights.unsqueeze(1)?.matmul(encoder_outputs)?.squeeze(1)?)
    }
}
