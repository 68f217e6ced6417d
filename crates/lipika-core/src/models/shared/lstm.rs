//! Single-layer LSTM cell in PyTorch's parameter layout.
//!
//! Gates are packed as `[input, forget, cell, output]` along the first
//! dimension of `weight_ih`/`weight_hh`, matching `torch.nn.LSTM`.

use candle_core::{DType, IndexOp, Tensor};
use candle_nn::{ops, VarBuilder};

use crate::error::{Error, Result};
use crate::models::shared::weights::{load_tensor, qualified_name};

/// Recurrent state carried between steps, each `[batch, hidden]`.
#[derive(Debug, Clone)]
pub struct LstmState {
    pub h: Tensor,
    pub c: Tensor,
}

impl LstmState {
    pub fn zeros(batch: usize, hidden_dim: usize, like: &Tensor) -> Result<Self> {
        let zeros = Tensor::zeros((batch, hidden_dim), DType::F32, like.device())?;
        Ok(Self {
            h: zeros.clone(),
            c: zeros,
        })
    }

    /// Element-wise sum of two states (used to merge the two directions of a
    /// bidirectional pass).
    pub fn sum(&self, other: &LstmState) -> Result<Self> {
        Ok(Self {
            h: (&self.h + &other.h)?,
            c: (&self.c + &other.c)?,
        })
    }
}

#[derive(Debug)]
pub struct LstmCell {
    w_ih_t: Tensor,
    w_hh_t: Tensor,
    bias: Tensor,
    hidden_dim: usize,
}

impl LstmCell {
    /// Load `weight_ih_{suffix}`, `weight_hh_{suffix}`, `bias_ih_{suffix}` and
    /// `bias_hh_{suffix}` (e.g. `l0` or `l0_reverse`).
    pub fn load(vb: &VarBuilder, input_dim: usize, hidden_dim: usize, suffix: &str) -> Result<Self> {
        let gates = hidden_dim * 4;
        let w_ih = load_tensor(vb, &[gates, input_dim], &format!("weight_ih_{suffix}"))?;
        let w_hh = load_tensor(vb, &[gates, hidden_dim], &format!("weight_hh_{suffix}"))?;
        let b_ih = load_tensor(vb, &[gates], &format!("bias_ih_{suffix}"))?;
        let b_hh = load_tensor(vb, &[gates], &format!("bias_hh_{suffix}"))?;

        let prepare = || -> Result<(Tensor, Tensor, Tensor)> {
            Ok((
                w_ih.t()?.contiguous()?,
                w_hh.t()?.contiguous()?,
                (&b_ih + &b_hh)?.unsqueeze(0)?,
            ))
        };
        let (w_ih_t, w_hh_t, bias) =
            prepare().map_err(|e| e.during_load(&format!("LSTM {}", qualified_name(vb, suffix))))?;

        Ok(Self {
            w_ih_t,
            w_hh_t,
            bias,
            hidden_dim,
        })
    }

    pub fn hidden_dim(&self) -> usize {
        self.hidden_dim
    }

    /// One step: `x` is `[batch, input_dim]`.
    pub fn step(&self, x: &Tensor, state: &LstmState) -> Result<LstmState> {
        let hd = self.hidden_dim;
        let gates = x
            .matmul(&self.w_ih_t)?
            .add(&state.h.matmul(&self.w_hh_t)?)?
            .broadcast_add(&self.bias)?;

        let i = ops::sigmoid(&gates.i((.., 0..hd))?)?;
        let f = ops::sigmoid(&gates.i((.., hd..(hd * 2)))?)?;
        let g = gates.i((.., (hd * 2)..(hd * 3)))?.tanh()?;
        let o = ops::sigmoid(&gates.i((.., (hd * 3)..))?)?;

        let c = f.mul(&state.c)?.add(&i.mul(&g)?)?;
        let h = o.mul(&c.tanh()?)?;

        Ok(LstmState { h, c })
    }

    /// Run over a whole sequence starting from a zero state. Outputs are
    /// returned in position order regardless of direction; the state is the
    /// one after the last processed position.
    pub fn run(&self, xs: &[Tensor], reverse: bool) -> Result<(Vec<Tensor>, LstmState)> {
        let Some(first) = xs.first() else {
            return Err(Error::InvalidInput(
                "LSTM input sequence is empty".to_string(),
            ));
        };
        let mut state = LstmState::zeros(first.dim(0)?, self.hidden_dim, first)?;
        let mut outputs = Vec::with_capacity(xs.len());

        if reverse {
            for x in xs.iter().rev() {
                state = self.step(x, &state)?;
                outputs.push(state.h.clone());
            }
            outputs.reverse();
        } else {
            for x in xs {
                state = self.step(x, &state)?;
                outputs.push(state.h.clone());
            }
        }

        Ok((outputs, state))
    }
}
