//! Synthetic checkpoints for tests.
//!
//! All recurrent and attention weights are zero, so hidden states and
//! attention contexts stay zero and the logits depend only on the decoder
//! input embedding and the output bias. That makes the greedy output fully
//! determined by the [`Behavior`] chosen here.

use std::collections::HashMap;
use std::path::Path;

use candle_core::{DType, Device, Tensor};

use crate::models::artifacts::LanguageArtifacts;
use crate::vocab::CharVocab;

pub const EMBEDDING_DIM: usize = 8;
pub const HIDDEN_DIM: usize = 3;

pub enum Behavior {
    /// Emit these (distinct) characters in order, then `<eos>`.
    Chain(Vec<char>),
    /// Emit this character at every step, never `<eos>`.
    Repeat(char),
}

pub fn sample_vocab() -> CharVocab {
    CharVocab::from_corpus([
        ("ghar", "ఘర్"),
        ("hyderabad", "హైదరాబాద్"),
        ("rahul", "రాహుల్"),
    ])
}

pub fn weight_tensors(vocab: &CharVocab, behavior: &Behavior, rows: usize) -> HashMap<String, Tensor> {
    let device = Device::Cpu;
    let e = EMBEDDING_DIM;
    let h = HIDDEN_DIM;
    let zeros = |shape: &[usize]| Tensor::zeros(shape, DType::F32, &device).unwrap();

    let mut tensors = HashMap::new();
    tensors.insert("encoder.embedding.weight".to_string(), zeros(&[rows, e]));
    for suffix in ["l0", "l0_reverse"] {
        insert_lstm(&mut tensors, "encoder.rnn", suffix, e, h, &zeros);
    }
    tensors.insert("decoder.attention.attn.weight".to_string(), zeros(&[h, h * 3]));
    tensors.insert("decoder.attention.attn.bias".to_string(), zeros(&[h]));
    tensors.insert("decoder.attention.v.weight".to_string(), zeros(&[1, h]));
    insert_lstm(&mut tensors, "decoder.rnn", "l0", e + h * 2, h, &zeros);

    let specials = *vocab.specials();
    let projection_in = h * 3 + e;
    let mut embedding = vec![0f32; rows * e];
    let mut fc_weight = vec![0f32; rows * projection_in];
    let mut fc_bias = vec![0f32; rows];

    match behavior {
        Behavior::Chain(chars) => {
            assert!(chars.len() < e, "chain longer than the fixture embedding");
            let id = |ch: char| vocab.id_of(ch).expect("chain character outside vocabulary") as usize;
            for step in 0..=chars.len() {
                let input = if step == 0 {
                    specials.sos as usize
                } else {
                    id(chars[step - 1])
                };
                let output = chars.get(step).map_or(specials.eos as usize, |&ch| id(ch));
                embedding[input * e + step] = 1.0;
                fc_weight[output * projection_in + h * 3 + step] = 1.0;
            }
        }
        Behavior::Repeat(ch) => {
            let id = vocab.id_of(*ch).expect("repeat character outside vocabulary") as usize;
            fc_bias[id] = 1.0;
        }
    }

    tensors.insert(
        "decoder.embedding.weight".to_string(),
        Tensor::from_vec(embedding, (rows, e), &device).unwrap(),
    );
    tensors.insert(
        "decoder.fc_out.weight".to_string(),
        Tensor::from_vec(fc_weight, (rows, projection_in), &device).unwrap(),
    );
    tensors.insert(
        "decoder.fc_out.bias".to_string(),
        Tensor::from_vec(fc_bias, rows, &device).unwrap(),
    );
    tensors
}

fn insert_lstm(
    tensors: &mut HashMap<String, Tensor>,
    prefix: &str,
    suffix: &str,
    input_dim: usize,
    hidden_dim: usize,
    zeros: &dyn Fn(&[usize]) -> Tensor,
) {
    let gates = hidden_dim * 4;
    tensors.insert(format!("{prefix}.weight_ih_{suffix}"), zeros(&[gates, input_dim]));
    tensors.insert(format!("{prefix}.weight_hh_{suffix}"), zeros(&[gates, hidden_dim]));
    tensors.insert(format!("{prefix}.bias_ih_{suffix}"), zeros(&[gates]));
    tensors.insert(format!("{prefix}.bias_hh_{suffix}"), zeros(&[gates]));
}

/// Write a complete artifact triplet for `lang` into `dir`.
pub fn write_language(dir: &Path, lang: &str, behavior: Behavior) -> CharVocab {
    write_language_with_rows(dir, lang, behavior, 0)
}

/// Write an artifact triplet whose weights were trained on a larger
/// vocabulary than the maps describe.
pub fn write_mismatched_language(dir: &Path, lang: &str) -> CharVocab {
    write_language_with_rows(dir, lang, Behavior::Chain(Vec::new()), 2)
}

fn write_language_with_rows(dir: &Path, lang: &str, behavior: Behavior, extra_rows: usize) -> CharVocab {
    let vocab = sample_vocab();
    let paths = LanguageArtifacts::expected(dir, lang);
    vocab
        .save(&paths.char2idx_path, &paths.idx2char_path)
        .unwrap();
    let tensors = weight_tensors(&vocab, &behavior, vocab.len() + extra_rows);
    candle_core::safetensors::save(&tensors, &paths.weights_path).unwrap();
    vocab
}
