//! A loaded per-language transliteration model: vocabulary plus network.

use std::time::Instant;

use tracing::{debug, info};

use crate::catalog::LanguageCode;
use crate::error::{Error, Result};
use crate::models::architectures::seq2seq::Seq2SeqModel;
use crate::models::artifacts::LanguageArtifacts;
use crate::models::shared::device::DeviceProfile;
use crate::models::shared::weights::open_var_builder;
use crate::vocab::CharVocab;

pub struct TransliterationModel {
    language: LanguageCode,
    vocab: CharVocab,
    network: Seq2SeqModel,
    device: DeviceProfile,
    max_len: usize,
}

impl TransliterationModel {
    /// Read the vocabulary maps and weights for one language. Blocking; the
    /// registry calls this from `spawn_blocking`.
    pub fn load(
        language: LanguageCode,
        artifacts: &LanguageArtifacts,
        device: DeviceProfile,
        max_len: usize,
    ) -> Result<Self> {
        if max_len < 2 {
            return Err(Error::InvalidInput(format!(
                "max_len must be at least 2, got {max_len}"
            )));
        }

        let started = Instant::now();
        let vocab = CharVocab::load(&artifacts.char2idx_path, &artifacts.idx2char_path)?;
        let vb = open_var_builder(&artifacts.weights_path, device.dtype(), &device.device)?;
        let network = Seq2SeqModel::load(&vb, vocab.len())
            .map_err(|e| e.during_load(&format!("{language} weights")))?;

        info!(
            "Loaded {} transliteration model ({} symbols, hidden {}) on {} in {:.2?}",
            language,
            vocab.len(),
            network.config().hidden_dim,
            device.kind.as_str(),
            started.elapsed()
        );

        Ok(Self {
            language,
            vocab,
            network,
            device,
            max_len,
        })
    }

    /// Greedy-decode one romanized word into native script. Output may be
    /// empty when the first predicted symbol is `<eos>`.
    pub fn transliterate(&self, word: &str) -> Result<String> {
        let src = self.vocab.encode(word, self.max_len);
        let ids = self
            .network
            .generate(&src, self.vocab.specials(), self.max_len)
            .map_err(|e| match e {
                Error::Candle(inner) => Error::InferenceError(format!(
                    "{} model failed on '{word}': {inner}",
                    self.language
                )),
                other => other,
            })?;
        let output = self.vocab.decode(&ids);
        debug!("{}: '{}' -> '{}'", self.language, word, output);
        Ok(output)
    }

    pub fn language(&self) -> &LanguageCode {
        &self.language
    }

    pub fn vocab(&self) -> &CharVocab {
        &self.vocab
    }

    pub fn device(&self) -> &DeviceProfile {
        &self.device
    }

    pub fn max_len(&self) -> usize {
        self.max_len
    }
}
