//! Character vocabulary shared by the encoder and decoder of a language model.
//!
//! A vocabulary is two JSON maps written by the training pipeline:
//! `char2idx` (string -> id) and `idx2char` (string-encoded id -> string).
//! Both contain the four control symbols; every other entry is a single
//! character observed in the romanized or native side of the corpus.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fs;
use std::path::Path;

use tracing::debug;

use crate::error::{Error, Result};

pub const PAD_TOKEN: &str = "<pad>";
pub const SOS_TOKEN: &str = "<sos>";
pub const EOS_TOKEN: &str = "<eos>";
pub const UNK_TOKEN: &str = "<unk>";

/// Ids of the control symbols as recorded in the vocabulary maps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpecialTokens {
    pub pad: u32,
    pub sos: u32,
    pub eos: u32,
    pub unk: u32,
}

impl Default for SpecialTokens {
    fn default() -> Self {
        Self {
            pad: 0,
            sos: 1,
            eos: 2,
            unk: 3,
        }
    }
}

#[derive(Debug, Clone)]
pub struct CharVocab {
    char_to_id: HashMap<String, u32>,
    id_to_char: HashMap<u32, String>,
    specials: SpecialTokens,
}

impl CharVocab {
    /// Load and cross-check the two vocabulary maps.
    pub fn load(char2idx_path: &Path, idx2char_path: &Path) -> Result<Self> {
        let char_to_id: HashMap<String, u32> = read_json(char2idx_path)?;
        let raw_id_to_char: HashMap<String, String> = read_json(idx2char_path)?;

        let mut id_to_char = HashMap::with_capacity(raw_id_to_char.len());
        for (key, value) in raw_id_to_char {
            let id = key.trim().parse::<u32>().map_err(|_| {
                Error::VocabularyError(format!(
                    "Non-integer key '{}' in {}",
                    key,
                    idx2char_path.display()
                ))
            })?;
            id_to_char.insert(id, value);
        }

        let vocab = Self::from_maps(char_to_id, id_to_char)?;
        debug!(
            "Loaded vocabulary with {} entries from {:?}",
            vocab.len(),
            char2idx_path
        );
        Ok(vocab)
    }

    /// Build a vocabulary from in-memory maps, enforcing that they are exact
    /// inverses and that every control symbol is present.
    pub fn from_maps(
        char_to_id: HashMap<String, u32>,
        id_to_char: HashMap<u32, String>,
    ) -> Result<Self> {
        let lookup = |token: &str| {
            char_to_id.get(token).copied().ok_or_else(|| {
                Error::VocabularyError(format!("Missing control symbol {token}"))
            })
        };
        let specials = SpecialTokens {
            pad: lookup(PAD_TOKEN)?,
            sos: lookup(SOS_TOKEN)?,
            eos: lookup(EOS_TOKEN)?,
            unk: lookup(UNK_TOKEN)?,
        };

        if char_to_id.len() != id_to_char.len() {
            return Err(Error::VocabularyError(format!(
                "char2idx has {} entries but idx2char has {}",
                char_to_id.len(),
                id_to_char.len()
            )));
        }

        let size = char_to_id.len();
        for (token, id) in &char_to_id {
            if *id as usize >= size {
                return Err(Error::VocabularyError(format!(
                    "Id {id} for '{token}' is outside 0..{size}"
                )));
            }
            match id_to_char.get(id) {
                Some(inverse) if inverse == token => {}
                Some(inverse) => {
                    return Err(Error::VocabularyError(format!(
                        "Id {id} maps to '{token}' but back to '{inverse}'"
                    )));
                }
                None => {
                    return Err(Error::VocabularyError(format!(
                        "Id {id} for '{token}' is missing from idx2char"
                    )));
                }
            }
        }

        Ok(Self {
            char_to_id,
            id_to_char,
            specials,
        })
    }

    /// Build a vocabulary the way the training pipeline does: control
    /// symbols first, then the sorted union of characters from both sides.
    pub fn from_corpus<'a, I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let mut chars = BTreeSet::new();
        for (src, trg) in pairs {
            chars.extend(src.chars());
            chars.extend(trg.chars());
        }

        let specials = SpecialTokens::default();
        let mut char_to_id = HashMap::with_capacity(chars.len() + 4);
        char_to_id.insert(PAD_TOKEN.to_string(), specials.pad);
        char_to_id.insert(SOS_TOKEN.to_string(), specials.sos);
        char_to_id.insert(EOS_TOKEN.to_string(), specials.eos);
        char_to_id.insert(UNK_TOKEN.to_string(), specials.unk);
        for ch in chars {
            let next = char_to_id.len() as u32;
            char_to_id.entry(ch.to_string()).or_insert(next);
        }

        let id_to_char = char_to_id
            .iter()
            .map(|(token, id)| (*id, token.clone()))
            .collect();

        Self {
            char_to_id,
            id_to_char,
            specials,
        }
    }

    /// Write both maps as UTF-8 JSON.
    pub fn save(&self, char2idx_path: &Path, idx2char_path: &Path) -> Result<()> {
        let forward: BTreeMap<&str, u32> = self
            .char_to_id
            .iter()
            .map(|(token, id)| (token.as_str(), *id))
            .collect();
        let inverse: BTreeMap<u32, &str> = self
            .id_to_char
            .iter()
            .map(|(id, token)| (*id, token.as_str()))
            .collect();

        fs::write(char2idx_path, serde_json::to_string(&forward)?)?;
        fs::write(idx2char_path, serde_json::to_string(&inverse)?)?;
        Ok(())
    }

    /// `[<sos>] + ids(text) + [<eos>]`, truncated so the markers always fit,
    /// then right-padded with `<pad>` to exactly `max_len`.
    pub fn encode(&self, text: &str, max_len: usize) -> Vec<u32> {
        let mut ids = Vec::with_capacity(max_len);
        if max_len == 0 {
            return ids;
        }

        ids.push(self.specials.sos);
        let budget = max_len.saturating_sub(2);
        let mut buf = [0u8; 4];
        for ch in text.chars().take(budget) {
            let key: &str = ch.encode_utf8(&mut buf);
            ids.push(
                self.char_to_id
                    .get(key)
                    .copied()
                    .unwrap_or(self.specials.unk),
            );
        }
        if ids.len() < max_len {
            ids.push(self.specials.eos);
        }
        ids.resize(max_len, self.specials.pad);
        ids
    }

    /// Map ids back to text. `<pad>` and `<sos>` are skipped, decoding stops
    /// at the first `<eos>`, and ids missing from the id map are dropped.
    pub fn decode(&self, ids: &[u32]) -> String {
        let mut out = String::new();
        for &id in ids {
            if id == self.specials.pad || id == self.specials.sos {
                continue;
            }
            if id == self.specials.eos {
                break;
            }
            if let Some(token) = self.id_to_char.get(&id) {
                out.push_str(token);
            }
        }
        out
    }

    pub fn id_of(&self, ch: char) -> Option<u32> {
        let mut buf = [0u8; 4];
        let key: &str = ch.encode_utf8(&mut buf);
        self.char_to_id.get(key).copied()
    }

    pub fn specials(&self) -> &SpecialTokens {
        &self.specials
    }

    pub fn len(&self) -> usize {
        self.char_to_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.char_to_id.is_empty()
    }
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    let raw = fs::read_to_string(path).map_err(|e| {
        Error::VocabularyError(format!("Failed to read {}: {}", path.display(), e))
    })?;
    serde_json::from_str(&raw)
        .map_err(|e| Error::VocabularyError(format!("Invalid JSON in {}: {}", path.display(), e)))
}
