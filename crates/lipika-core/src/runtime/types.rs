//! Request, response and provenance types for phrase transliteration.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Phrase handling mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// Every token goes to the model.
    #[default]
    Native,
    /// Tokens that look like English, numbers or handles stay in Latin script.
    Mix,
}

impl Mode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Mode::Native => "native",
            Mode::Mix => "mix",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Mode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "native" => Ok(Mode::Native),
            "mix" | "mixed" => Ok(Mode::Mix),
            other => Err(Error::InvalidInput(format!(
                "Unknown mode '{other}', expected 'native' or 'mix'"
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransliterationRequest {
    pub text: String,
    /// Echoed back; model selection uses `target_lang` only.
    pub source_lang: String,
    pub target_lang: String,
    #[serde(default)]
    pub mode: Mode,
}

impl TransliterationRequest {
    pub fn new(text: impl Into<String>, target_lang: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            source_lang: "en".to_string(),
            target_lang: target_lang.into(),
            mode: Mode::Native,
        }
    }

    pub fn with_mode(mut self, mode: Mode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_source_lang(mut self, source_lang: impl Into<String>) -> Self {
        self.source_lang = source_lang.into();
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransliterationCandidate {
    pub text: String,
    pub score: f32,
}

/// Phrase-level provenance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Provider {
    /// Nothing to transliterate.
    None,
    /// Every routed token came from a local model.
    MlLocalWord,
    /// At least one token fell back to its input.
    Stub,
}

impl Provider {
    pub fn as_str(&self) -> &'static str {
        match self {
            Provider::None => "none",
            Provider::MlLocalWord => "ml-local-word",
            Provider::Stub => "stub",
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where a single token's output came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TokenProvenance {
    /// Retained as Latin text by the mix-mode heuristic.
    Kept,
    MlLocal,
    /// Model unavailable or failed; the input token is echoed.
    Stub,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenResult {
    pub input: String,
    pub output: String,
    pub provenance: TokenProvenance,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransliterationResponse {
    pub input_text: String,
    pub primary: String,
    pub candidates: Vec<TransliterationCandidate>,
    pub source_lang: String,
    pub target_lang: String,
    pub mode: Mode,
    pub provider: Provider,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tokens: Vec<TokenResult>,
}

impl TransliterationResponse {
    pub(crate) fn empty(request: &TransliterationRequest) -> Self {
        Self {
            input_text: String::new(),
            primary: String::new(),
            candidates: Vec::new(),
            source_lang: request.source_lang.clone(),
            target_lang: request.target_lang.clone(),
            mode: request.mode,
            provider: Provider::None,
            tokens: Vec::new(),
        }
    }
}
