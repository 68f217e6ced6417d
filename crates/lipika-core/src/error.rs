//! Error types for the transliteration engine

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Model not found: {0}")]
    ModelNotFound(String),

    #[error("Failed to load model: {0}")]
    ModelLoadError(String),

    #[error("Shape mismatch for {tensor}: expected {expected}, found {found}")]
    ShapeMismatch {
        tensor: String,
        expected: String,
        found: String,
    },

    #[error("Invalid vocabulary: {0}")]
    VocabularyError(String),

    #[error("Inference failed: {0}")]
    InferenceError(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error("Candle error: {0}")]
    Candle(#[from] candle_core::Error),
}

impl Error {
    /// Whether the error was raised while bringing a model into memory, as
    /// opposed to while running it.
    pub fn is_load_failure(&self) -> bool {
        matches!(
            self,
            Error::ModelLoadError(_) | Error::ShapeMismatch { .. } | Error::VocabularyError(_)
        )
    }
    /// Reclassify a tensor error raised while building a model as a load
    /// failure. Other variants pass through unchanged.
    pub fn during_load(self, context: &str) -> Self {
        match self {
            Error::Candle(e) => Error::ModelLoadError(format!("{context}: {e}")),
            other => other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tensor_errors_while_loading_count_as_load_failures() {
        let raw = Error::Candle(candle_core::Error::Msg("transpose failed".to_string()));
        assert!(!raw.is_load_failure());

        let err = raw.during_load("LSTM l0");
        assert!(err.is_load_failure());
        assert!(err.to_string().contains("LSTM l0: transpose failed"));
    }

    #[test]
    fn during_load_keeps_other_variants() {
        let err = Error::InvalidInput("bad".to_string()).during_load("ctx");
        assert!(matches!(err, Error::InvalidInput(_)));
    }
}
