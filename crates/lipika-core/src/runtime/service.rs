//! Phrase-level transliteration orchestrator.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::catalog::LanguageCode;
use crate::config::EngineConfig;
use crate::error::Result;
use crate::models::registry::{ModelRegistry, TransliterationOutcome};

use super::metrics::{MetricsCollector, RequestTimer, TokenTally};
use super::policy::should_keep_latin;
use super::types::{
    Mode, Provider, TokenProvenance, TokenResult, TransliterationCandidate,
    TransliterationRequest, TransliterationResponse,
};

/// Splits phrases into tokens, applies the retention policy and routes the
/// rest through the model registry.
pub struct TransliterationService {
    registry: Arc<ModelRegistry>,
    metrics: Arc<MetricsCollector>,
}

impl TransliterationService {
    pub fn new(registry: Arc<ModelRegistry>) -> Self {
        Self {
            registry,
            metrics: Arc::new(MetricsCollector::new()),
        }
    }

    pub fn from_config(config: &EngineConfig) -> Result<Self> {
        let registry = ModelRegistry::from_config(config)?;
        Ok(Self::new(Arc::new(registry)))
    }

    pub fn registry(&self) -> &Arc<ModelRegistry> {
        &self.registry
    }

    pub fn metrics(&self) -> &Arc<MetricsCollector> {
        &self.metrics
    }

    /// Transliterate a phrase. Never fails: tokens whose model is missing or
    /// broken are echoed and the phrase is reported as `stub`.
    pub async fn transliterate(&self, request: &TransliterationRequest) -> TransliterationResponse {
        let text = request.text.trim();
        if text.is_empty() {
            return TransliterationResponse::empty(request);
        }

        let timer = RequestTimer::start(self.metrics.clone());
        let target = match LanguageCode::parse(&request.target_lang) {
            Ok(code) => Some(code),
            Err(e) => {
                warn!("{e}; echoing input");
                None
            }
        };
        // Set once the target language is unavailable or fails to load, so
        // the remaining tokens skip the registry.
        let mut language_down = target.is_none();

        let mut tokens = Vec::new();
        let mut tally = TokenTally::default();
        for token in text.split_whitespace() {
            let result = if request.mode == Mode::Mix && should_keep_latin(token) {
                debug!("Keeping '{token}' in Latin script");
                TokenResult {
                    input: token.to_string(),
                    output: token.to_string(),
                    provenance: TokenProvenance::Kept,
                }
            } else {
                self.resolve_token(token, target.as_ref(), &mut language_down)
                    .await
            };

            match result.provenance {
                TokenProvenance::Kept => tally.retained += 1,
                TokenProvenance::MlLocal => tally.transliterated += 1,
                TokenProvenance::Stub => tally.fallbacks += 1,
            }
            tokens.push(result);
        }

        let primary = tokens
            .iter()
            .map(|token| token.output.as_str())
            .collect::<Vec<_>>()
            .join(" ");
        let provider = if tally.fallbacks > 0 {
            Provider::Stub
        } else {
            Provider::MlLocalWord
        };

        timer.stop(tally).await;

        TransliterationResponse {
            input_text: text.to_string(),
            candidates: vec![TransliterationCandidate {
                text: primary.clone(),
                score: 1.0,
            }],
            primary,
            source_lang: request.source_lang.clone(),
            target_lang: request.target_lang.clone(),
            mode: request.mode,
            provider,
            tokens,
        }
    }

    async fn resolve_token(
        &self,
        token: &str,
        target: Option<&LanguageCode>,
        language_down: &mut bool,
    ) -> TokenResult {
        let stub = || TokenResult {
            input: token.to_string(),
            output: token.to_string(),
            provenance: TokenProvenance::Stub,
        };

        let Some(lang) = target.filter(|_| !*language_down) else {
            return stub();
        };

        match self.registry.transliterate(token, lang).await {
            Ok(TransliterationOutcome::Translated { text, provenance }) => TokenResult {
                input: token.to_string(),
                output: text,
                provenance,
            },
            Ok(TransliterationOutcome::Unavailable) => {
                warn!("No transliteration model for '{lang}'; echoing input");
                *language_down = true;
                stub()
            }
            Err(e) => {
                warn!("Transliteration of '{token}' into {lang} failed: {e}");
                if e.is_load_failure() {
                    *language_down = true;
                }
                stub()
            }
        }
    }
}
