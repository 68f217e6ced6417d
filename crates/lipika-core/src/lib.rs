//! Lipika Core - romanized to native-script transliteration engine
//!
//! This crate loads per-language character-level sequence-to-sequence models
//! (bidirectional LSTM encoder, additive attention, LSTM decoder) with candle
//! and serves phrase transliteration on top of them.
//!
//! # Architecture
//!
//! - [`vocab`]: character vocabulary and the fixed-length id codec
//! - [`models`]: the network, loaded language models and the model registry
//! - [`runtime`]: the phrase orchestrator with its retention policy and metrics
//!
//! # Example
//!
//! ```ignore
//! use lipika_core::{EngineConfig, Mode, TransliterationRequest, TransliterationService};
//!
//! let service = TransliterationService::from_config(&EngineConfig::from_env())?;
//! let request = TransliterationRequest::new("naa peru Rahul", "te").with_mode(Mode::Mix);
//! let response = service.transliterate(&request).await;
//! println!("{} ({})", response.primary, response.provider);
//! ```

pub mod catalog;
pub mod config;
pub mod error;
pub mod models;
pub mod runtime;
pub mod vocab;

pub use catalog::{known_languages, LanguageCode, LanguageInfo};
pub use config::{EngineConfig, EvictionPolicy, ServerConfig};
pub use error::{Error, Result};
pub use models::{
    DeviceProfile, DeviceSelector, ModelRegistry, RegistryStats, TransliterationModel,
    TransliterationOutcome,
};
pub use runtime::{
    MetricsCollector, MetricsSnapshot, Mode, Provider, TokenProvenance, TokenResult,
    TransliterationCandidate, TransliterationRequest, TransliterationResponse,
    TransliterationService,
};
pub use vocab::CharVocab;
