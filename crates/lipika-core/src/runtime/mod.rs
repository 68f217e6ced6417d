//! Runtime orchestration layer: phrase requests in, transliterated phrases
//! out.

pub mod metrics;
mod policy;
mod service;
pub mod types;

pub use metrics::{MetricsCollector, MetricsSnapshot, TokenTally};
pub use policy::{should_keep_latin, KEEP_LIST};
pub use service::TransliterationService;
pub use types::{
    Mode, Provider, TokenProvenance, TokenResult, TransliterationCandidate,
    TransliterationRequest, TransliterationResponse,
};
