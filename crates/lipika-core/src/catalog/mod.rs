//! Language identifiers and the metadata we know about each target script.
//!
//! Any well-formed code is accepted as a registry key; the table below only
//! adds display names for the scripts the training pipeline covers.

mod language;

pub use language::{known_languages, LanguageCode, LanguageInfo, ParseLanguageCodeError};
