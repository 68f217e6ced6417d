use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Validated, lowercase language code used as registry key and artifact
/// file prefix (`te`, `hi`, `ta`, ...).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct LanguageCode(String);

impl LanguageCode {
    pub const MIN_LEN: usize = 2;
    pub const MAX_LEN: usize = 8;

    pub fn parse(raw: &str) -> Result<Self, ParseLanguageCodeError> {
        let trimmed = raw.trim();
        let well_formed = (Self::MIN_LEN..=Self::MAX_LEN).contains(&trimmed.len())
            && trimmed
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
            && trimmed.starts_with(|c: char| c.is_ascii_alphabetic());
        if !well_formed {
            return Err(ParseLanguageCodeError::new(raw));
        }
        Ok(Self(trimmed.to_ascii_lowercase()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn info(&self) -> Option<&'static LanguageInfo> {
        known_languages().iter().find(|info| info.code == self.0)
    }
}

impl fmt::Display for LanguageCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for LanguageCode {
    type Err = ParseLanguageCodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for LanguageCode {
    type Error = ParseLanguageCodeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<LanguageCode> for String {
    fn from(code: LanguageCode) -> Self {
        code.0
    }
}

impl AsRef<str> for LanguageCode {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[derive(Debug, Clone)]
pub struct ParseLanguageCodeError {
    input: String,
}

impl ParseLanguageCodeError {
    fn new(input: impl Into<String>) -> Self {
        Self {
            input: input.into(),
        }
    }
}

impl fmt::Display for ParseLanguageCodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let shown = if self.input.trim().is_empty() {
            "<empty>"
        } else {
            self.input.as_str()
        };
        write!(f, "Invalid language code: {shown}")
    }
}

impl std::error::Error for ParseLanguageCodeError {}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct LanguageInfo {
    pub code: &'static str,
    pub name: &'static str,
    pub script: &'static str,
}

pub fn known_languages() -> &'static [LanguageInfo] {
    const LANGUAGES: &[LanguageInfo] = &[
        LanguageInfo { code: "hi", name: "Hindi", script: "devanagari" },
        LanguageInfo { code: "bn", name: "Bengali", script: "bengali" },
        LanguageInfo { code: "pa", name: "Punjabi", script: "gurmukhi" },
        LanguageInfo { code: "gu", name: "Gujarati", script: "gujarati" },
        LanguageInfo { code: "ta", name: "Tamil", script: "tamil" },
        LanguageInfo { code: "te", name: "Telugu", script: "telugu" },
        LanguageInfo { code: "kn", name: "Kannada", script: "kannada" },
        LanguageInfo { code: "ml", name: "Malayalam", script: "malayalam" },
    ];
    LANGUAGES
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_case_and_whitespace() {
        let code = LanguageCode::parse(" TE ").unwrap();
        assert_eq!(code.as_str(), "te");
        assert_eq!(code.info().unwrap().script, "telugu");
    }

    #[test]
    fn accepts_unknown_but_well_formed_codes() {
        let code: LanguageCode = "xx".parse().unwrap();
        assert!(code.info().is_none());
    }

    #[test]
    fn rejects_path_like_codes() {
        for bad in ["", "t", "../te", "te/x", "hi.pt", "_x", "waytoolongcode"] {
            assert!(LanguageCode::parse(bad).is_err(), "{bad} should be rejected");
        }
    }

    #[test]
    fn serde_goes_through_validation() {
        let code: LanguageCode = serde_json::from_str("\"Hi\"").unwrap();
        assert_eq!(code.as_str(), "hi");
        assert!(serde_json::from_str::<LanguageCode>("\"../etc\"").is_err());
        assert_eq!(serde_json::to_string(&code).unwrap(), "\"hi\"");
    }
}
