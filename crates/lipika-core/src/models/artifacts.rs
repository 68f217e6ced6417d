//! On-disk layout of per-language model artifacts.
//!
//! Each language contributes three files to the models directory:
//! `{lang}_model.safetensors` (or `{lang}_model.pt`), `{lang}_char2idx.json`
//! and `{lang}_idx2char.json`.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::catalog::LanguageCode;
use crate::error::{Error, Result};

const WEIGHT_EXTENSIONS: [&str; 2] = ["safetensors", "pt"];
const MODEL_SUFFIX: &str = "_model";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LanguageArtifacts {
    pub weights_path: PathBuf,
    pub char2idx_path: PathBuf,
    pub idx2char_path: PathBuf,
}

impl LanguageArtifacts {
    /// Paths the artifacts would have, preferring safetensors weights.
    /// Nothing is checked on disk.
    pub fn expected(models_dir: &Path, lang: &str) -> Self {
        Self {
            weights_path: models_dir.join(format!("{lang}{MODEL_SUFFIX}.{}", WEIGHT_EXTENSIONS[0])),
            char2idx_path: models_dir.join(format!("{lang}_char2idx.json")),
            idx2char_path: models_dir.join(format!("{lang}_idx2char.json")),
        }
    }

    /// Find a complete triplet for `lang`. Returns `None` when any of the
    /// three files is missing.
    pub fn locate(models_dir: &Path, lang: &LanguageCode) -> Option<Self> {
        let weights_path = WEIGHT_EXTENSIONS
            .iter()
            .map(|ext| models_dir.join(format!("{lang}{MODEL_SUFFIX}.{ext}")))
            .find(|path| path.is_file())?;

        let expected = Self::expected(models_dir, lang.as_str());
        if !(expected.char2idx_path.is_file() && expected.idx2char_path.is_file()) {
            debug!("Weights for {lang} present but vocabulary maps are missing");
            return None;
        }

        Some(Self {
            weights_path,
            ..expected
        })
    }

    pub fn ensure(models_dir: &Path, lang: &LanguageCode) -> Result<Self> {
        Self::locate(models_dir, lang).ok_or_else(|| {
            Error::ModelNotFound(format!(
                "No complete artifacts for '{lang}' in {}",
                models_dir.display()
            ))
        })
    }
}

/// Languages with a complete artifact triplet in `models_dir`, sorted.
/// A missing directory yields an empty list.
pub fn scan_languages(models_dir: &Path) -> Result<Vec<LanguageCode>> {
    let entries = match fs::read_dir(models_dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e.into()),
    };

    let mut languages = Vec::new();
    for entry in entries {
        let entry = entry?;
        let name = entry.file_name();
        let Some(name) = name.to_str() else {
            continue;
        };
        let Some(prefix) = WEIGHT_EXTENSIONS.iter().find_map(|ext| {
            name.strip_suffix(&format!("{MODEL_SUFFIX}.{ext}"))
                .map(str::to_owned)
        }) else {
            continue;
        };
        let Ok(code) = LanguageCode::parse(&prefix) else {
            continue;
        };
        if LanguageArtifacts::locate(models_dir, &code).is_some() {
            languages.push(code);
        }
    }

    languages.sort();
    languages.dedup();
    Ok(languages)
}
