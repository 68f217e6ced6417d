//! Transliteration and language management endpoints

use std::time::Duration;

use axum::{
    extract::{Path, State},
    Json,
};
use lipika_core::{LanguageCode, TransliterationRequest, TransliterationResponse};
use serde::Serialize;
use tracing::{debug, info};

use crate::error::ApiError;
use crate::state::AppState;

/// Transliterate a phrase. Missing or broken models degrade to a `stub`
/// response rather than an error.
pub async fn transliterate(
    State(state): State<AppState>,
    Json(req): Json<TransliterationRequest>,
) -> Result<Json<TransliterationResponse>, ApiError> {
    debug!(
        "Transliteration request: {} chars -> {} ({})",
        req.text.chars().count(),
        req.target_lang,
        req.mode
    );

    let _permit = state.acquire_permit().await?;

    let timeout = Duration::from_secs(state.request_timeout_secs);
    let response = tokio::time::timeout(timeout, state.service.transliterate(&req))
        .await
        .map_err(|_| ApiError::timeout("Request timeout"))?;

    Ok(Json(response))
}

#[derive(Debug, Serialize)]
pub struct LanguageEntry {
    pub code: LanguageCode,
    pub name: Option<&'static str>,
    pub script: Option<&'static str>,
    pub resident: bool,
}

#[derive(Debug, Serialize)]
pub struct LanguagesResponse {
    pub languages: Vec<LanguageEntry>,
    pub resident: Vec<LanguageCode>,
    pub max_len: usize,
}

/// Languages with artifacts on disk, plus which ones are loaded.
pub async fn list_languages(
    State(state): State<AppState>,
) -> Result<Json<LanguagesResponse>, ApiError> {
    let registry = state.service.registry();
    let available = registry.available_languages()?;
    let resident = registry.resident_languages().await;

    let languages = available
        .into_iter()
        .map(|code| {
            let info = code.info();
            LanguageEntry {
                name: info.map(|i| i.name),
                script: info.map(|i| i.script),
                resident: resident.contains(&code),
                code,
            }
        })
        .collect();

    Ok(Json(LanguagesResponse {
        languages,
        resident,
        max_len: registry.max_len(),
    }))
}

#[derive(Debug, Serialize)]
pub struct LanguageActionResponse {
    pub status: &'static str,
    pub message: String,
}

pub async fn load_language(
    State(state): State<AppState>,
    Path(lang): Path<String>,
) -> Result<Json<LanguageActionResponse>, ApiError> {
    let code: LanguageCode = lang.parse()?;
    info!("Loading transliteration model: {}", code);

    state.service.registry().load(&code).await?;

    Ok(Json(LanguageActionResponse {
        status: "loaded",
        message: format!("Model for {code} loaded successfully"),
    }))
}

pub async fn unload_language(
    State(state): State<AppState>,
    Path(lang): Path<String>,
) -> Result<Json<LanguageActionResponse>, ApiError> {
    let code: LanguageCode = lang.parse()?;
    info!("Unloading transliteration model: {}", code);

    let response = if state.service.registry().unload(&code).await {
        LanguageActionResponse {
            status: "unloaded",
            message: format!("Model for {code} unloaded"),
        }
    } else {
        LanguageActionResponse {
            status: "not_loaded",
            message: format!("Model for {code} was not loaded"),
        }
    };
    Ok(Json(response))
}
