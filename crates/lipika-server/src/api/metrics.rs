//! Service metrics endpoint

use axum::{extract::State, Json};
use lipika_core::{MetricsSnapshot, RegistryStats};
use serde::Serialize;

use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct MetricsResponse {
    pub requests: MetricsSnapshot,
    pub registry: RegistryStats,
}

pub async fn get_metrics(State(state): State<AppState>) -> Json<MetricsResponse> {
    Json(MetricsResponse {
        requests: state.service.metrics().snapshot().await,
        registry: state.service.registry().stats().await,
    })
}
