//! API routes and handlers

mod health;
mod metrics;
mod transliterate;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// Create the main API router
pub fn create_router(state: AppState, cors_enabled: bool) -> Router {
    let api_routes = Router::new()
        .route("/health", get(health::health_check))
        .route("/transliterate", post(transliterate::transliterate))
        .route(
            "/transliterate/languages",
            get(transliterate::list_languages),
        )
        .route(
            "/transliterate/languages/:lang/load",
            post(transliterate::load_language),
        )
        .route(
            "/transliterate/languages/:lang/unload",
            post(transliterate::unload_language),
        )
        .route("/metrics", get(metrics::get_metrics));

    let router = Router::new()
        .nest("/api", api_routes)
        .layer(TraceLayer::new_for_http());

    let router = if cors_enabled {
        router.layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
    } else {
        router
    };

    router.with_state(state)
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::path::Path;
    use std::sync::Arc;

    use lipika_core::{DeviceProfile, ModelRegistry, ServerConfig, TransliterationService};

    use crate::state::AppState;

    pub fn state_for(models_dir: &Path) -> AppState {
        let registry = ModelRegistry::new(models_dir.to_path_buf(), DeviceProfile::cpu());
        let service = TransliterationService::new(Arc::new(registry));
        AppState::new(Arc::new(service), &ServerConfig::default())
    }
}
