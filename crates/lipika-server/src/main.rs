//! Lipika Server - HTTP API for romanized to native-script transliteration

use std::sync::Arc;

use tokio::signal;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod api;
mod error;
mod state;

use lipika_core::{EngineConfig, ServerConfig, TransliterationService};
use state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "lipika_server=debug,lipika_core=debug,tower_http=debug".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Lipika transliteration server");

    let engine_config = match std::env::var("LIPIKA_CONFIG") {
        Ok(path) if !path.trim().is_empty() => EngineConfig::from_file(std::path::Path::new(path.trim()))?,
        _ => EngineConfig::from_env(),
    };
    let server_config = ServerConfig::from_env();
    info!("Models directory: {:?}", engine_config.models_dir);

    let service = TransliterationService::from_config(&engine_config)?;
    match service.registry().available_languages() {
        Ok(langs) if langs.is_empty() => info!("No language artifacts found yet"),
        Ok(langs) => info!(
            "Languages on disk: {}",
            langs
                .iter()
                .map(|code| code.as_str())
                .collect::<Vec<_>>()
                .join(", ")
        ),
        Err(e) => info!("Could not scan models directory: {e}"),
    }

    let state = AppState::new(Arc::new(service), &server_config);
    let app = api::create_router(state.clone(), server_config.cors_enabled);

    let addr = server_config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Server listening on http://{}", addr);

    let server = axum::serve(listener, app).with_graceful_shutdown(shutdown_signal(state));

    info!("Server ready. Press Ctrl+C to stop.");
    server.await?;

    Ok(())
}

/// Wait for Ctrl+C or SIGTERM.
async fn shutdown_signal(state: AppState) {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down...");
        },
        _ = terminate => {
            info!("Received SIGTERM, shutting down...");
        },
    }

    let stats = state.service.registry().stats().await;
    info!(
        "Served with {} model loads, {} load failures, {} evictions",
        stats.loads, stats.load_failures, stats.evictions
    );
}
