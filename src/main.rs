//! FarmHub Realtime Server
//!
//! Main entry point that wires the crates together and starts the
//! WebSocket endpoint.

use std::sync::Arc;

use axum::Router;
use axum::routing::get;
use tracing;
use tracing_subscriber::{EnvFilter, fmt};

use farmhub_auth::JwtDecoder;
use farmhub_core::config::AppConfig;
use farmhub_core::error::AppError;
use farmhub_realtime::RealtimeEngine;

#[tokio::main]
async fn main() {
    let env = std::env::var("FARMHUB_ENV").unwrap_or_else(|_| "development".to_string());

    let config = match AppConfig::load(&env) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    init_logging(&config);

    if let Err(e) = run(config).await {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}

/// Initialize tracing/logging
fn init_logging(config: &AppConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    match config.logging.format.as_str() {
        "json" => {
            fmt()
                .json()
                .with_env_filter(filter)
                .with_target(true)
                .init();
        }
        _ => {
            fmt().pretty().with_env_filter(filter).with_target(true).init();
        }
    }
}

/// Main server run function
async fn run(config: AppConfig) -> Result<(), AppError> {
    tracing::info!(
        "Starting FarmHub realtime server v{}",
        env!("CARGO_PKG_VERSION")
    );

    let decoder = Arc::new(JwtDecoder::new(&config.auth));
    let engine = Arc::new(RealtimeEngine::new(&config.realtime, decoder));

    let app = Router::new()
        .route("/api/health", get(health))
        .merge(engine.router());

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| AppError::internal(format!("Failed to bind {}: {}", addr, e)))?;

    tracing::info!("FarmHub realtime server listening on {}", addr);

    let shutdown_engine = engine.clone();
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            shutdown_signal().await;
            tracing::info!("Shutdown signal received, starting graceful shutdown...");
            shutdown_engine.shutdown();
        })
        .await
        .map_err(|e| AppError::internal(format!("Server error: {}", e)))?;

    tracing::info!("FarmHub realtime server shut down gracefully");
    Ok(())
}

/// Liveness endpoint.
async fn health() -> axum::Json<serde_json::Value> {
    axum::Json(serde_json::json!({ "status": "ok" }))
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
