//! Snapsweep HTTP trigger composition root.

#![forbid(unsafe_code)]

mod api_config;
mod api_services;
mod error;
mod handlers;
mod state;

use std::sync::Arc;

use axum::Router;
use axum::routing::get;
use snapsweep_core::AppError;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::api_config::ApiConfig;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<(), AppError> {
    dotenvy::dotenv().ok();
    api_config::init_tracing();

    let config = ApiConfig::load()?;
    let cleanup_service = api_services::build_cleanup_service(&config.cleanup)?;
    let state = AppState {
        cleanup_service: Arc::new(cleanup_service),
    };

    let router = Router::new()
        .route("/api/health", get(handlers::health_handler))
        .route(
            "/api/cleanup/run",
            get(handlers::trigger_cleanup_handler).post(handlers::trigger_cleanup_handler),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    let address = config.socket_address()?;
    let listener = tokio::net::TcpListener::bind(address)
        .await
        .map_err(|error| AppError::Internal(format!("failed to bind {address}: {error}")))?;

    info!(%address, "snapsweep-api started");

    axum::serve(listener, router)
        .await
        .map_err(|error| AppError::Internal(format!("server error: {error}")))?;

    Ok(())
}
