use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use serde::Serialize;
use tracing::info;

use crate::error::ApiResult;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}

/// Anonymous trigger endpoint. Accepts GET and POST with no parameters and
/// returns no body; the run outcome is visible in the logs and the report
/// email.
pub async fn trigger_cleanup_handler(State(state): State<AppState>) -> ApiResult<StatusCode> {
    let outcome = state.cleanup_service.run().await?;

    info!(
        run_id = %outcome.run_id,
        deleted = outcome.deleted.len(),
        failed_deletions = outcome.failed_deletions,
        "HTTP-triggered cleanup run finished"
    );

    Ok(StatusCode::NO_CONTENT)
}
