//! Health check endpoints.

use axum::{extract::State, http::StatusCode};

use crate::state::AppState;
use crate::store::{Collection, Users};

/// Liveness health check. Does not touch the data directory.
pub async fn health() -> &'static str {
    "ok"
}

/// Readiness health check.
///
/// Returns 503 when the users document cannot be read, which is the first
/// thing every login needs.
pub async fn readiness(State(state): State<AppState>) -> StatusCode {
    match state.store().load(Users::FILE_NAME).await {
        Ok(_) => StatusCode::OK,
        Err(e) => {
            tracing::warn!(error = %e, "Readiness check failed");
            StatusCode::SERVICE_UNAVAILABLE
        }
    }
}
