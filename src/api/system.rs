//! System endpoints: health check.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use chrono::Utc;
use serde::Serialize;

use crate::app_state::AppState;
use crate::error::PokerError;

/// Health check response.
#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    timestamp: String,
    version: &'static str,
    rooms: usize,
    connections: usize,
}

/// `GET /health`: service health status with engine counters.
///
/// # Errors
///
/// Returns [`PokerError::EngineUnavailable`] (503) if the session engine
/// has stopped.
pub async fn health_handler(
    State(state): State<AppState>,
) -> Result<impl IntoResponse, PokerError> {
    let stats = state.engine.stats().await?;
    Ok((
        StatusCode::OK,
        Json(HealthResponse {
            status: "healthy",
            timestamp: Utc::now().to_rfc3339(),
            version: env!("CARGO_PKG_VERSION"),
            rooms: stats.rooms,
            connections: stats.connections,
        }),
    ))
}

/// System routes mounted at the root level.
pub fn routes() -> Router<AppState> {
    Router::new().route("/health", get(health_handler))
}
