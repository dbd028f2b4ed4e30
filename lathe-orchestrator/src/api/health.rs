//! Health and Stats API Handlers

use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use serde_json::json;

use super::AppState;

/// GET /health
/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}

/// GET /stats
/// Request counters of the SCM provider
pub async fn stats(State(state): State<AppState>) -> impl IntoResponse {
    Json(json!({ "scm": state.scm.stats() }))
}
