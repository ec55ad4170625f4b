//! Health check endpoint

use axum::{extract::State, routing::get, Json, Router};
use chrono::Utc;
use serde::Serialize;

use crate::AppState;

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// "ok", or "degraded" when the image model failed to load
    pub status: String,
    pub module: String,
    pub version: String,
    pub uptime_seconds: u64,
    /// "loaded" or "unavailable"
    pub image_model: String,
}

/// GET /health
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let uptime = Utc::now().signed_duration_since(state.startup_time);
    let available = state.models.is_image_model_available();

    Json(HealthResponse {
        status: if available { "ok" } else { "degraded" }.to_string(),
        module: "bqzim-api".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: uptime.num_seconds().max(0) as u64,
        image_model: if available { "loaded" } else { "unavailable" }.to_string(),
    })
}

/// Build health check routes
pub fn health_routes() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}
