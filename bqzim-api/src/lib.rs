//! bqzim-api library - house cost estimation service
//!
//! Endpoints:
//! - `POST /api/signup/`, `POST /api/login/`: user accounts
//! - `POST /api/predict/`: house attributes and cost from an uploaded image
//! - `POST /api/boq/`: bill of quantities for a prediction
//! - `GET /health`

pub mod api;
pub mod boq;
pub mod error;
pub mod model;

pub use crate::error::{ApiError, ApiResult};

use axum::extract::DefaultBodyLimit;
use axum::Router;
use chrono::{DateTime, Utc};
use model::ModelBundle;
use sqlx::SqlitePool;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Default request body limit (covers image uploads)
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// User store
    pub db: SqlitePool,
    /// Prediction artifacts, loaded once and never mutated
    pub models: Arc<ModelBundle>,
    /// Request body limit in bytes
    pub max_upload_bytes: usize,
    /// Service startup timestamp for uptime reporting
    pub startup_time: DateTime<Utc>,
}

impl AppState {
    pub fn new(db: SqlitePool, models: ModelBundle) -> Self {
        Self {
            db,
            models: Arc::new(models),
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            startup_time: Utc::now(),
        }
    }

    pub fn with_max_upload_bytes(mut self, max_upload_bytes: usize) -> Self {
        self.max_upload_bytes = max_upload_bytes;
        self
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    let body_limit = state.max_upload_bytes;

    Router::new()
        .merge(api::account_routes())
        .merge(api::predict_routes())
        .merge(api::boq_routes())
        .merge(api::health_routes())
        .with_state(state)
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        // The browser client is served from its own origin
        .layer(CorsLayer::permissive())
}
