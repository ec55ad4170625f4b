//! House prediction endpoint
//!
//! `POST /api/predict/` with a multipart `image` field. Every pipeline
//! failure is logged with its stage and answered with one generic message.

use crate::model::Prediction;
use crate::{ApiError, ApiResult, AppState};
use axum::{
    body::Bytes,
    extract::{
        multipart::{MultipartError, MultipartRejection},
        Multipart, State,
    },
    http::StatusCode,
    routing::post,
    Json, Router,
};
use std::sync::Arc;
use tracing::{debug, error, info};

/// Multipart field carrying the upload
pub const IMAGE_FIELD: &str = "image";

pub const MODEL_NOT_LOADED: &str = "Model could not be loaded.";
pub const NO_IMAGE: &str = "No image provided.";
pub const PREDICTION_FAILED: &str =
    "Error during prediction. Please check the input image and try again.";

/// POST /api/predict/
///
/// **Response:** `{"square_feet", "beds", "baths", "garages", "estimated_cost"}`
///
/// **Errors:**
/// - 500 `Model could not be loaded.`: image model unavailable since startup
/// - 400 `No image provided.`: no `image` field (or no multipart body at all)
/// - 413: upload larger than the configured limit
/// - 500 generic message: decode, inference or transform failure
pub async fn predict_house_details(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> ApiResult<Json<Prediction>> {
    if !state.models.is_image_model_available() {
        error!("Prediction requested but image model is not loaded");
        return Err(ApiError::Internal(MODEL_NOT_LOADED.to_string()));
    }

    let multipart = multipart.map_err(|e| {
        debug!("Predict request is not multipart: {}", e);
        ApiError::BadRequest(NO_IMAGE.to_string())
    })?;

    let image_bytes = read_image_field(multipart)
        .await?
        .ok_or_else(|| ApiError::BadRequest(NO_IMAGE.to_string()))?;
    debug!("Received {} byte image", image_bytes.len());

    let models = Arc::clone(&state.models);
    let outcome = tokio::task::spawn_blocking(move || models.predict(&image_bytes)).await;

    match outcome {
        Ok(Ok(prediction)) => {
            info!(
                "Prediction: {} sq ft, {} beds, {} baths, {} garages, cost {:.2}",
                prediction.attributes.square_feet,
                prediction.attributes.beds,
                prediction.attributes.baths,
                prediction.attributes.garages,
                prediction.estimated_cost
            );
            Ok(Json(prediction))
        }
        Ok(Err(e)) => {
            error!(stage = e.stage(), "Error during prediction: {}", e);
            Err(ApiError::Internal(PREDICTION_FAILED.to_string()))
        }
        Err(e) => {
            error!("Prediction task failed: {}", e);
            Err(ApiError::Internal(PREDICTION_FAILED.to_string()))
        }
    }
}

/// Return the bytes of the first `image` file upload, skipping any others
async fn read_image_field(mut multipart: Multipart) -> ApiResult<Option<Bytes>> {
    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => return Ok(None),
            Err(e) => return Err(multipart_error(e)),
        };

        // Only file parts count; a plain form value named "image" is ignored
        if field.name() != Some(IMAGE_FIELD) || field.file_name().is_none() {
            continue;
        }

        return field.bytes().await.map(Some).map_err(multipart_error);
    }
}

/// A truncated or malformed multipart stream counts as no image
fn multipart_error(e: MultipartError) -> ApiError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        return ApiError::PayloadTooLarge(e.body_text());
    }
    debug!("Unreadable multipart body: {}", e);
    ApiError::BadRequest(NO_IMAGE.to_string())
}

/// Build prediction routes
pub fn predict_routes() -> Router<AppState> {
    Router::new().route("/api/predict/", post(predict_house_details))
}
