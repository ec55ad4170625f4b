//! Bill of quantities endpoint

use crate::boq::{self, BillOfQuantities, BoqInput};
use crate::{ApiError, ApiResult, AppState};
use axum::{extract::rejection::JsonRejection, routing::post, Json, Router};

/// POST /api/boq/
///
/// **Request:** a prediction response `{"square_feet", "beds", "baths", "garages", "estimated_cost"}`
/// **Response:** material sections, materials total and labour cost
///
/// **Errors:**
/// - 400: malformed body, or negative/non-finite values
pub async fn bill_of_quantities(
    payload: Result<Json<BoqInput>, JsonRejection>,
) -> ApiResult<Json<BillOfQuantities>> {
    let Json(input) = payload.map_err(|e| ApiError::BadRequest(e.body_text()))?;

    let attributes = &input.attributes;
    let counts = [
        ("square_feet", attributes.square_feet),
        ("beds", attributes.beds),
        ("baths", attributes.baths),
        ("garages", attributes.garages),
    ];
    for (field, value) in counts {
        if value < 0 {
            return Err(ApiError::field(field, "Ensure this value is greater than or equal to 0."));
        }
    }
    if !input.estimated_cost.is_finite() || input.estimated_cost < 0.0 {
        return Err(ApiError::field(
            "estimated_cost",
            "Ensure this value is greater than or equal to 0.",
        ));
    }

    Ok(Json(boq::calculate(&input)))
}

/// Build bill of quantities routes
pub fn boq_routes() -> Router<AppState> {
    Router::new().route("/api/boq/", post(bill_of_quantities))
}
