use axum::{extract::State, Extension, Json};
use pillalo_core::{Listing, PricedListing};
use serde::{Deserialize, Serialize};

use crate::middleware::RequestId;

use super::{ApiError, ApiResponse, AppState};

#[derive(Debug, Deserialize)]
pub(super) struct PreviewRequest {
    pub line: String,
}

#[derive(Debug, Serialize)]
pub(super) struct PreviewData {
    listing: PricedListing,
}

/// Shows how a submitted row would look in the catalog without storing it.
pub(super) async fn preview_listing(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Json(body): Json<PreviewRequest>,
) -> Result<Json<ApiResponse<PreviewData>>, ApiError> {
    let listing = Listing::parse_submission(&body.line)
        .map_err(|e| ApiError::new(req_id.0.clone(), "validation_error", e.to_string()))?;

    let rate = state.rates.get_rate().await;
    let page = pillalo_core::price_listings([&listing], rate);
    let listing = page.items.into_iter().next().ok_or_else(|| {
        ApiError::new(req_id.0.clone(), "internal_error", "listing could not be priced")
    })?;

    Ok(ApiResponse::new(PreviewData { listing }, req_id.0))
}
