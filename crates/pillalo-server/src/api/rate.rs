use axum::{extract::State, Extension, Json};
use pillalo_core::pricing::format_bolivares;
use pillalo_scraper::RateQuote;
use serde::Serialize;

use crate::middleware::RequestId;

use super::{ApiResponse, AppState};

#[derive(Debug, Serialize)]
pub(super) struct RateData {
    #[serde(flatten)]
    quote: RateQuote,
    display: String,
}

pub(super) async fn get_rate(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> Json<ApiResponse<RateData>> {
    let quote = state.rates.quote().await;
    ApiResponse::new(
        RateData {
            display: format!("1 USD = {}", format_bolivares(quote.rate)),
            quote,
        },
        req_id.0,
    )
}
