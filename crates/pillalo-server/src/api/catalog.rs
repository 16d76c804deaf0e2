use axum::{
    extract::{Query, State},
    Extension, Json,
};
use pillalo_core::{CatalogReport, EventKind, PricedListing};
use pillalo_scraper::RateQuote;
use serde::{Deserialize, Serialize};

use crate::middleware::RequestId;

use super::{map_catalog_error, normalize_limit, ApiError, ApiResponse, AppState};

#[derive(Debug, Deserialize)]
pub(super) struct CatalogQuery {
    pub q: Option<String>,
    pub limit: Option<usize>,
}

#[derive(Debug, Serialize)]
pub(super) struct CatalogResults {
    query: String,
    rate: RateQuote,
    total_matches: usize,
    items: Vec<PricedListing>,
    report: CatalogReport,
}

pub(super) async fn search_catalog(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Query(query): Query<CatalogQuery>,
) -> Result<Json<ApiResponse<CatalogResults>>, ApiError> {
    let term = query.q.as_deref().map(str::trim).unwrap_or_default().to_owned();

    let (listings, rate) = tokio::join!(state.catalog.listings(), state.rates.quote());
    let listings = listings.map_err(|e| map_catalog_error(req_id.0.clone(), &e))?;

    let mut page = pillalo_core::search_priced(&listings, &term, rate.rate);
    let total_matches = page.items.len();
    page.items.truncate(normalize_limit(query.limit));

    if !term.is_empty() {
        tracing::debug!(term = %term, total_matches, "catalog search");
        state.record(EventKind::Search, term.clone()).await;
    }

    Ok(ApiResponse::new(
        CatalogResults {
            query: term,
            rate,
            total_matches,
            items: page.items,
            report: page.report,
        },
        req_id.0,
    ))
}

#[derive(Debug, Deserialize)]
pub(super) struct OrderLinkQuery {
    pub product: Option<String>,
    pub phone: Option<String>,
}

#[derive(Debug, Serialize)]
pub(super) struct OrderLinkData {
    product: String,
    link: String,
}

pub(super) async fn get_order_link(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Query(query): Query<OrderLinkQuery>,
) -> Result<Json<ApiResponse<OrderLinkData>>, ApiError> {
    let product = query
        .product
        .as_deref()
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .ok_or_else(|| {
            ApiError::new(req_id.0.clone(), "validation_error", "product is required")
        })?
        .to_owned();

    let link = pillalo_core::order_link(query.phone.as_deref().unwrap_or_default(), &product)
        .ok_or_else(|| {
            ApiError::new(
                req_id.0.clone(),
                "validation_error",
                "phone must contain at least one digit",
            )
        })?;

    state.record(EventKind::OrderLink, product.clone()).await;

    Ok(ApiResponse::new(OrderLinkData { product, link }, req_id.0))
}
