use axum::{
    extract::{Query, State},
    Extension, Json,
};
use pillalo_core::{EventKind, UsageStats};
use pillalo_scraper::RateQuote;
use serde::{Deserialize, Serialize};

use crate::middleware::RequestId;

use super::{map_catalog_error, ApiError, ApiResponse, AppState};

#[derive(Debug, Deserialize)]
pub(super) struct StatsQuery {
    pub top: Option<usize>,
}

#[derive(Debug, Serialize)]
pub(super) struct StatsData {
    #[serde(flatten)]
    usage: UsageStats,
    active_sessions: usize,
}

#[derive(Debug, Serialize)]
pub(super) struct RefreshData {
    listings: usize,
    rate: RateQuote,
}

pub(super) async fn get_stats(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Query(query): Query<StatsQuery>,
) -> Json<ApiResponse<StatsData>> {
    let top = query.top.unwrap_or(10).clamp(1, 100);
    let usage = state.events.lock().await.stats(top);
    let active_sessions = state.sessions.session_count().await;
    ApiResponse::new(
        StatsData {
            usage,
            active_sessions,
        },
        req_id.0,
    )
}

/// Reloads the sheet and the rate, bypassing both caches.
///
/// A failed sheet fetch is reported as `catalog_unavailable` and not counted
/// as a refresh, even though readers keep getting the previous copy.
pub(super) async fn refresh_catalog(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> Result<Json<ApiResponse<RefreshData>>, ApiError> {
    state.rates.invalidate().await;

    let (listings, rate) = tokio::join!(state.catalog.refresh(), state.rates.quote());
    let listings = listings.map_err(|e| map_catalog_error(req_id.0.clone(), &e))?;

    tracing::info!(listings = listings.len(), rate = rate.rate, "catalog refreshed on request");
    state
        .record(EventKind::CatalogRefresh, format!("{} listings", listings.len()))
        .await;

    Ok(ApiResponse::new(
        RefreshData {
            listings: listings.len(),
            rate,
        },
        req_id.0,
    ))
}
