mod admin;
mod cart;
mod catalog;
mod listings;
mod rate;

use std::sync::Arc;
use std::time::Duration;

use axum::{
    http::{header, HeaderName, Method, StatusCode},
    response::IntoResponse,
    routing::{get, post, put},
    Extension, Json, Router,
};
use chrono::{DateTime, Utc};
use pillalo_core::{EventKind, EventLog};
use pillalo_scraper::{BcvRateSource, CachedCatalog, RateProvider};
use serde::Serialize;
use tokio::sync::Mutex;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::middleware::{
    enforce_rate_limit, request_id, require_bearer_auth, session_id, AuthState, RateLimitState,
    RequestId, SESSION_HEADER,
};
use crate::session::SessionStore;

#[derive(Clone)]
pub struct AppState {
    pub rates: Arc<RateProvider<BcvRateSource>>,
    pub catalog: Arc<CachedCatalog>,
    pub sessions: SessionStore,
    pub events: Arc<Mutex<EventLog>>,
}

impl AppState {
    pub(super) async fn record(&self, kind: EventKind, detail: impl Into<String>) {
        self.events.lock().await.record(kind, detail);
    }
}

#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub data: T,
    pub meta: ResponseMeta,
}

#[derive(Debug, Serialize)]
pub struct ResponseMeta {
    pub request_id: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct ApiError {
    pub error: ErrorBody,
    pub meta: ResponseMeta,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
}

#[derive(Debug, Serialize, PartialEq, Eq)]
struct HealthData {
    status: &'static str,
}

impl ResponseMeta {
    pub(super) fn new(request_id: String) -> Self {
        Self {
            request_id,
            timestamp: Utc::now(),
        }
    }
}

impl<T: Serialize> ApiResponse<T> {
    pub(super) fn new(data: T, request_id: String) -> Json<Self> {
        Json(Self {
            data,
            meta: ResponseMeta::new(request_id),
        })
    }
}

impl ApiError {
    pub fn new(
        request_id: impl Into<String>,
        code: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            error: ErrorBody {
                code: code.into(),
                message: message.into(),
            },
            meta: ResponseMeta::new(request_id.into()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status = match self.error.code.as_str() {
            "not_found" => StatusCode::NOT_FOUND,
            "unauthorized" => StatusCode::UNAUTHORIZED,
            "bad_request" | "validation_error" => StatusCode::BAD_REQUEST,
            "rate_limited" => StatusCode::TOO_MANY_REQUESTS,
            "catalog_unavailable" => StatusCode::SERVICE_UNAVAILABLE,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, Json(self)).into_response()
    }
}

pub(super) fn normalize_limit(limit: Option<usize>) -> usize {
    limit.unwrap_or(50).clamp(1, 200)
}

pub(super) fn map_catalog_error(
    request_id: String,
    error: &pillalo_scraper::ScraperError,
) -> ApiError {
    tracing::error!(error = %error, "catalog sheet unavailable");
    ApiError::new(
        request_id,
        "catalog_unavailable",
        "catalog is temporarily unavailable",
    )
}

fn build_cors() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
            HeaderName::from_static("x-request-id"),
            HeaderName::from_static(SESSION_HEADER),
        ])
        .expose_headers([
            HeaderName::from_static("x-request-id"),
            HeaderName::from_static(SESSION_HEADER),
        ])
}

fn public_router() -> Router<AppState> {
    Router::new()
        .route("/api/v1/rate", get(rate::get_rate))
        .route("/api/v1/catalog", get(catalog::search_catalog))
        .route("/api/v1/order-link", get(catalog::get_order_link))
        .route("/api/v1/listings/preview", post(listings::preview_listing))
        .route("/api/v1/cart", get(cart::get_cart).delete(cart::clear_cart))
        .route("/api/v1/cart/items", post(cart::add_item))
        .route(
            "/api/v1/cart/items/{name}",
            put(cart::set_item_quantity).delete(cart::remove_item),
        )
        .route("/api/v1/cart/checkout", get(cart::checkout))
}

fn admin_router(auth: AuthState) -> Router<AppState> {
    Router::new()
        .route("/api/v1/admin/stats", get(admin::get_stats))
        .route("/api/v1/catalog/refresh", post(admin::refresh_catalog))
        .layer(axum::middleware::from_fn_with_state(
            auth,
            require_bearer_auth,
        ))
}

pub fn build_app(state: AppState, auth: AuthState, rate_limit: RateLimitState) -> Router {
    let limited = Router::new()
        .merge(public_router())
        .merge(admin_router(auth))
        .layer(axum::middleware::from_fn_with_state(
            rate_limit,
            enforce_rate_limit,
        ));

    Router::new()
        .route("/api/v1/health", get(health))
        .merge(limited)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(build_cors())
                .layer(axum::middleware::from_fn(request_id))
                .layer(axum::middleware::from_fn(session_id)),
        )
        .with_state(state)
}

async fn health(Extension(req_id): Extension<RequestId>) -> impl IntoResponse {
    ApiResponse::new(HealthData { status: "ok" }, req_id.0)
}

pub fn default_rate_limit_state() -> RateLimitState {
    RateLimitState::new(120, Duration::from_secs(60))
}

#[cfg(test)]
#[path = "api_test.rs"]
mod tests;
