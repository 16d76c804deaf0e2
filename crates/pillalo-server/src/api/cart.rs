use axum::{
    extract::{Path, State},
    Extension, Json,
};
use pillalo_core::pricing::to_local;
use pillalo_core::{cart_order_links, CartError, CartLine, CartState, EventKind, SellerOrder};
use serde::{Deserialize, Serialize};

use crate::middleware::{RequestId, SessionId};

use super::{ApiError, ApiResponse, AppState};

#[derive(Debug, Serialize)]
pub(super) struct CartView {
    items: Vec<CartLine>,
    item_count: usize,
    total_usd: f64,
    total_local: f64,
    rate: f64,
}

impl CartView {
    fn new(cart: &CartState, rate: f64) -> Self {
        let total_usd = cart.total_usd();
        Self {
            items: cart.lines().cloned().collect(),
            item_count: cart.len(),
            total_usd,
            total_local: to_local(total_usd, rate),
            rate,
        }
    }
}

#[derive(Debug, Deserialize)]
pub(super) struct AddItemRequest {
    pub name: String,
    pub unit_price: f64,
    pub contact: String,
    pub quantity: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub(super) struct SetQuantityRequest {
    pub quantity: u32,
}

#[derive(Debug, Serialize)]
pub(super) struct CheckoutData {
    orders: Vec<SellerOrder>,
    total_usd: f64,
    total_local: f64,
    rate: f64,
}

fn map_cart_error(request_id: String, error: &CartError) -> ApiError {
    let code = match error {
        CartError::NotInCart(_) => "not_found",
        CartError::ZeroQuantity | CartError::InvalidPrice(_) | CartError::EmptyName => {
            "validation_error"
        }
    };
    ApiError::new(request_id, code, error.to_string())
}

pub(super) async fn get_cart(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Extension(session): Extension<SessionId>,
) -> Json<ApiResponse<CartView>> {
    let rate = state.rates.get_rate().await;
    let view = state
        .sessions
        .with_cart(&session, |cart| CartView::new(cart, rate))
        .await;
    ApiResponse::new(view, req_id.0)
}

pub(super) async fn add_item(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Extension(session): Extension<SessionId>,
    Json(body): Json<AddItemRequest>,
) -> Result<Json<ApiResponse<CartView>>, ApiError> {
    let rate = state.rates.get_rate().await;
    let quantity = body.quantity.unwrap_or(1);
    let view = state
        .sessions
        .with_cart(&session, |cart| {
            cart.add(&body.name, body.unit_price, &body.contact, quantity)
                .map(|()| CartView::new(cart, rate))
        })
        .await
        .map_err(|e| map_cart_error(req_id.0.clone(), &e))?;
    Ok(ApiResponse::new(view, req_id.0))
}

pub(super) async fn set_item_quantity(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Extension(session): Extension<SessionId>,
    Path(name): Path<String>,
    Json(body): Json<SetQuantityRequest>,
) -> Result<Json<ApiResponse<CartView>>, ApiError> {
    let rate = state.rates.get_rate().await;
    let view = state
        .sessions
        .with_cart(&session, |cart| {
            cart.set_quantity(&name, body.quantity)
                .map(|()| CartView::new(cart, rate))
        })
        .await
        .map_err(|e| map_cart_error(req_id.0.clone(), &e))?;
    Ok(ApiResponse::new(view, req_id.0))
}

pub(super) async fn remove_item(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Extension(session): Extension<SessionId>,
    Path(name): Path<String>,
) -> Result<Json<ApiResponse<CartView>>, ApiError> {
    let rate = state.rates.get_rate().await;
    let view = state
        .sessions
        .with_cart(&session, |cart| {
            cart.remove(&name)
                .map(|_| CartView::new(cart, rate))
                .ok_or_else(|| CartError::NotInCart(name.clone()))
        })
        .await
        .map_err(|e| map_cart_error(req_id.0.clone(), &e))?;
    Ok(ApiResponse::new(view, req_id.0))
}

pub(super) async fn clear_cart(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Extension(session): Extension<SessionId>,
) -> Json<ApiResponse<CartView>> {
    let rate = state.rates.get_rate().await;
    let view = state
        .sessions
        .with_cart(&session, |cart| {
            cart.clear();
            CartView::new(cart, rate)
        })
        .await;
    ApiResponse::new(view, req_id.0)
}

/// Builds one WhatsApp order per seller. The cart is left as is so the
/// visitor can come back to it after messaging.
pub(super) async fn checkout(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Extension(session): Extension<SessionId>,
) -> Result<Json<ApiResponse<CheckoutData>>, ApiError> {
    let rate = state.rates.get_rate().await;
    let (orders, total_usd) = state
        .sessions
        .with_cart(&session, |cart| (cart_order_links(cart), cart.total_usd()))
        .await;

    if orders.is_empty() {
        return Err(ApiError::new(
            req_id.0,
            "validation_error",
            "cart has no items with a seller contact",
        ));
    }

    state
        .record(
            EventKind::CartCheckout,
            format!("{} sellers, ${total_usd:.2}", orders.len()),
        )
        .await;

    Ok(ApiResponse::new(
        CheckoutData {
            orders,
            total_usd,
            total_local: to_local(total_usd, rate),
            rate,
        },
        req_id.0,
    ))
}
