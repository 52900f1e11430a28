//! Customer-facing order handlers.

use axum::{
    Json,
    extract::{Path, State},
    response::Response,
};
use tracing::instrument;

use atelier_core::OrderId;

use super::ApiResponse;
use crate::error::Result;
use crate::middleware::RequireAuth;
use crate::models::Order;
use crate::services::orders::CheckoutRequest;
use crate::state::AppState;

/// `POST /api/orders/checkout`
#[instrument(skip(state, principal, request), fields(user_id = %principal.id))]
pub async fn checkout(
    State(state): State<AppState>,
    RequireAuth(principal): RequireAuth,
    Json(request): Json<CheckoutRequest>,
) -> Result<Response> {
    let order = state.orders().checkout(principal.id, request).await?;
    Ok(ApiResponse::created(order))
}

/// `GET /api/orders/my`
#[instrument(skip(state, principal), fields(user_id = %principal.id))]
pub async fn mine(
    State(state): State<AppState>,
    RequireAuth(principal): RequireAuth,
) -> Result<ApiResponse<Vec<Order>>> {
    let orders = state.orders().list_mine(principal.id).await?;
    Ok(ApiResponse::new(orders))
}

/// `GET /api/orders/{id}`
#[instrument(skip(state, principal), fields(user_id = %principal.id))]
pub async fn show(
    State(state): State<AppState>,
    RequireAuth(principal): RequireAuth,
    Path(id): Path<OrderId>,
) -> Result<ApiResponse<Order>> {
    let order = state.orders().get(&principal, id).await?;
    Ok(ApiResponse::new(order))
}

/// `POST /api/orders/{id}/cancel`
#[instrument(skip(state, principal), fields(user_id = %principal.id))]
pub async fn cancel(
    State(state): State<AppState>,
    RequireAuth(principal): RequireAuth,
    Path(id): Path<OrderId>,
) -> Result<ApiResponse<Order>> {
    let order = state.orders().cancel(&principal, id).await?;
    Ok(ApiResponse::new(order))
}

/// `PUT /api/orders/{id}/pay`
#[instrument(skip(state, principal), fields(user_id = %principal.id))]
pub async fn pay(
    State(state): State<AppState>,
    RequireAuth(principal): RequireAuth,
    Path(id): Path<OrderId>,
) -> Result<ApiResponse<Order>> {
    let order = state.orders().mark_paid(&principal, id).await?;
    Ok(ApiResponse::new(order))
}
