//! Cart handlers. All of them act on the authenticated caller's cart.

use axum::{Json, extract::State};
use serde::Deserialize;
use tracing::instrument;

use atelier_core::{ProductId, VariantId};

use super::ApiResponse;
use crate::error::Result;
use crate::middleware::RequireAuth;
use crate::models::CartDetail;
use crate::state::AppState;

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct CartItemBody {
    pub product_id: ProductId,
    pub variant_id: VariantId,
    pub quantity: u32,
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct CartItemRef {
    pub product_id: ProductId,
    pub variant_id: VariantId,
}

/// `GET /api/cart`
#[instrument(skip(state, principal), fields(user_id = %principal.id))]
pub async fn show(
    State(state): State<AppState>,
    RequireAuth(principal): RequireAuth,
) -> Result<ApiResponse<CartDetail>> {
    let detail = state.cart().detail(principal.id).await?;
    Ok(ApiResponse::new(detail))
}

/// `POST /api/cart/items`
#[instrument(skip(state, principal, body), fields(user_id = %principal.id))]
pub async fn add(
    State(state): State<AppState>,
    RequireAuth(principal): RequireAuth,
    Json(body): Json<CartItemBody>,
) -> Result<ApiResponse<CartDetail>> {
    let detail = state
        .cart()
        .add(principal.id, body.product_id, body.variant_id, body.quantity)
        .await?;
    Ok(ApiResponse::new(detail))
}

/// `PUT /api/cart/items`
#[instrument(skip(state, principal, body), fields(user_id = %principal.id))]
pub async fn update(
    State(state): State<AppState>,
    RequireAuth(principal): RequireAuth,
    Json(body): Json<CartItemBody>,
) -> Result<ApiResponse<CartDetail>> {
    let detail = state
        .cart()
        .update(principal.id, body.product_id, body.variant_id, body.quantity)
        .await?;
    Ok(ApiResponse::new(detail))
}

/// `DELETE /api/cart/items`
#[instrument(skip(state, principal, body), fields(user_id = %principal.id))]
pub async fn remove(
    State(state): State<AppState>,
    RequireAuth(principal): RequireAuth,
    Json(body): Json<CartItemRef>,
) -> Result<ApiResponse<CartDetail>> {
    let detail = state
        .cart()
        .remove(principal.id, body.product_id, body.variant_id)
        .await?;
    Ok(ApiResponse::new(detail))
}
