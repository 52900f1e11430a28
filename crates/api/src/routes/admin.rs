//! Administrative handlers. Permission checks live in the services.

use axum::{
    Json,
    extract::{Path, Query, State},
    response::Response,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use tracing::instrument;

use atelier_core::{Money, OrderId, OrderStatus, PaymentStatus};

use super::ApiResponse;
use crate::error::Result;
use crate::middleware::RequireAuth;
use crate::models::{NewProduct, Order, OrderFilter};
use crate::services::catalog::DEFAULT_PAGE_SIZE;
use crate::services::orders::StatusUpdate;
use crate::state::AppState;

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct OrderListQuery {
    #[serde(default)]
    pub status: Option<OrderStatus>,
    #[serde(default)]
    pub payment_status: Option<PaymentStatus>,
    /// Inclusive `created_at` window, RFC 3339 timestamps.
    #[serde(default)]
    pub created_from: Option<DateTime<Utc>>,
    #[serde(default)]
    pub created_to: Option<DateTime<Utc>>,
    /// Inclusive grand-total window.
    #[serde(default)]
    pub min_total: Option<Money>,
    #[serde(default)]
    pub max_total: Option<Money>,
    #[serde(default)]
    pub page: Option<u32>,
    #[serde(default)]
    pub limit: Option<u32>,
}

/// `POST /api/admin/products`
#[instrument(skip(state, principal, input), fields(user_id = %principal.id))]
pub async fn create_product(
    State(state): State<AppState>,
    RequireAuth(principal): RequireAuth,
    Json(input): Json<NewProduct>,
) -> Result<Response> {
    let product = state.catalog().create(&principal, input).await?;
    Ok(ApiResponse::created(product))
}

/// `GET /api/admin/orders`
#[instrument(skip(state, principal), fields(user_id = %principal.id))]
pub async fn list_orders(
    State(state): State<AppState>,
    RequireAuth(principal): RequireAuth,
    Query(query): Query<OrderListQuery>,
) -> Result<ApiResponse<Vec<Order>>> {
    let filter = OrderFilter {
        status: query.status,
        payment_status: query.payment_status,
        created_from: query.created_from,
        created_to: query.created_to,
        min_total: query.min_total,
        max_total: query.max_total,
    };
    let (orders, pagination) = state
        .orders()
        .admin_list(
            &principal,
            filter,
            query.page.unwrap_or(1),
            query.limit.unwrap_or(DEFAULT_PAGE_SIZE),
        )
        .await?;
    Ok(ApiResponse::paged(orders, pagination))
}

/// `PUT /api/admin/orders/{id}/status`
#[instrument(skip(state, principal), fields(user_id = %principal.id))]
pub async fn update_order_status(
    State(state): State<AppState>,
    RequireAuth(principal): RequireAuth,
    Path(id): Path<OrderId>,
    Json(update): Json<StatusUpdate>,
) -> Result<ApiResponse<Order>> {
    let order = state.orders().update_status(&principal, id, update).await?;
    Ok(ApiResponse::new(order))
}
