//! HTTP route handlers.
//!
//! # Route Structure
//!
//! ```text
//! GET    /health                       - Liveness
//! GET    /health/ready                 - Readiness (store ping)
//!
//! # Catalog
//! GET    /api/products                 - Product listing (paged)
//! GET    /api/products/{id}            - Product detail
//!
//! # Cart (requires identity)
//! GET    /api/cart                     - Current cart
//! POST   /api/cart/items               - Add a line (merges quantities)
//! PUT    /api/cart/items               - Set a line's quantity
//! DELETE /api/cart/items               - Remove a line
//!
//! # Orders (requires identity)
//! POST   /api/orders/checkout          - Create an order
//! GET    /api/orders/my                - Caller's orders, newest first
//! GET    /api/orders/{id}              - Order detail (owner or admin)
//! POST   /api/orders/{id}/cancel       - Cancel a pending order
//! PUT    /api/orders/{id}/pay          - Record payment
//!
//! # Admin (requires admin identity)
//! POST   /api/admin/products           - Create a product
//! GET    /api/admin/orders             - All orders, filtered and paged
//! PUT    /api/admin/orders/{id}/status - Update order status
//! ```

pub mod admin;
pub mod cart;
pub mod orders;
pub mod products;

use axum::{
    Json, Router,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post, put},
};
use serde::Serialize;

use crate::models::Pagination;
use crate::state::AppState;

/// The client-facing success envelope.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    success: bool,
    data: T,
    #[serde(skip_serializing_if = "Option::is_none")]
    pagination: Option<Pagination>,
}

impl<T: Serialize> ApiResponse<T> {
    pub const fn new(data: T) -> Self {
        Self {
            success: true,
            data,
            pagination: None,
        }
    }

    pub const fn paged(data: T, pagination: Pagination) -> Self {
        Self {
            success: true,
            data,
            pagination: Some(pagination),
        }
    }

    /// Respond with `201 Created`.
    pub fn created(data: T) -> Response {
        (StatusCode::CREATED, Self::new(data)).into_response()
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        Json(self).into_response()
    }
}

/// Create all API routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .nest("/api/products", product_routes())
        .nest("/api/cart", cart_routes())
        .nest("/api/orders", order_routes())
        .nest("/api/admin", admin_routes())
}

fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(products::index))
        .route("/{id}", get(products::show))
}

fn cart_routes() -> Router<AppState> {
    Router::new().route("/", get(cart::show)).route(
        "/items",
        post(cart::add).put(cart::update).delete(cart::remove),
    )
}

fn order_routes() -> Router<AppState> {
    Router::new()
        .route("/checkout", post(orders::checkout))
        .route("/my", get(orders::mine))
        .route("/{id}", get(orders::show))
        .route("/{id}/cancel", post(orders::cancel))
        .route("/{id}/pay", put(orders::pay))
}

fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/products", post(admin::create_product))
        .route("/orders", get(admin::list_orders))
        .route("/orders/{id}/status", put(admin::update_order_status))
}
