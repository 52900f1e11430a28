//! Persistence layer.
//!
//! The [`Store`] trait is the lookup-and-mutate interface the order
//! engine consumes: catalog reads plus conditional stock mutation, cart
//! lookup-and-clear, and order persistence. Two implementations exist:
//!
//! - [`PgStore`] - `PostgreSQL` via sqlx, the production store
//! - [`MemStore`] - in-memory, for tests and local development
//!
//! # Stock invariant
//!
//! Stock never goes negative. Both implementations express stock changes
//! as conditional increments against the stored variant
//! (`stock = stock + delta` guarded by the resulting value), never as
//! read-modify-write of a whole product, so concurrent checkouts cannot
//! lose updates.
//!
//! # Migrations
//!
//! Migrations live in `crates/api/migrations/` and run via:
//! ```bash
//! cargo run -p atelier-cli -- migrate
//! ```

pub mod memory;
pub mod postgres;

pub use memory::MemStore;
pub use postgres::{PgStore, create_pool};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

use atelier_core::{OrderId, OrderStatus, ProductId, UserId, VariantId};

use crate::models::{Cart, NewOrder, NewProduct, Order, OrderFilter, Product};

/// Errors that can occur during store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the store is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found: {0}")]
    NotFound(String),

    /// Constraint violation (e.g., duplicate SKU or order number).
    #[error("constraint violation: {0}")]
    Conflict(String),

    /// A conditional stock decrement found less stock than requested.
    /// Carries the product name for the client-facing error.
    #[error("insufficient stock for product {product}")]
    StockConflict { product: String },
}

/// The persistence interface consumed by the services.
#[async_trait]
pub trait Store: Send + Sync {
    /// Cheap connectivity probe for the readiness endpoint.
    async fn ping(&self) -> Result<(), StoreError>;

    // =========================================================================
    // Catalog
    // =========================================================================

    /// Persist a product together with its variants.
    ///
    /// Fails with [`StoreError::Conflict`] when the SKU already exists.
    async fn create_product(&self, input: NewProduct) -> Result<Product, StoreError>;

    /// Fetch a product (with variants) by ID.
    async fn get_product(&self, id: ProductId) -> Result<Option<Product>, StoreError>;

    /// Fetch a page of products (with variants), newest first, plus the
    /// total product count.
    async fn list_products(
        &self,
        offset: u64,
        limit: u32,
    ) -> Result<(Vec<Product>, u64), StoreError>;

    /// Apply a conditional stock delta to one variant.
    ///
    /// Returns `false` without mutating anything when the variant is
    /// missing or the delta would drive stock negative.
    async fn adjust_stock(
        &self,
        product_id: ProductId,
        variant_id: VariantId,
        delta: i64,
    ) -> Result<bool, StoreError>;

    // =========================================================================
    // Cart
    // =========================================================================

    /// Fetch a user's cart with its lines, if one exists.
    async fn get_cart(&self, user_id: UserId) -> Result<Option<Cart>, StoreError>;

    /// Set the absolute quantity for one cart line, creating the cart
    /// and/or line as needed. Merge arithmetic happens in the service.
    async fn upsert_cart_line(
        &self,
        user_id: UserId,
        product_id: ProductId,
        variant_id: VariantId,
        quantity: u32,
    ) -> Result<(), StoreError>;

    /// Remove one cart line. Returns whether a line was removed.
    async fn remove_cart_line(
        &self,
        user_id: UserId,
        product_id: ProductId,
        variant_id: VariantId,
    ) -> Result<bool, StoreError>;

    /// Remove all lines from a user's cart. The cart row survives.
    async fn clear_cart(&self, user_id: UserId) -> Result<(), StoreError>;

    // =========================================================================
    // Orders
    // =========================================================================

    /// Whether an order already carries this order number.
    async fn order_number_exists(&self, order_number: &str) -> Result<bool, StoreError>;

    /// Atomically decrement stock for every line and persist the order.
    ///
    /// All decrements and the insert happen in one transaction: if any
    /// line's conditional decrement finds less stock than requested the
    /// whole operation rolls back with [`StoreError::StockConflict`].
    /// A duplicate order number surfaces as [`StoreError::Conflict`].
    async fn create_order(&self, order: NewOrder) -> Result<Order, StoreError>;

    /// Fetch an order (with lines) by ID.
    async fn get_order(&self, id: OrderId) -> Result<Option<Order>, StoreError>;

    /// All orders for one user, newest first.
    async fn list_orders_for_user(&self, user_id: UserId) -> Result<Vec<Order>, StoreError>;

    /// Filtered page of all orders, newest first, plus the total count
    /// under the filter.
    async fn list_orders(
        &self,
        filter: OrderFilter,
        offset: u64,
        limit: u32,
    ) -> Result<(Vec<Order>, u64), StoreError>;

    /// Compare-and-set status transition. Returns `false` when the order
    /// was not in `from` (or does not exist); nothing is mutated then.
    async fn transition_order_status(
        &self,
        id: OrderId,
        from: OrderStatus,
        to: OrderStatus,
    ) -> Result<bool, StoreError>;

    /// Unconditional administrative status update, optionally stamping
    /// the delivered timestamp.
    async fn set_order_status(
        &self,
        id: OrderId,
        to: OrderStatus,
        delivered_at: Option<DateTime<Utc>>,
    ) -> Result<(), StoreError>;

    /// Flip the payment status to paid and stamp the payment timestamp.
    async fn mark_order_paid(
        &self,
        id: OrderId,
        paid_at: DateTime<Utc>,
    ) -> Result<(), StoreError>;
}
