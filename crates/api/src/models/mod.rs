//! Domain models for the API.
//!
//! These are validated domain objects, separate from database row types
//! (the store layer owns the row structs and the conversion).

pub mod cart;
pub mod catalog;
pub mod order;

pub use cart::{Cart, CartDetail, CartLine, CartLineDetail};
pub use catalog::{NewProduct, NewVariant, Product, Variant};
pub use order::{CheckoutLine, NewOrder, Order, OrderFilter, OrderLine, ShippingAddress};

use serde::Serialize;

/// Pagination envelope returned by listing endpoints.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct Pagination {
    pub total: u64,
    pub page: u32,
    pub limit: u32,
    pub total_pages: u64,
}

impl Pagination {
    /// Build a pagination envelope from a total row count.
    #[must_use]
    pub const fn new(total: u64, page: u32, limit: u32) -> Self {
        let total_pages = if limit == 0 {
            0
        } else {
            total.div_ceil(limit as u64)
        };
        Self {
            total,
            page,
            limit,
            total_pages,
        }
    }

    /// Row offset of the first item on this page.
    #[must_use]
    pub const fn offset(page: u32, limit: u32) -> u64 {
        (page.saturating_sub(1) as u64) * (limit as u64)
    }
}
