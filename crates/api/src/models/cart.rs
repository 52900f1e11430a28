//! Cart domain types.
//!
//! Each user owns at most one cart. A cart line references a product
//! variant by ID only; prices are always resolved from the live catalog
//! when the cart is displayed, and re-resolved by the order engine at
//! checkout.

use chrono::{DateTime, Utc};
use serde::Serialize;

use atelier_core::{CartId, Money, ProductId, UnitPrice, UserId, VariantId};

/// A user's cart as stored: bare (product, variant, quantity) lines.
///
/// Invariant: at most one line per (product, variant) pair. Duplicate
/// additions merge by summing quantity before they reach the store.
#[derive(Debug, Clone, Serialize)]
pub struct Cart {
    pub id: CartId,
    pub user_id: UserId,
    pub lines: Vec<CartLine>,
    pub updated_at: DateTime<Utc>,
}

impl Cart {
    /// Find the line for a (product, variant) pair, if present.
    #[must_use]
    pub fn line(&self, product_id: ProductId, variant_id: VariantId) -> Option<&CartLine> {
        self.lines
            .iter()
            .find(|l| l.product_id == product_id && l.variant_id == variant_id)
    }
}

/// One (product, variant, quantity) entry in a cart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CartLine {
    pub product_id: ProductId,
    pub variant_id: VariantId,
    pub quantity: u32,
}

/// A cart joined against the live catalog for display.
///
/// Totals here are advisory: the order engine recomputes everything at
/// checkout against stock and prices current at that moment.
#[derive(Debug, Clone, Serialize)]
pub struct CartDetail {
    pub lines: Vec<CartLineDetail>,
    pub total_amount: Money,
}

impl CartDetail {
    /// An empty cart view (users without a cart row see this).
    #[must_use]
    pub const fn empty() -> Self {
        Self {
            lines: Vec::new(),
            total_amount: Money::ZERO,
        }
    }
}

/// One cart line enriched with current catalog data.
#[derive(Debug, Clone, Serialize)]
pub struct CartLineDetail {
    pub product_id: ProductId,
    pub variant_id: VariantId,
    pub product_name: String,
    pub quantity: u32,
    /// Unit price as it would resolve right now.
    pub unit_price: UnitPrice,
    pub line_total: Money,
    /// Variant stock at display time (advisory only).
    pub in_stock: i64,
}
