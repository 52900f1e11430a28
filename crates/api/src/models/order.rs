//! Order domain types.
//!
//! An order is an immutable snapshot of what was purchased and at what
//! price. After creation only the status, payment, and delivery fields
//! ever change; line items and totals are frozen at checkout time.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use atelier_core::{
    Money, OrderId, OrderStatus, PaymentMethod, PaymentStatus, ProductId, Totals, UnitPrice,
    UserId, VariantId,
};

/// A persisted order.
#[derive(Debug, Clone, Serialize)]
pub struct Order {
    pub id: OrderId,
    pub user_id: UserId,
    /// Unique human-readable order number (`ORD<millis><suffix>`).
    pub order_number: String,
    pub lines: Vec<OrderLine>,
    #[serde(flatten)]
    pub totals: Totals,
    pub shipping_address: ShippingAddress,
    pub payment_method: PaymentMethod,
    pub payment_status: PaymentStatus,
    pub paid_at: Option<DateTime<Utc>>,
    pub status: OrderStatus,
    pub delivered_at: Option<DateTime<Utc>>,
    pub note: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Immutable snapshot of one purchased line.
///
/// The price is captured at order time and never re-read from the live
/// product; `unit_price` also records which side of the variant/base
/// precedence rule produced it.
#[derive(Debug, Clone, Serialize)]
pub struct OrderLine {
    pub product_id: ProductId,
    pub variant_id: VariantId,
    /// Product name at order time.
    pub product_name: String,
    pub quantity: u32,
    pub unit_price: UnitPrice,
}

impl OrderLine {
    /// `unit_price * quantity` for this line.
    #[must_use]
    pub const fn line_total(&self) -> Money {
        self.unit_price.amount().times(self.quantity)
    }
}

/// Structured shipping address; every field is required.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShippingAddress {
    pub full_name: String,
    pub phone: String,
    pub address: String,
    pub city: String,
    pub district: String,
    pub ward: String,
}

impl ShippingAddress {
    /// Check that all six fields are populated.
    ///
    /// # Errors
    ///
    /// Returns the name of the first blank field.
    pub fn validate(&self) -> Result<(), &'static str> {
        let fields = [
            (&self.full_name, "full_name"),
            (&self.phone, "phone"),
            (&self.address, "address"),
            (&self.city, "city"),
            (&self.district, "district"),
            (&self.ward, "ward"),
        ];
        for (value, name) in fields {
            if value.trim().is_empty() {
                return Err(name);
            }
        }
        Ok(())
    }
}

/// One requested checkout line, before validation.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct CheckoutLine {
    pub product_id: ProductId,
    pub variant_id: VariantId,
    pub quantity: u32,
}

/// A fully validated and priced order, ready to persist.
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub user_id: UserId,
    pub order_number: String,
    pub lines: Vec<OrderLine>,
    pub totals: Totals,
    pub shipping_address: ShippingAddress,
    pub payment_method: PaymentMethod,
    pub note: Option<String>,
}

/// Filters for the admin order listing. Ranges are inclusive.
#[derive(Debug, Clone, Copy, Default)]
pub struct OrderFilter {
    pub status: Option<OrderStatus>,
    pub payment_status: Option<PaymentStatus>,
    pub created_from: Option<DateTime<Utc>>,
    pub created_to: Option<DateTime<Utc>>,
    pub min_total: Option<Money>,
    pub max_total: Option<Money>,
}
