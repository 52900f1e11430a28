//! Order pricing policy.
//!
//! The policy is an explicit value object handed to the order engine
//! rather than ambient configuration, so tests can vary the rates. The
//! production values come from the API config (env-driven).

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use crate::types::Money;

/// Computed monetary breakdown of an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Totals {
    /// Sum of `unit_price * quantity` across lines, before shipping and tax.
    pub items_subtotal: Money,
    /// Flat shipping fee, zeroed above the free-shipping threshold.
    pub shipping_fee: Money,
    /// Tax on the items subtotal only.
    pub tax_amount: Money,
    /// `items_subtotal + shipping_fee + tax_amount`.
    pub grand_total: Money,
}

/// The pricing rules applied once per checkout, after line validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PricingPolicy {
    /// Orders strictly above this subtotal ship free.
    pub free_shipping_threshold: Money,
    /// Flat fee charged below (and exactly at) the threshold.
    pub flat_shipping_fee: Money,
    /// Flat tax rate applied to the items subtotal.
    pub tax_rate: Decimal,
}

impl Default for PricingPolicy {
    fn default() -> Self {
        Self {
            free_shipping_threshold: Money::new(500_000),
            flat_shipping_fee: Money::new(30_000),
            tax_rate: Decimal::new(10, 2), // 0.10
        }
    }
}

impl PricingPolicy {
    /// Shipping fee for a given items subtotal.
    ///
    /// The comparison is strict: a subtotal exactly at the threshold
    /// still pays the flat fee.
    #[must_use]
    pub fn shipping_fee(&self, items_subtotal: Money) -> Money {
        if items_subtotal > self.free_shipping_threshold {
            Money::ZERO
        } else {
            self.flat_shipping_fee
        }
    }

    /// Tax on a given items subtotal, rounded to a whole unit
    /// (half away from zero).
    #[must_use]
    pub fn tax(&self, items_subtotal: Money) -> Money {
        let tax = (Decimal::from(items_subtotal.as_i64()) * self.tax_rate)
            .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero);
        Money::new(tax.to_i64().unwrap_or(i64::MAX))
    }

    /// Derive the full totals breakdown for an items subtotal.
    #[must_use]
    pub fn quote(&self, items_subtotal: Money) -> Totals {
        let shipping_fee = self.shipping_fee(items_subtotal);
        let tax_amount = self.tax(items_subtotal);
        Totals {
            items_subtotal,
            shipping_fee,
            tax_amount,
            grand_total: items_subtotal + shipping_fee + tax_amount,
        }
    }
}
