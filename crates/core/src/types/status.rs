//! Status enums for orders and payments.
//!
//! All statuses are persisted as their wire spelling (`SCREAMING_SNAKE_CASE`
//! text), so `Display`/`FromStr` mirror the serde representation exactly.

use serde::{Deserialize, Serialize};

/// Order fulfillment status.
///
/// `Pending` is always the initial state. Transitions are administrative
/// and one-directional in the normal flow; the only guarded transition is
/// cancellation, which is legal exclusively from `Pending`
/// ([`OrderStatus::can_cancel`]). `Delivered` and `Cancelled` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    #[default]
    Pending,
    Confirmed,
    Shipping,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    /// Whether an order in this state may still be cancelled.
    ///
    /// This check doubles as the idempotence guard for stock restoration:
    /// a second cancel sees `Cancelled` and is rejected before any stock
    /// is touched again.
    #[must_use]
    pub const fn can_cancel(self) -> bool {
        matches!(self, Self::Pending)
    }

    /// Whether this state ends the order's lifecycle.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Delivered | Self::Cancelled)
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Pending => "PENDING",
            Self::Confirmed => "CONFIRMED",
            Self::Shipping => "SHIPPING",
            Self::Delivered => "DELIVERED",
            Self::Cancelled => "CANCELLED",
        };
        write!(f, "{s}")
    }
}

impl std::str::FromStr for OrderStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PENDING" => Ok(Self::Pending),
            "CONFIRMED" => Ok(Self::Confirmed),
            "SHIPPING" => Ok(Self::Shipping),
            "DELIVERED" => Ok(Self::Delivered),
            "CANCELLED" => Ok(Self::Cancelled),
            _ => Err(format!("invalid order status: {s}")),
        }
    }
}

/// Payment status.
///
/// Every order starts `Pending`; only the explicit mark-paid operation
/// flips it, regardless of payment method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentStatus {
    #[default]
    Pending,
    Paid,
}

impl std::fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pending => write!(f, "PENDING"),
            Self::Paid => write!(f, "PAID"),
        }
    }
}

impl std::str::FromStr for PaymentStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PENDING" => Ok(Self::Pending),
            "PAID" => Ok(Self::Paid),
            _ => Err(format!("invalid payment status: {s}")),
        }
    }
}

/// Accepted payment methods.
///
/// Cash-on-delivery is the fully supported flow; the other methods are
/// accepted and recorded but settle through the same mark-paid path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentMethod {
    #[default]
    Cod,
    BankTransfer,
    Card,
}

impl std::fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Cod => write!(f, "COD"),
            Self::BankTransfer => write!(f, "BANK_TRANSFER"),
            Self::Card => write!(f, "CARD"),
        }
    }
}

impl std::str::FromStr for PaymentMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "COD" => Ok(Self::Cod),
            "BANK_TRANSFER" => Ok(Self::BankTransfer),
            "CARD" => Ok(Self::Card),
            _ => Err(format!("invalid payment method: {s}")),
        }
    }
}
