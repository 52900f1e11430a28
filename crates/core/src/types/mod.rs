//! Core types for Atelier.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod id;
pub mod money;
pub mod principal;
pub mod status;

pub use id::*;
pub use money::{Money, PriceSource, UnitPrice};
pub use principal::{PERM_MANAGE_CATALOG, PERM_MANAGE_ORDERS, Principal, Role};
pub use status::{OrderStatus, PaymentMethod, PaymentStatus};
