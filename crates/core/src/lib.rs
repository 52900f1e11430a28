//! Atelier Core - Shared domain types library.
//!
//! This crate provides common types used across all Atelier components:
//! - `api` - The HTTP backend (catalog, cart, orders)
//! - `cli` - Command-line tools for migrations and seeding
//!
//! # Architecture
//!
//! The core crate contains only types and pure domain logic - no I/O,
//! no database access, no HTTP. This keeps it lightweight and allows it
//! to be used anywhere, including in tests that never touch a store.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for type-safe IDs, money, statuses,
//!   and the resolved request principal
//! - [`pricing`] - The pricing policy applied when a cart becomes an order

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod pricing;
pub mod types;

pub use pricing::{PricingPolicy, Totals};
pub use types::*;
