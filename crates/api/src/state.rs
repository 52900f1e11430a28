//! Application state shared across handlers.

use std::sync::Arc;

use crate::config::ApiConfig;
use crate::services::{CartService, CatalogService, OrderService};
use crate::store::Store;

/// Application state shared across all handlers.
///
/// Cheaply cloneable via `Arc`; hands out the domain services wired to
/// the configured store.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: ApiConfig,
    store: Arc<dyn Store>,
}

impl AppState {
    /// Create application state over a store.
    #[must_use]
    pub fn new(config: ApiConfig, store: Arc<dyn Store>) -> Self {
        Self {
            inner: Arc::new(AppStateInner { config, store }),
        }
    }

    /// Get a reference to the API configuration.
    #[must_use]
    pub fn config(&self) -> &ApiConfig {
        &self.inner.config
    }

    /// Get a handle to the store.
    #[must_use]
    pub fn store(&self) -> Arc<dyn Store> {
        Arc::clone(&self.inner.store)
    }

    /// The order engine and lifecycle service.
    #[must_use]
    pub fn orders(&self) -> OrderService {
        OrderService::new(
            self.store(),
            self.inner.config.pricing.clone(),
            self.inner.config.save_deadline,
        )
    }

    /// The cart service.
    #[must_use]
    pub fn cart(&self) -> CartService {
        CartService::new(self.store(), self.inner.config.save_deadline)
    }

    /// The catalog service.
    #[must_use]
    pub fn catalog(&self) -> CatalogService {
        CatalogService::new(self.store(), self.inner.config.save_deadline)
    }
}
