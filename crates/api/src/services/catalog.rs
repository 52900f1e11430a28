//! Catalog reads and administrative product creation.

use std::sync::Arc;
use std::time::Duration;

use tracing::instrument;

use atelier_core::{Principal, ProductId};

use super::with_deadline;
use crate::error::{AppError, Result};
use crate::models::{NewProduct, Pagination, Product};
use crate::store::Store;

const MAX_PAGE_SIZE: u32 = 100;
pub const DEFAULT_PAGE_SIZE: u32 = 20;

#[derive(Clone)]
pub struct CatalogService {
    store: Arc<dyn Store>,
    save_deadline: Duration,
}

impl CatalogService {
    pub fn new(store: Arc<dyn Store>, save_deadline: Duration) -> Self {
        Self {
            store,
            save_deadline,
        }
    }

    /// Create a product with its variants. Requires catalog management.
    #[instrument(skip(self, principal, input), fields(sku = %input.sku))]
    pub async fn create(&self, principal: &Principal, input: NewProduct) -> Result<Product> {
        if !principal.can_manage_catalog() {
            return Err(AppError::Forbidden(
                "catalog management permission required".to_owned(),
            ));
        }
        validate_product(&input)?;

        let product =
            with_deadline(self.save_deadline, self.store.create_product(input)).await?;
        Ok(product)
    }

    /// Fetch one product with its variants.
    pub async fn get(&self, id: ProductId) -> Result<Product> {
        self.store
            .get_product(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("product {id}")))
    }

    /// Paginated listing, newest first.
    pub async fn list(&self, page: u32, limit: u32) -> Result<(Vec<Product>, Pagination)> {
        let limit = limit.clamp(1, MAX_PAGE_SIZE);
        let page = page.max(1);
        let offset = Pagination::offset(page, limit);
        let (products, total) = self.store.list_products(offset, limit).await?;
        Ok((products, Pagination::new(total, page, limit)))
    }
}

fn validate_product(input: &NewProduct) -> Result<()> {
    if input.name.trim().is_empty() {
        return Err(AppError::Validation("product name is required".to_owned()));
    }
    if input.sku.trim().is_empty() {
        return Err(AppError::Validation("SKU is required".to_owned()));
    }
    if input.base_price.as_i64() < 0 {
        return Err(AppError::Validation(
            "base price cannot be negative".to_owned(),
        ));
    }
    for variant in &input.variants {
        if variant.stock < 0 {
            return Err(AppError::Validation(
                "variant stock cannot be negative".to_owned(),
            ));
        }
        if variant.price.is_some_and(|p| p.as_i64() < 0) {
            return Err(AppError::Validation(
                "variant price cannot be negative".to_owned(),
            ));
        }
    }
    Ok(())
}
