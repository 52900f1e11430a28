//! Cart maintenance and display.
//!
//! Stock checks here are advisory only; the order engine re-validates
//! everything at checkout. Adding an item merges with any existing line
//! for the same (product, variant), while updating sets the absolute
//! quantity.

use std::sync::Arc;
use std::time::Duration;

use tracing::instrument;

use atelier_core::{Money, ProductId, UnitPrice, UserId, VariantId};

use super::with_deadline;
use crate::error::{AppError, Result};
use crate::models::{CartDetail, CartLineDetail, Product, Variant};
use crate::store::Store;

#[derive(Clone)]
pub struct CartService {
    store: Arc<dyn Store>,
    save_deadline: Duration,
}

impl CartService {
    pub fn new(store: Arc<dyn Store>, save_deadline: Duration) -> Self {
        Self {
            store,
            save_deadline,
        }
    }

    /// Add `quantity` units, merging with any existing line.
    #[instrument(skip(self), fields(user_id = %user))]
    pub async fn add(
        &self,
        user: UserId,
        product_id: ProductId,
        variant_id: VariantId,
        quantity: u32,
    ) -> Result<CartDetail> {
        if quantity == 0 {
            return Err(AppError::Validation(
                "quantity must be at least 1".to_owned(),
            ));
        }

        let (product, variant) = self.lookup(product_id, variant_id).await?;

        let existing = self
            .store
            .get_cart(user)
            .await?
            .and_then(|c| c.line(product_id, variant_id).map(|l| l.quantity))
            .unwrap_or(0);
        let merged = existing.saturating_add(quantity);

        // Advisory: keeps obviously doomed carts from forming, but the
        // checkout transaction is the real gate.
        if i64::from(merged) > variant.stock {
            return Err(AppError::InsufficientStock {
                product: product.name,
            });
        }

        with_deadline(
            self.save_deadline,
            self.store.upsert_cart_line(user, product_id, variant_id, merged),
        )
        .await?;

        self.detail(user).await
    }

    /// Set the absolute quantity of a line; zero removes it.
    #[instrument(skip(self), fields(user_id = %user))]
    pub async fn update(
        &self,
        user: UserId,
        product_id: ProductId,
        variant_id: VariantId,
        quantity: u32,
    ) -> Result<CartDetail> {
        if quantity == 0 {
            return self.remove(user, product_id, variant_id).await;
        }

        let (product, variant) = self.lookup(product_id, variant_id).await?;
        if i64::from(quantity) > variant.stock {
            return Err(AppError::InsufficientStock {
                product: product.name,
            });
        }

        with_deadline(
            self.save_deadline,
            self.store
                .upsert_cart_line(user, product_id, variant_id, quantity),
        )
        .await?;

        self.detail(user).await
    }

    /// Remove one line from the cart.
    #[instrument(skip(self), fields(user_id = %user))]
    pub async fn remove(
        &self,
        user: UserId,
        product_id: ProductId,
        variant_id: VariantId,
    ) -> Result<CartDetail> {
        let removed = with_deadline(
            self.save_deadline,
            self.store.remove_cart_line(user, product_id, variant_id),
        )
        .await?;
        if !removed {
            return Err(AppError::NotFound("cart line".to_owned()));
        }
        self.detail(user).await
    }

    /// The cart joined against the live catalog.
    ///
    /// Lines whose product or variant has vanished from the catalog are
    /// omitted from the view rather than failing the whole cart.
    pub async fn detail(&self, user: UserId) -> Result<CartDetail> {
        let Some(cart) = self.store.get_cart(user).await? else {
            return Ok(CartDetail::empty());
        };

        let mut lines = Vec::with_capacity(cart.lines.len());
        let mut total_amount = Money::ZERO;
        for line in &cart.lines {
            let Some(product) = self.store.get_product(line.product_id).await? else {
                continue;
            };
            let Some(variant) = product.variant(line.variant_id) else {
                continue;
            };

            let unit_price = UnitPrice::resolve(variant.price, product.base_price);
            let line_total = unit_price.amount().times(line.quantity);
            total_amount += line_total;
            lines.push(CartLineDetail {
                product_id: product.id,
                variant_id: variant.id,
                product_name: product.name.clone(),
                quantity: line.quantity,
                unit_price,
                line_total,
                in_stock: variant.stock,
            });
        }

        Ok(CartDetail {
            lines,
            total_amount,
        })
    }

    async fn lookup(
        &self,
        product_id: ProductId,
        variant_id: VariantId,
    ) -> Result<(Product, Variant)> {
        let product = self
            .store
            .get_product(product_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("product {product_id}")))?;
        let variant = product
            .variant(variant_id)
            .cloned()
            .ok_or_else(|| {
                AppError::NotFound(format!("variant {variant_id} of product {product_id}"))
            })?;
        Ok((product, variant))
    }
}
