//! In-memory store implementation.
//!
//! Backs the service unit tests and the HTTP integration tests. A single
//! `RwLock` over all state gives the same atomicity the database store
//! gets from transactions: `create_order` verifies every line under the
//! write lock before mutating anything.

use std::collections::{BTreeMap, HashMap, HashSet};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use atelier_core::{CartId, OrderId, OrderStatus, PaymentStatus, ProductId, UserId, VariantId};

use super::{Store, StoreError};
use crate::models::{
    Cart, CartLine, NewOrder, NewProduct, Order, OrderFilter, Product, Variant,
};

#[derive(Default)]
struct Inner {
    products: BTreeMap<i64, Product>,
    carts: HashMap<UserId, Cart>,
    orders: BTreeMap<i64, Order>,
    order_numbers: HashSet<String>,
    next_product_id: i64,
    next_variant_id: i64,
    next_cart_id: i64,
    next_order_id: i64,
}

impl Inner {
    fn variant_mut(
        &mut self,
        product_id: ProductId,
        variant_id: VariantId,
    ) -> Option<&mut Variant> {
        self.products
            .get_mut(&product_id.as_i64())
            .and_then(|p| p.variants.iter_mut().find(|v| v.id == variant_id))
    }

    fn variant_stock(&self, product_id: ProductId, variant_id: VariantId) -> Option<i64> {
        self.products
            .get(&product_id.as_i64())
            .and_then(|p| p.variants.iter().find(|v| v.id == variant_id))
            .map(|v| v.stock)
    }
}

/// In-memory [`Store`], primarily for tests.
#[derive(Default)]
pub struct MemStore {
    inner: RwLock<Inner>,
}

impl MemStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Store for MemStore {
    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }

    async fn create_product(&self, input: NewProduct) -> Result<Product, StoreError> {
        let mut inner = self.inner.write().await;

        if inner.products.values().any(|p| p.sku == input.sku) {
            return Err(StoreError::Conflict("SKU already exists".to_owned()));
        }

        inner.next_product_id += 1;
        let id = ProductId::from(inner.next_product_id);

        let mut variants = Vec::with_capacity(input.variants.len());
        for v in input.variants {
            inner.next_variant_id += 1;
            variants.push(Variant {
                id: VariantId::from(inner.next_variant_id),
                color_id: v.color_id,
                size_id: v.size_id,
                price: v.price,
                stock: v.stock,
            });
        }

        let now = Utc::now();
        let product = Product {
            id,
            name: input.name,
            description: input.description,
            base_price: input.base_price,
            category_id: input.category_id,
            sku: input.sku,
            seller: input.seller,
            tags: input.tags,
            variants,
            created_at: now,
            updated_at: now,
        };
        inner.products.insert(id.as_i64(), product.clone());
        Ok(product)
    }

    async fn get_product(&self, id: ProductId) -> Result<Option<Product>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner.products.get(&id.as_i64()).cloned())
    }

    async fn list_products(
        &self,
        offset: u64,
        limit: u32,
    ) -> Result<(Vec<Product>, u64), StoreError> {
        let inner = self.inner.read().await;
        let total = inner.products.len() as u64;
        // IDs are monotonic, so reverse iteration is newest-first.
        let page = inner
            .products
            .values()
            .rev()
            .skip(usize::try_from(offset).unwrap_or(usize::MAX))
            .take(limit as usize)
            .cloned()
            .collect();
        Ok((page, total))
    }

    async fn adjust_stock(
        &self,
        product_id: ProductId,
        variant_id: VariantId,
        delta: i64,
    ) -> Result<bool, StoreError> {
        let mut inner = self.inner.write().await;
        let Some(variant) = inner.variant_mut(product_id, variant_id) else {
            return Ok(false);
        };
        if variant.stock + delta < 0 {
            return Ok(false);
        }
        variant.stock += delta;
        Ok(true)
    }

    async fn get_cart(&self, user_id: UserId) -> Result<Option<Cart>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner.carts.get(&user_id).cloned())
    }

    async fn upsert_cart_line(
        &self,
        user_id: UserId,
        product_id: ProductId,
        variant_id: VariantId,
        quantity: u32,
    ) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        let Inner {
            carts,
            next_cart_id,
            ..
        } = &mut *inner;
        let cart = carts.entry(user_id).or_insert_with(|| {
            *next_cart_id += 1;
            Cart {
                id: CartId::from(*next_cart_id),
                user_id,
                lines: Vec::new(),
                updated_at: Utc::now(),
            }
        });

        match cart
            .lines
            .iter_mut()
            .find(|l| l.product_id == product_id && l.variant_id == variant_id)
        {
            Some(line) => line.quantity = quantity,
            None => cart.lines.push(CartLine {
                product_id,
                variant_id,
                quantity,
            }),
        }
        cart.updated_at = Utc::now();
        Ok(())
    }

    async fn remove_cart_line(
        &self,
        user_id: UserId,
        product_id: ProductId,
        variant_id: VariantId,
    ) -> Result<bool, StoreError> {
        let mut inner = self.inner.write().await;
        let Some(cart) = inner.carts.get_mut(&user_id) else {
            return Ok(false);
        };
        let before = cart.lines.len();
        cart.lines
            .retain(|l| !(l.product_id == product_id && l.variant_id == variant_id));
        let removed = cart.lines.len() < before;
        if removed {
            cart.updated_at = Utc::now();
        }
        Ok(removed)
    }

    async fn clear_cart(&self, user_id: UserId) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        if let Some(cart) = inner.carts.get_mut(&user_id) {
            cart.lines.clear();
            cart.updated_at = Utc::now();
        }
        Ok(())
    }

    async fn order_number_exists(&self, order_number: &str) -> Result<bool, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner.order_numbers.contains(order_number))
    }

    async fn create_order(&self, order: NewOrder) -> Result<Order, StoreError> {
        let mut inner = self.inner.write().await;

        if inner.order_numbers.contains(&order.order_number) {
            return Err(StoreError::Conflict(
                "order number already exists".to_owned(),
            ));
        }

        // First pass only verifies; nothing is decremented until every
        // line is known to be satisfiable.
        for line in &order.lines {
            let available = inner.variant_stock(line.product_id, line.variant_id);
            if available.is_none_or(|stock| stock < i64::from(line.quantity)) {
                return Err(StoreError::StockConflict {
                    product: line.product_name.clone(),
                });
            }
        }

        for line in &order.lines {
            if let Some(variant) = inner.variant_mut(line.product_id, line.variant_id) {
                variant.stock -= i64::from(line.quantity);
            }
        }

        inner.next_order_id += 1;
        let id = OrderId::from(inner.next_order_id);
        let now = Utc::now();
        let stored = Order {
            id,
            user_id: order.user_id,
            order_number: order.order_number.clone(),
            lines: order.lines,
            totals: order.totals,
            shipping_address: order.shipping_address,
            payment_method: order.payment_method,
            payment_status: PaymentStatus::Pending,
            paid_at: None,
            status: OrderStatus::Pending,
            delivered_at: None,
            note: order.note,
            created_at: now,
            updated_at: now,
        };
        inner.order_numbers.insert(order.order_number);
        inner.orders.insert(id.as_i64(), stored.clone());
        Ok(stored)
    }

    async fn get_order(&self, id: OrderId) -> Result<Option<Order>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner.orders.get(&id.as_i64()).cloned())
    }

    async fn list_orders_for_user(&self, user_id: UserId) -> Result<Vec<Order>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner
            .orders
            .values()
            .rev()
            .filter(|o| o.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn list_orders(
        &self,
        filter: OrderFilter,
        offset: u64,
        limit: u32,
    ) -> Result<(Vec<Order>, u64), StoreError> {
        let inner = self.inner.read().await;
        let matching: Vec<&Order> = inner
            .orders
            .values()
            .rev()
            .filter(|o| filter.status.is_none_or(|s| o.status == s))
            .filter(|o| filter.payment_status.is_none_or(|s| o.payment_status == s))
            .filter(|o| filter.created_from.is_none_or(|t| o.created_at >= t))
            .filter(|o| filter.created_to.is_none_or(|t| o.created_at <= t))
            .filter(|o| filter.min_total.is_none_or(|m| o.totals.grand_total >= m))
            .filter(|o| filter.max_total.is_none_or(|m| o.totals.grand_total <= m))
            .collect();
        let total = matching.len() as u64;
        let page = matching
            .into_iter()
            .skip(usize::try_from(offset).unwrap_or(usize::MAX))
            .take(limit as usize)
            .cloned()
            .collect();
        Ok((page, total))
    }

    async fn transition_order_status(
        &self,
        id: OrderId,
        from: OrderStatus,
        to: OrderStatus,
    ) -> Result<bool, StoreError> {
        let mut inner = self.inner.write().await;
        let Some(order) = inner.orders.get_mut(&id.as_i64()) else {
            return Ok(false);
        };
        if order.status != from {
            return Ok(false);
        }
        order.status = to;
        order.updated_at = Utc::now();
        Ok(true)
    }

    async fn set_order_status(
        &self,
        id: OrderId,
        to: OrderStatus,
        delivered_at: Option<DateTime<Utc>>,
    ) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        let order = inner
            .orders
            .get_mut(&id.as_i64())
            .ok_or_else(|| StoreError::NotFound(format!("order {id}")))?;
        order.status = to;
        if delivered_at.is_some() {
            order.delivered_at = delivered_at;
        }
        order.updated_at = Utc::now();
        Ok(())
    }

    async fn mark_order_paid(
        &self,
        id: OrderId,
        paid_at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        let order = inner
            .orders
            .get_mut(&id.as_i64())
            .ok_or_else(|| StoreError::NotFound(format!("order {id}")))?;
        order.payment_status = PaymentStatus::Paid;
        order.paid_at = Some(paid_at);
        order.updated_at = Utc::now();
        Ok(())
    }
}
