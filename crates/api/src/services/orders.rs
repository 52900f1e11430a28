//! Order engine and lifecycle.
//!
//! Checkout runs in two phases: every line is validated and priced
//! against the live catalog first, then the store applies all stock
//! decrements and the order insert in one transaction. Cancellation is
//! the compensating path: a compare-and-set away from `PENDING` followed
//! by per-line stock restoration.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use rand::Rng;
use serde::Deserialize;
use tracing::{instrument, warn};

use atelier_core::{
    OrderId, OrderStatus, PaymentMethod, PaymentStatus, PricingPolicy, Principal, UnitPrice,
    UserId,
};

use super::with_deadline;
use crate::error::{AppError, Result};
use crate::models::{
    CheckoutLine, NewOrder, Order, OrderFilter, OrderLine, Pagination, ShippingAddress,
};
use crate::store::Store;

/// Attempts at finding an unused order number before giving up. The
/// unique index on `order_number` backstops the race window between the
/// availability probe and the insert.
const MAX_ORDER_NUMBER_ATTEMPTS: u32 = 5;

/// Checkout request payload.
///
/// Lines come either explicitly in the request or, with `from_cart`,
/// from the caller's saved cart.
#[derive(Debug, Clone, Deserialize)]
pub struct CheckoutRequest {
    #[serde(default)]
    pub lines: Vec<CheckoutLine>,
    /// Checkout the saved cart instead of explicit lines.
    #[serde(default)]
    pub from_cart: bool,
    pub shipping_address: ShippingAddress,
    pub payment_method: PaymentMethod,
    #[serde(default)]
    pub note: Option<String>,
}

/// Admin status-update payload.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct StatusUpdate {
    pub status: OrderStatus,
}

#[derive(Clone)]
pub struct OrderService {
    store: Arc<dyn Store>,
    pricing: PricingPolicy,
    save_deadline: Duration,
}

impl OrderService {
    pub fn new(store: Arc<dyn Store>, pricing: PricingPolicy, save_deadline: Duration) -> Self {
        Self {
            store,
            pricing,
            save_deadline,
        }
    }

    /// Validate, price, and persist an order for `user`.
    ///
    /// # Errors
    ///
    /// [`AppError::Validation`] for an empty line list, a zero quantity,
    /// or a blank address field; [`AppError::NotFound`] for an unknown
    /// product or variant; [`AppError::InsufficientStock`] when any line
    /// exceeds live stock (in which case no stock was touched).
    #[instrument(skip(self, request), fields(user_id = %user))]
    pub async fn checkout(&self, user: UserId, request: CheckoutRequest) -> Result<Order> {
        self.checkout_with(user, request, &mut order_number_candidate)
            .await
    }

    /// Checkout with an injectable order-number source (tests exercise
    /// the collision retry through this).
    pub(crate) async fn checkout_with(
        &self,
        user: UserId,
        request: CheckoutRequest,
        candidates: &mut (dyn FnMut() -> String + Send),
    ) -> Result<Order> {
        let requested = if request.from_cart {
            let cart = self.store.get_cart(user).await?;
            cart.map(|c| {
                c.lines
                    .iter()
                    .map(|l| CheckoutLine {
                        product_id: l.product_id,
                        variant_id: l.variant_id,
                        quantity: l.quantity,
                    })
                    .collect()
            })
            .unwrap_or_default()
        } else {
            request.lines.clone()
        };

        if requested.is_empty() {
            return Err(AppError::Validation("order has no lines".to_owned()));
        }
        if let Err(field) = request.shipping_address.validate() {
            return Err(AppError::Validation(format!(
                "shipping address: {field} is required"
            )));
        }

        // Phase one: validate and price every line before anything mutates.
        let mut lines = Vec::with_capacity(requested.len());
        for line in &requested {
            lines.push(self.price_line(*line).await?);
        }

        let items_subtotal = lines
            .iter()
            .map(OrderLine::line_total)
            .fold(atelier_core::Money::ZERO, |acc, t| acc + t);
        let totals = self.pricing.quote(items_subtotal);

        let order_number = self.unique_order_number(candidates).await?;

        // Phase two: one transaction decrements stock and inserts the order.
        let order = with_deadline(
            self.save_deadline,
            self.store.create_order(NewOrder {
                user_id: user,
                order_number,
                lines,
                totals,
                shipping_address: request.shipping_address,
                payment_method: request.payment_method,
                note: request.note,
            }),
        )
        .await?;

        // Only a cart-sourced checkout consumes the cart. The order is
        // already committed, so a failed sweep must not fail it.
        if request.from_cart
            && let Err(err) = self.store.clear_cart(user).await
        {
            warn!(user_id = %user, error = %err, "Failed to clear cart after checkout");
        }

        Ok(order)
    }

    /// Validate one requested line against the live catalog and capture
    /// its price.
    async fn price_line(&self, line: CheckoutLine) -> Result<OrderLine> {
        if line.quantity == 0 {
            return Err(AppError::Validation(
                "line quantity must be at least 1".to_owned(),
            ));
        }

        let product = self
            .store
            .get_product(line.product_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("product {}", line.product_id)))?;
        let variant = product.variant(line.variant_id).ok_or_else(|| {
            AppError::NotFound(format!(
                "variant {} of product {}",
                line.variant_id, line.product_id
            ))
        })?;

        if variant.stock < i64::from(line.quantity) {
            return Err(AppError::InsufficientStock {
                product: product.name.clone(),
            });
        }

        Ok(OrderLine {
            product_id: product.id,
            variant_id: variant.id,
            product_name: product.name.clone(),
            quantity: line.quantity,
            unit_price: UnitPrice::resolve(variant.price, product.base_price),
        })
    }

    async fn unique_order_number(
        &self,
        candidates: &mut (dyn FnMut() -> String + Send),
    ) -> Result<String> {
        for _ in 0..MAX_ORDER_NUMBER_ATTEMPTS {
            let candidate = candidates();
            if !self.store.order_number_exists(&candidate).await? {
                return Ok(candidate);
            }
        }
        Err(AppError::Internal(
            "could not allocate a unique order number".to_owned(),
        ))
    }

    /// Fetch one order, enforcing ownership.
    pub async fn get(&self, principal: &Principal, id: OrderId) -> Result<Order> {
        let order = self
            .store
            .get_order(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("order {id}")))?;
        if !principal.can_act_on(order.user_id) {
            return Err(AppError::Forbidden("not your order".to_owned()));
        }
        Ok(order)
    }

    /// All orders belonging to the caller, newest first.
    pub async fn list_mine(&self, user: UserId) -> Result<Vec<Order>> {
        Ok(self.store.list_orders_for_user(user).await?)
    }

    /// Filtered, paginated listing of every order. Admin only.
    pub async fn admin_list(
        &self,
        principal: &Principal,
        filter: OrderFilter,
        page: u32,
        limit: u32,
    ) -> Result<(Vec<Order>, Pagination)> {
        if !principal.can_manage_orders() {
            return Err(AppError::Forbidden(
                "order management permission required".to_owned(),
            ));
        }
        let offset = Pagination::offset(page, limit);
        let (orders, total) = self.store.list_orders(filter, offset, limit).await?;
        Ok((orders, Pagination::new(total, page, limit)))
    }

    /// Cancel a pending order and restore its stock.
    ///
    /// The compare-and-set from `PENDING` doubles as the idempotence
    /// guard: a repeat cancel (or a cancel racing a confirmation) loses
    /// the CAS and surfaces as a conflict, so stock is restored at most
    /// once.
    #[instrument(skip(self, principal), fields(order_id = %id))]
    pub async fn cancel(&self, principal: &Principal, id: OrderId) -> Result<Order> {
        let order = self.get(principal, id).await?;

        if !order.status.can_cancel() {
            return Err(AppError::Conflict(format!(
                "order in status {} cannot be cancelled",
                order.status
            )));
        }

        let transitioned = with_deadline(
            self.save_deadline,
            self.store
                .transition_order_status(id, OrderStatus::Pending, OrderStatus::Cancelled),
        )
        .await?;
        if !transitioned {
            return Err(AppError::Conflict(
                "order was already confirmed or cancelled".to_owned(),
            ));
        }

        for line in &order.lines {
            let restored = self
                .store
                .adjust_stock(line.product_id, line.variant_id, i64::from(line.quantity))
                .await?;
            if !restored {
                // The variant is gone from the catalog; the order itself
                // is still cancelled.
                warn!(
                    order_id = %id,
                    product_id = %line.product_id,
                    variant_id = %line.variant_id,
                    "Could not restore stock for cancelled order line"
                );
            }
        }

        self.reload(id).await
    }

    /// Administrative status update.
    ///
    /// `DELIVERED` stamps the delivery timestamp; `CANCELLED` goes
    /// through the same compare-and-set-plus-restore path as a customer
    /// cancel, so stock stays consistent whichever side cancels.
    #[instrument(skip(self, principal), fields(order_id = %id, status = %update.status))]
    pub async fn update_status(
        &self,
        principal: &Principal,
        id: OrderId,
        update: StatusUpdate,
    ) -> Result<Order> {
        if !principal.can_manage_orders() {
            return Err(AppError::Forbidden(
                "order management permission required".to_owned(),
            ));
        }

        if update.status == OrderStatus::Cancelled {
            return self.cancel(principal, id).await;
        }

        // Existence check before the unconditional update.
        self.store
            .get_order(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("order {id}")))?;

        let delivered_at = (update.status == OrderStatus::Delivered).then(Utc::now);
        with_deadline(
            self.save_deadline,
            self.store.set_order_status(id, update.status, delivered_at),
        )
        .await?;

        self.reload(id).await
    }

    /// Record payment for an order. Owner or admin.
    #[instrument(skip(self, principal), fields(order_id = %id))]
    pub async fn mark_paid(&self, principal: &Principal, id: OrderId) -> Result<Order> {
        let order = self.get(principal, id).await?;

        if order.payment_status == PaymentStatus::Paid {
            return Err(AppError::Conflict("order is already paid".to_owned()));
        }

        with_deadline(
            self.save_deadline,
            self.store.mark_order_paid(id, Utc::now()),
        )
        .await?;

        self.reload(id).await
    }

    async fn reload(&self, id: OrderId) -> Result<Order> {
        self.store
            .get_order(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("order {id}")))
    }
}

/// Default order-number shape: `ORD` + epoch millis + a 0..999 suffix.
fn order_number_candidate() -> String {
    let millis = Utc::now().timestamp_millis();
    let suffix = rand::rng().random_range(0..1000);
    format!("ORD{millis}{suffix}")
}

#[cfg(test)]
mod tests {
    use super::*;

    use atelier_core::{CategoryId, ColorId, Money, SizeId};
    use crate::models::{NewProduct, NewVariant, Product};
    use crate::store::MemStore;

    fn service(store: Arc<MemStore>) -> OrderService {
        OrderService::new(store, PricingPolicy::default(), Duration::from_secs(5))
    }

    async fn seed_product(store: &MemStore, sku: &str, base_price: i64, stock: i64) -> Product {
        store
            .create_product(NewProduct {
                name: format!("Product {sku}"),
                description: String::new(),
                base_price: Money::new(base_price),
                category_id: CategoryId::from(1),
                sku: sku.to_owned(),
                seller: "Admin".to_owned(),
                tags: vec![],
                variants: vec![NewVariant {
                    color_id: ColorId::from(1),
                    size_id: SizeId::from(1),
                    price: None,
                    stock,
                }],
            })
            .await
            .unwrap()
    }

    fn address() -> ShippingAddress {
        ShippingAddress {
            full_name: "Nguyen Van A".to_owned(),
            phone: "0900000000".to_owned(),
            address: "12 Hang Bac".to_owned(),
            city: "Ha Noi".to_owned(),
            district: "Hoan Kiem".to_owned(),
            ward: "Hang Bac".to_owned(),
        }
    }

    fn request(lines: Vec<CheckoutLine>) -> CheckoutRequest {
        CheckoutRequest {
            lines,
            from_cart: false,
            shipping_address: address(),
            payment_method: PaymentMethod::Cod,
            note: None,
        }
    }

    fn line(product: &Product, quantity: u32) -> CheckoutLine {
        CheckoutLine {
            product_id: product.id,
            variant_id: product.variants[0].id,
            quantity,
        }
    }

    #[tokio::test]
    async fn checkout_prices_and_totals() {
        let store = Arc::new(MemStore::new());
        let svc = service(Arc::clone(&store));
        let product = seed_product(&store, "SKU-1", 120_000, 10).await;

        let order = svc
            .checkout(UserId::from(7), request(vec![line(&product, 2)]))
            .await
            .unwrap();

        assert_eq!(order.totals.items_subtotal, Money::new(240_000));
        assert_eq!(order.totals.shipping_fee, Money::new(30_000));
        assert_eq!(order.totals.tax_amount, Money::new(24_000));
        assert_eq!(order.totals.grand_total, Money::new(294_000));
        assert!(order.order_number.starts_with("ORD"));
        assert_eq!(order.status, OrderStatus::Pending);
    }

    #[tokio::test]
    async fn checkout_over_threshold_ships_free() {
        let store = Arc::new(MemStore::new());
        let svc = service(Arc::clone(&store));
        let product = seed_product(&store, "SKU-1", 500_001, 5).await;

        let order = svc
            .checkout(UserId::from(7), request(vec![line(&product, 1)]))
            .await
            .unwrap();
        assert_eq!(order.totals.shipping_fee, Money::ZERO);
    }

    #[tokio::test]
    async fn checkout_at_threshold_pays_flat_fee() {
        let store = Arc::new(MemStore::new());
        let svc = service(Arc::clone(&store));
        let product = seed_product(&store, "SKU-1", 500_000, 5).await;

        let order = svc
            .checkout(UserId::from(7), request(vec![line(&product, 1)]))
            .await
            .unwrap();
        assert_eq!(order.totals.shipping_fee, Money::new(30_000));
    }

    #[tokio::test]
    async fn multi_line_shortfall_touches_no_stock() {
        let store = Arc::new(MemStore::new());
        let svc = service(Arc::clone(&store));
        let plenty = seed_product(&store, "SKU-1", 100_000, 10).await;
        let scarce = seed_product(&store, "SKU-2", 100_000, 1).await;

        let err = svc
            .checkout(
                UserId::from(7),
                request(vec![line(&plenty, 5), line(&scarce, 2)]),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::InsufficientStock { .. }));

        let p = store.get_product(plenty.id).await.unwrap().unwrap();
        let s = store.get_product(scarce.id).await.unwrap().unwrap();
        assert_eq!(p.variants[0].stock, 10);
        assert_eq!(s.variants[0].stock, 1);
    }

    #[tokio::test]
    async fn checkout_rejects_empty_and_zero_quantity() {
        let store = Arc::new(MemStore::new());
        let svc = service(Arc::clone(&store));
        let product = seed_product(&store, "SKU-1", 100_000, 10).await;

        let err = svc
            .checkout(UserId::from(7), request(vec![]))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));

        let err = svc
            .checkout(UserId::from(7), request(vec![line(&product, 0)]))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn checkout_rejects_blank_address_field() {
        let store = Arc::new(MemStore::new());
        let svc = service(Arc::clone(&store));
        let product = seed_product(&store, "SKU-1", 100_000, 10).await;

        let mut req = request(vec![line(&product, 1)]);
        req.shipping_address.phone = "  ".to_owned();
        let err = svc.checkout(UserId::from(7), req).await.unwrap_err();
        match err {
            AppError::Validation(msg) => assert!(msg.contains("phone")),
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn order_number_collision_retries() {
        let store = Arc::new(MemStore::new());
        let svc = service(Arc::clone(&store));
        let product = seed_product(&store, "SKU-1", 100_000, 10).await;

        // First order takes "ORD-TAKEN".
        let mut fixed = || "ORD-TAKEN".to_owned();
        svc.checkout_with(UserId::from(1), request(vec![line(&product, 1)]), &mut fixed)
            .await
            .unwrap();

        // Second checkout's generator collides once, then yields a
        // fresh number.
        let mut calls = 0;
        let mut colliding = move || {
            calls += 1;
            if calls == 1 {
                "ORD-TAKEN".to_owned()
            } else {
                "ORD-FRESH".to_owned()
            }
        };
        let order = svc
            .checkout_with(
                UserId::from(2),
                request(vec![line(&product, 1)]),
                &mut colliding,
            )
            .await
            .unwrap();
        assert_eq!(order.order_number, "ORD-FRESH");
    }

    #[tokio::test]
    async fn exhausted_order_numbers_fail_internally() {
        let store = Arc::new(MemStore::new());
        let svc = service(Arc::clone(&store));
        let product = seed_product(&store, "SKU-1", 100_000, 10).await;

        let mut fixed = || "ORD-TAKEN".to_owned();
        svc.checkout_with(UserId::from(1), request(vec![line(&product, 1)]), &mut fixed)
            .await
            .unwrap();

        let err = svc
            .checkout_with(UserId::from(2), request(vec![line(&product, 1)]), &mut fixed)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Internal(_)));
    }

    #[tokio::test]
    async fn cancel_restores_stock_exactly_once() {
        let store = Arc::new(MemStore::new());
        let svc = service(Arc::clone(&store));
        let product = seed_product(&store, "SKU-1", 100_000, 10).await;
        let user = UserId::from(7);

        let order = svc
            .checkout(user, request(vec![line(&product, 4)]))
            .await
            .unwrap();
        assert_eq!(
            store.get_product(product.id).await.unwrap().unwrap().variants[0].stock,
            6
        );

        let principal = Principal::customer(user);
        let cancelled = svc.cancel(&principal, order.id).await.unwrap();
        assert_eq!(cancelled.status, OrderStatus::Cancelled);
        assert_eq!(
            store.get_product(product.id).await.unwrap().unwrap().variants[0].stock,
            10
        );

        // Repeat cancel is a conflict and restores nothing further.
        let err = svc.cancel(&principal, order.id).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
        assert_eq!(
            store.get_product(product.id).await.unwrap().unwrap().variants[0].stock,
            10
        );
    }

    #[tokio::test]
    async fn cancel_requires_ownership() {
        let store = Arc::new(MemStore::new());
        let svc = service(Arc::clone(&store));
        let product = seed_product(&store, "SKU-1", 100_000, 10).await;

        let order = svc
            .checkout(UserId::from(7), request(vec![line(&product, 1)]))
            .await
            .unwrap();

        let stranger = Principal::customer(UserId::from(8));
        let err = svc.cancel(&stranger, order.id).await.unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));

        // Admins act on any order.
        let admin = Principal::admin(UserId::from(1));
        assert!(svc.cancel(&admin, order.id).await.is_ok());
    }

    #[tokio::test]
    async fn delivered_stamps_timestamp_and_blocks_cancel() {
        let store = Arc::new(MemStore::new());
        let svc = service(Arc::clone(&store));
        let product = seed_product(&store, "SKU-1", 100_000, 10).await;
        let user = UserId::from(7);

        let order = svc
            .checkout(user, request(vec![line(&product, 1)]))
            .await
            .unwrap();

        let admin = Principal::admin(UserId::from(1));
        let delivered = svc
            .update_status(
                &admin,
                order.id,
                StatusUpdate {
                    status: OrderStatus::Delivered,
                },
            )
            .await
            .unwrap();
        assert_eq!(delivered.status, OrderStatus::Delivered);
        assert!(delivered.delivered_at.is_some());

        let err = svc
            .cancel(&Principal::customer(user), order.id)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[tokio::test]
    async fn admin_cancel_restores_stock() {
        let store = Arc::new(MemStore::new());
        let svc = service(Arc::clone(&store));
        let product = seed_product(&store, "SKU-1", 100_000, 10).await;

        let order = svc
            .checkout(UserId::from(7), request(vec![line(&product, 3)]))
            .await
            .unwrap();

        let admin = Principal::admin(UserId::from(1));
        let cancelled = svc
            .update_status(
                &admin,
                order.id,
                StatusUpdate {
                    status: OrderStatus::Cancelled,
                },
            )
            .await
            .unwrap();
        assert_eq!(cancelled.status, OrderStatus::Cancelled);
        assert_eq!(
            store.get_product(product.id).await.unwrap().unwrap().variants[0].stock,
            10
        );
    }

    #[tokio::test]
    async fn update_status_requires_manage_permission() {
        let store = Arc::new(MemStore::new());
        let svc = service(Arc::clone(&store));
        let product = seed_product(&store, "SKU-1", 100_000, 10).await;
        let user = UserId::from(7);

        let order = svc
            .checkout(user, request(vec![line(&product, 1)]))
            .await
            .unwrap();

        let err = svc
            .update_status(
                &Principal::customer(user),
                order.id,
                StatusUpdate {
                    status: OrderStatus::Confirmed,
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));
    }

    #[tokio::test]
    async fn mark_paid_is_not_repeatable() {
        let store = Arc::new(MemStore::new());
        let svc = service(Arc::clone(&store));
        let product = seed_product(&store, "SKU-1", 100_000, 10).await;
        let user = UserId::from(7);

        let order = svc
            .checkout(user, request(vec![line(&product, 1)]))
            .await
            .unwrap();

        let principal = Principal::customer(user);
        let paid = svc.mark_paid(&principal, order.id).await.unwrap();
        assert_eq!(paid.payment_status, PaymentStatus::Paid);
        assert!(paid.paid_at.is_some());

        let err = svc.mark_paid(&principal, order.id).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[tokio::test]
    async fn checkout_from_cart_uses_saved_lines() {
        let store = Arc::new(MemStore::new());
        let svc = service(Arc::clone(&store));
        let product = seed_product(&store, "SKU-1", 100_000, 10).await;
        let user = UserId::from(7);

        store
            .upsert_cart_line(user, product.id, product.variants[0].id, 3)
            .await
            .unwrap();

        let mut req = request(vec![]);
        req.from_cart = true;
        let order = svc.checkout(user, req).await.unwrap();
        assert_eq!(order.lines.len(), 1);
        assert_eq!(order.lines[0].quantity, 3);

        // An empty cart checks out to nothing.
        let mut req = request(vec![]);
        req.from_cart = true;
        let err = svc.checkout(user, req).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn checkout_sweeps_cart_only_when_cart_sourced() {
        let store = Arc::new(MemStore::new());
        let svc = service(Arc::clone(&store));
        let bought = seed_product(&store, "SKU-1", 100_000, 10).await;
        let saved = seed_product(&store, "SKU-2", 80_000, 10).await;
        let user = UserId::from(7);

        store
            .upsert_cart_line(user, saved.id, saved.variants[0].id, 1)
            .await
            .unwrap();

        // Buying explicit lines leaves the saved cart alone.
        svc.checkout(user, request(vec![line(&bought, 2)]))
            .await
            .unwrap();
        let cart = store.get_cart(user).await.unwrap().unwrap();
        assert_eq!(cart.lines.len(), 1);
        assert_eq!(cart.lines[0].product_id, saved.id);

        // A cart-sourced checkout consumes it.
        let mut req = request(vec![]);
        req.from_cart = true;
        svc.checkout(user, req).await.unwrap();
        let cart = store.get_cart(user).await.unwrap().unwrap();
        assert!(cart.lines.is_empty());
    }

    #[tokio::test]
    async fn admin_listing_filters_and_paginates() {
        let store = Arc::new(MemStore::new());
        let svc = service(Arc::clone(&store));
        let product = seed_product(&store, "SKU-1", 100_000, 100).await;

        for i in 0..3 {
            svc.checkout(UserId::from(i), request(vec![line(&product, 1)]))
                .await
                .unwrap();
        }
        let admin = Principal::admin(UserId::from(1));
        let some_order = svc.list_mine(UserId::from(0)).await.unwrap()[0].id;
        svc.cancel(&admin, some_order).await.unwrap();

        let (all, pagination) = svc
            .admin_list(&admin, OrderFilter::default(), 1, 2)
            .await
            .unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(pagination.total, 3);
        assert_eq!(pagination.total_pages, 2);

        let (cancelled, _) = svc
            .admin_list(
                &admin,
                OrderFilter {
                    status: Some(OrderStatus::Cancelled),
                    ..OrderFilter::default()
                },
                1,
                10,
            )
            .await
            .unwrap();
        assert_eq!(cancelled.len(), 1);
        assert_eq!(cancelled[0].status, OrderStatus::Cancelled);

        let err = svc
            .admin_list(
                &Principal::customer(UserId::from(9)),
                OrderFilter::default(),
                1,
                10,
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));
    }

    #[tokio::test]
    async fn admin_listing_filters_by_date_and_amount_range() {
        let store = Arc::new(MemStore::new());
        let svc = service(Arc::clone(&store));
        let product = seed_product(&store, "SKU-1", 100_000, 100).await;
        let admin = Principal::admin(UserId::from(1));

        // grand totals: 140_000 (1 unit) and 580_000 (5 units).
        svc.checkout(UserId::from(1), request(vec![line(&product, 1)]))
            .await
            .unwrap();
        svc.checkout(UserId::from(2), request(vec![line(&product, 5)]))
            .await
            .unwrap();

        let (large, pagination) = svc
            .admin_list(
                &admin,
                OrderFilter {
                    min_total: Some(Money::new(200_000)),
                    ..OrderFilter::default()
                },
                1,
                10,
            )
            .await
            .unwrap();
        assert_eq!(pagination.total, 1);
        assert_eq!(large[0].totals.grand_total, Money::new(580_000));

        let (small, _) = svc
            .admin_list(
                &admin,
                OrderFilter {
                    max_total: Some(Money::new(200_000)),
                    ..OrderFilter::default()
                },
                1,
                10,
            )
            .await
            .unwrap();
        assert_eq!(small.len(), 1);
        assert_eq!(small[0].totals.grand_total, Money::new(140_000));

        // Both orders were just created, so a window starting in the
        // future excludes them and one ending in the future keeps them.
        let future = Utc::now() + chrono::Duration::hours(1);
        let (none, _) = svc
            .admin_list(
                &admin,
                OrderFilter {
                    created_from: Some(future),
                    ..OrderFilter::default()
                },
                1,
                10,
            )
            .await
            .unwrap();
        assert!(none.is_empty());

        let (both, _) = svc
            .admin_list(
                &admin,
                OrderFilter {
                    created_to: Some(future),
                    ..OrderFilter::default()
                },
                1,
                10,
            )
            .await
            .unwrap();
        assert_eq!(both.len(), 2);
    }
}
