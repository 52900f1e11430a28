//! `PostgreSQL` store implementation.
//!
//! All queries go through the sqlx runtime API; row structs are private
//! and converted into domain types at the edge, with invalid persisted
//! data mapped to [`StoreError::DataCorruption`].

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;

use atelier_core::{
    CartId, CategoryId, ColorId, Money, OrderId, OrderStatus, PaymentMethod, PaymentStatus,
    PriceSource, ProductId, SizeId, Totals, UnitPrice, UserId, VariantId,
};

use super::{Store, StoreError};
use crate::models::{
    Cart, CartLine, NewOrder, NewProduct, Order, OrderFilter, OrderLine, Product,
    ShippingAddress, Variant,
};

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}

/// `PostgreSQL`-backed [`Store`].
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    /// Wrap an existing connection pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Access the underlying pool (used by the CLI).
    #[must_use]
    pub const fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Load variants for a set of products, keyed by product ID.
    async fn variants_for(
        &self,
        product_ids: &[i64],
    ) -> Result<HashMap<ProductId, Vec<Variant>>, StoreError> {
        let rows: Vec<VariantRow> = sqlx::query_as(
            r"
            SELECT id, product_id, color_id, size_id, price, stock
            FROM product_variant
            WHERE product_id = ANY($1)
            ORDER BY id ASC
            ",
        )
        .bind(product_ids)
        .fetch_all(&self.pool)
        .await?;

        let mut by_product: HashMap<ProductId, Vec<Variant>> = HashMap::new();
        for row in rows {
            by_product
                .entry(row.product_id)
                .or_default()
                .push(row.into());
        }
        Ok(by_product)
    }

    /// Load lines for a set of orders, keyed by order ID.
    async fn lines_for(
        &self,
        order_ids: &[i64],
    ) -> Result<HashMap<OrderId, Vec<OrderLine>>, StoreError> {
        let rows: Vec<OrderLineRow> = sqlx::query_as(
            r"
            SELECT order_id, product_id, variant_id, product_name, quantity,
                   unit_price, price_source
            FROM order_line
            WHERE order_id = ANY($1)
            ORDER BY order_id, line_no ASC
            ",
        )
        .bind(order_ids)
        .fetch_all(&self.pool)
        .await?;

        let mut by_order: HashMap<OrderId, Vec<OrderLine>> = HashMap::new();
        for row in rows {
            let order_id = row.order_id;
            by_order.entry(order_id).or_default().push(row.try_into()?);
        }
        Ok(by_order)
    }
}

#[async_trait]
impl Store for PgStore {
    async fn ping(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1").fetch_one(&self.pool).await?;
        Ok(())
    }

    async fn create_product(&self, input: NewProduct) -> Result<Product, StoreError> {
        let mut tx = self.pool.begin().await?;

        let row: ProductRow = sqlx::query_as(
            r"
            INSERT INTO product (name, description, base_price, category_id, sku, seller, tags)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id, name, description, base_price, category_id, sku, seller, tags,
                      created_at, updated_at
            ",
        )
        .bind(&input.name)
        .bind(&input.description)
        .bind(input.base_price)
        .bind(input.category_id)
        .bind(&input.sku)
        .bind(&input.seller)
        .bind(&input.tags)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| unique_conflict(e, "SKU already exists"))?;

        let mut variants = Vec::with_capacity(input.variants.len());
        for variant in &input.variants {
            let inserted: VariantRow = sqlx::query_as(
                r"
                INSERT INTO product_variant (product_id, color_id, size_id, price, stock)
                VALUES ($1, $2, $3, $4, $5)
                RETURNING id, product_id, color_id, size_id, price, stock
                ",
            )
            .bind(row.id)
            .bind(variant.color_id)
            .bind(variant.size_id)
            .bind(variant.price)
            .bind(variant.stock)
            .fetch_one(&mut *tx)
            .await
            .map_err(|e| unique_conflict(e, "duplicate color/size variant"))?;
            variants.push(inserted.into());
        }

        tx.commit().await?;

        Ok(row.into_product(variants))
    }

    async fn get_product(&self, id: ProductId) -> Result<Option<Product>, StoreError> {
        let row: Option<ProductRow> = sqlx::query_as(
            r"
            SELECT id, name, description, base_price, category_id, sku, seller, tags,
                   created_at, updated_at
            FROM product
            WHERE id = $1
            ",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let mut variants = self.variants_for(&[row.id.as_i64()]).await?;
        let variants = variants.remove(&row.id).unwrap_or_default();
        Ok(Some(row.into_product(variants)))
    }

    async fn list_products(
        &self,
        offset: u64,
        limit: u32,
    ) -> Result<(Vec<Product>, u64), StoreError> {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM product")
            .fetch_one(&self.pool)
            .await?;

        let rows: Vec<ProductRow> = sqlx::query_as(
            r"
            SELECT id, name, description, base_price, category_id, sku, seller, tags,
                   created_at, updated_at
            FROM product
            ORDER BY created_at DESC, id DESC
            LIMIT $1 OFFSET $2
            ",
        )
        .bind(i64::from(limit))
        .bind(i64::try_from(offset).unwrap_or(i64::MAX))
        .fetch_all(&self.pool)
        .await?;

        let ids: Vec<i64> = rows.iter().map(|r| r.id.as_i64()).collect();
        let mut variants = self.variants_for(&ids).await?;

        let products = rows
            .into_iter()
            .map(|row| {
                let v = variants.remove(&row.id).unwrap_or_default();
                row.into_product(v)
            })
            .collect();

        Ok((products, u64::try_from(total).unwrap_or(0)))
    }

    async fn adjust_stock(
        &self,
        product_id: ProductId,
        variant_id: VariantId,
        delta: i64,
    ) -> Result<bool, StoreError> {
        // Conditional increment against the stored row; the guard keeps
        // stock non-negative without a read-modify-write cycle.
        let result = sqlx::query(
            r"
            UPDATE product_variant
            SET stock = stock + $1
            WHERE id = $2 AND product_id = $3 AND stock + $1 >= 0
            ",
        )
        .bind(delta)
        .bind(variant_id)
        .bind(product_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn get_cart(&self, user_id: UserId) -> Result<Option<Cart>, StoreError> {
        let row: Option<CartRow> = sqlx::query_as(
            r"
            SELECT id, user_id, updated_at
            FROM cart
            WHERE user_id = $1
            ",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let lines: Vec<CartLineRow> = sqlx::query_as(
            r"
            SELECT product_id, variant_id, quantity
            FROM cart_line
            WHERE cart_id = $1
            ORDER BY product_id, variant_id
            ",
        )
        .bind(row.id)
        .fetch_all(&self.pool)
        .await?;

        let lines = lines
            .into_iter()
            .map(CartLineRow::try_into)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Some(Cart {
            id: row.id,
            user_id: row.user_id,
            lines,
            updated_at: row.updated_at,
        }))
    }

    async fn upsert_cart_line(
        &self,
        user_id: UserId,
        product_id: ProductId,
        variant_id: VariantId,
        quantity: u32,
    ) -> Result<(), StoreError> {
        let mut tx = self.pool.begin().await?;

        let cart_id: CartId = sqlx::query_scalar(
            r"
            INSERT INTO cart (user_id)
            VALUES ($1)
            ON CONFLICT (user_id) DO UPDATE SET updated_at = now()
            RETURNING id
            ",
        )
        .bind(user_id)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query(
            r"
            INSERT INTO cart_line (cart_id, product_id, variant_id, quantity)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (cart_id, product_id, variant_id)
            DO UPDATE SET quantity = EXCLUDED.quantity
            ",
        )
        .bind(cart_id)
        .bind(product_id)
        .bind(variant_id)
        .bind(i64::from(quantity))
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(())
    }

    async fn remove_cart_line(
        &self,
        user_id: UserId,
        product_id: ProductId,
        variant_id: VariantId,
    ) -> Result<bool, StoreError> {
        let result = sqlx::query(
            r"
            DELETE FROM cart_line
            USING cart
            WHERE cart_line.cart_id = cart.id
              AND cart.user_id = $1
              AND cart_line.product_id = $2
              AND cart_line.variant_id = $3
            ",
        )
        .bind(user_id)
        .bind(product_id)
        .bind(variant_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn clear_cart(&self, user_id: UserId) -> Result<(), StoreError> {
        sqlx::query(
            r"
            DELETE FROM cart_line
            USING cart
            WHERE cart_line.cart_id = cart.id AND cart.user_id = $1
            ",
        )
        .bind(user_id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn order_number_exists(&self, order_number: &str) -> Result<bool, StoreError> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM orders WHERE order_number = $1)")
                .bind(order_number)
                .fetch_one(&self.pool)
                .await?;
        Ok(exists)
    }

    async fn create_order(&self, order: NewOrder) -> Result<Order, StoreError> {
        let mut tx = self.pool.begin().await?;

        // All conditional decrements run before the insert; the first
        // line that finds less stock than requested aborts the whole
        // transaction, leaving every variant untouched.
        for line in &order.lines {
            let result = sqlx::query(
                r"
                UPDATE product_variant
                SET stock = stock - $1
                WHERE id = $2 AND product_id = $3 AND stock >= $1
                ",
            )
            .bind(i64::from(line.quantity))
            .bind(line.variant_id)
            .bind(line.product_id)
            .execute(&mut *tx)
            .await?;

            if result.rows_affected() == 0 {
                return Err(StoreError::StockConflict {
                    product: line.product_name.clone(),
                });
            }
        }

        let row: OrderHeaderRow = sqlx::query_as(
            r"
            INSERT INTO orders (
                user_id, order_number,
                items_subtotal, shipping_fee, tax_amount, grand_total,
                ship_full_name, ship_phone, ship_address, ship_city, ship_district, ship_ward,
                payment_method, payment_status, status, note
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16)
            RETURNING id, created_at, updated_at
            ",
        )
        .bind(order.user_id)
        .bind(&order.order_number)
        .bind(order.totals.items_subtotal)
        .bind(order.totals.shipping_fee)
        .bind(order.totals.tax_amount)
        .bind(order.totals.grand_total)
        .bind(&order.shipping_address.full_name)
        .bind(&order.shipping_address.phone)
        .bind(&order.shipping_address.address)
        .bind(&order.shipping_address.city)
        .bind(&order.shipping_address.district)
        .bind(&order.shipping_address.ward)
        .bind(order.payment_method.to_string())
        .bind(PaymentStatus::Pending.to_string())
        .bind(OrderStatus::Pending.to_string())
        .bind(&order.note)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| unique_conflict(e, "order number already exists"))?;

        for (line_no, line) in order.lines.iter().enumerate() {
            sqlx::query(
                r"
                INSERT INTO order_line (
                    order_id, line_no, product_id, variant_id, product_name,
                    quantity, unit_price, price_source
                )
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
                ",
            )
            .bind(row.id)
            .bind(i64::try_from(line_no).unwrap_or(i64::MAX))
            .bind(line.product_id)
            .bind(line.variant_id)
            .bind(&line.product_name)
            .bind(i64::from(line.quantity))
            .bind(line.unit_price.amount())
            .bind(line.unit_price.source().to_string())
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        Ok(Order {
            id: row.id,
            user_id: order.user_id,
            order_number: order.order_number,
            lines: order.lines,
            totals: order.totals,
            shipping_address: order.shipping_address,
            payment_method: order.payment_method,
            payment_status: PaymentStatus::Pending,
            paid_at: None,
            status: OrderStatus::Pending,
            delivered_at: None,
            note: order.note,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }

    async fn get_order(&self, id: OrderId) -> Result<Option<Order>, StoreError> {
        let row: Option<OrderRow> = sqlx::query_as(&format!(
            "{ORDER_SELECT} WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let mut lines = self.lines_for(&[row.id.as_i64()]).await?;
        let lines = lines.remove(&row.id).unwrap_or_default();
        Ok(Some(row.into_order(lines)?))
    }

    async fn list_orders_for_user(&self, user_id: UserId) -> Result<Vec<Order>, StoreError> {
        let rows: Vec<OrderRow> = sqlx::query_as(&format!(
            "{ORDER_SELECT} WHERE user_id = $1 ORDER BY created_at DESC, id DESC"
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        self.assemble_orders(rows).await
    }

    async fn list_orders(
        &self,
        filter: OrderFilter,
        offset: u64,
        limit: u32,
    ) -> Result<(Vec<Order>, u64), StoreError> {
        let status = filter.status.map(|s| s.to_string());
        let payment_status = filter.payment_status.map(|s| s.to_string());

        const FILTER_CLAUSE: &str = r"
            WHERE ($1::text IS NULL OR status = $1)
              AND ($2::text IS NULL OR payment_status = $2)
              AND ($3::timestamptz IS NULL OR created_at >= $3)
              AND ($4::timestamptz IS NULL OR created_at <= $4)
              AND ($5::bigint IS NULL OR grand_total >= $5)
              AND ($6::bigint IS NULL OR grand_total <= $6)
        ";

        let total: i64 =
            sqlx::query_scalar(&format!("SELECT COUNT(*) FROM orders {FILTER_CLAUSE}"))
                .bind(&status)
                .bind(&payment_status)
                .bind(filter.created_from)
                .bind(filter.created_to)
                .bind(filter.min_total)
                .bind(filter.max_total)
                .fetch_one(&self.pool)
                .await?;

        let rows: Vec<OrderRow> = sqlx::query_as(&format!(
            r"
            {ORDER_SELECT}
            {FILTER_CLAUSE}
            ORDER BY created_at DESC, id DESC
            LIMIT $7 OFFSET $8
            "
        ))
        .bind(&status)
        .bind(&payment_status)
        .bind(filter.created_from)
        .bind(filter.created_to)
        .bind(filter.min_total)
        .bind(filter.max_total)
        .bind(i64::from(limit))
        .bind(i64::try_from(offset).unwrap_or(i64::MAX))
        .fetch_all(&self.pool)
        .await?;

        let orders = self.assemble_orders(rows).await?;
        Ok((orders, u64::try_from(total).unwrap_or(0)))
    }

    async fn transition_order_status(
        &self,
        id: OrderId,
        from: OrderStatus,
        to: OrderStatus,
    ) -> Result<bool, StoreError> {
        let result = sqlx::query(
            r"
            UPDATE orders
            SET status = $1, updated_at = now()
            WHERE id = $2 AND status = $3
            ",
        )
        .bind(to.to_string())
        .bind(id)
        .bind(from.to_string())
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn set_order_status(
        &self,
        id: OrderId,
        to: OrderStatus,
        delivered_at: Option<DateTime<Utc>>,
    ) -> Result<(), StoreError> {
        let result = sqlx::query(
            r"
            UPDATE orders
            SET status = $1,
                delivered_at = COALESCE($2, delivered_at),
                updated_at = now()
            WHERE id = $3
            ",
        )
        .bind(to.to_string())
        .bind(delivered_at)
        .bind(id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(format!("order {id}")));
        }
        Ok(())
    }

    async fn mark_order_paid(
        &self,
        id: OrderId,
        paid_at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        let result = sqlx::query(
            r"
            UPDATE orders
            SET payment_status = $1, paid_at = $2, updated_at = now()
            WHERE id = $3
            ",
        )
        .bind(PaymentStatus::Paid.to_string())
        .bind(paid_at)
        .bind(id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(format!("order {id}")));
        }
        Ok(())
    }
}

impl PgStore {
    /// Join a batch of header rows with their lines.
    async fn assemble_orders(&self, rows: Vec<OrderRow>) -> Result<Vec<Order>, StoreError> {
        let ids: Vec<i64> = rows.iter().map(|r| r.id.as_i64()).collect();
        let mut lines = self.lines_for(&ids).await?;
        rows.into_iter()
            .map(|row| {
                let order_lines = lines.remove(&row.id).unwrap_or_default();
                row.into_order(order_lines)
            })
            .collect()
    }
}

/// Shared column list for order header queries.
const ORDER_SELECT: &str = r"
    SELECT id, user_id, order_number,
           items_subtotal, shipping_fee, tax_amount, grand_total,
           ship_full_name, ship_phone, ship_address, ship_city, ship_district, ship_ward,
           payment_method, payment_status, paid_at, status, delivered_at, note,
           created_at, updated_at
    FROM orders
";

/// Map a unique-constraint violation to [`StoreError::Conflict`].
fn unique_conflict(e: sqlx::Error, message: &str) -> StoreError {
    if let sqlx::Error::Database(ref db_err) = e
        && db_err.is_unique_violation()
    {
        return StoreError::Conflict(message.to_owned());
    }
    StoreError::Database(e)
}

// =============================================================================
// Row Types
// =============================================================================

#[derive(sqlx::FromRow)]
struct ProductRow {
    id: ProductId,
    name: String,
    description: String,
    base_price: Money,
    category_id: CategoryId,
    sku: String,
    seller: String,
    tags: Vec<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl ProductRow {
    fn into_product(self, variants: Vec<Variant>) -> Product {
        Product {
            id: self.id,
            name: self.name,
            description: self.description,
            base_price: self.base_price,
            category_id: self.category_id,
            sku: self.sku,
            seller: self.seller,
            tags: self.tags,
            variants,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct VariantRow {
    id: VariantId,
    product_id: ProductId,
    color_id: ColorId,
    size_id: SizeId,
    price: Option<Money>,
    stock: i64,
}

impl From<VariantRow> for Variant {
    fn from(row: VariantRow) -> Self {
        Self {
            id: row.id,
            color_id: row.color_id,
            size_id: row.size_id,
            price: row.price,
            stock: row.stock,
        }
    }
}

#[derive(sqlx::FromRow)]
struct CartRow {
    id: CartId,
    user_id: UserId,
    updated_at: DateTime<Utc>,
}

#[derive(sqlx::FromRow)]
struct CartLineRow {
    product_id: ProductId,
    variant_id: VariantId,
    quantity: i64,
}

impl TryFrom<CartLineRow> for CartLine {
    type Error = StoreError;

    fn try_from(row: CartLineRow) -> Result<Self, StoreError> {
        let quantity = u32::try_from(row.quantity).map_err(|_| {
            StoreError::DataCorruption(format!("invalid cart quantity: {}", row.quantity))
        })?;
        Ok(Self {
            product_id: row.product_id,
            variant_id: row.variant_id,
            quantity,
        })
    }
}

#[derive(sqlx::FromRow)]
struct OrderHeaderRow {
    id: OrderId,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(sqlx::FromRow)]
struct OrderRow {
    id: OrderId,
    user_id: UserId,
    order_number: String,
    items_subtotal: Money,
    shipping_fee: Money,
    tax_amount: Money,
    grand_total: Money,
    ship_full_name: String,
    ship_phone: String,
    ship_address: String,
    ship_city: String,
    ship_district: String,
    ship_ward: String,
    payment_method: String,
    payment_status: String,
    paid_at: Option<DateTime<Utc>>,
    status: String,
    delivered_at: Option<DateTime<Utc>>,
    note: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl OrderRow {
    fn into_order(self, lines: Vec<OrderLine>) -> Result<Order, StoreError> {
        let payment_method: PaymentMethod = self
            .payment_method
            .parse()
            .map_err(StoreError::DataCorruption)?;
        let payment_status: PaymentStatus = self
            .payment_status
            .parse()
            .map_err(StoreError::DataCorruption)?;
        let status: OrderStatus = self.status.parse().map_err(StoreError::DataCorruption)?;

        Ok(Order {
            id: self.id,
            user_id: self.user_id,
            order_number: self.order_number,
            lines,
            totals: Totals {
                items_subtotal: self.items_subtotal,
                shipping_fee: self.shipping_fee,
                tax_amount: self.tax_amount,
                grand_total: self.grand_total,
            },
            shipping_address: ShippingAddress {
                full_name: self.ship_full_name,
                phone: self.ship_phone,
                address: self.ship_address,
                city: self.ship_city,
                district: self.ship_district,
                ward: self.ship_ward,
            },
            payment_method,
            payment_status,
            paid_at: self.paid_at,
            status,
            delivered_at: self.delivered_at,
            note: self.note,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct OrderLineRow {
    order_id: OrderId,
    product_id: ProductId,
    variant_id: VariantId,
    product_name: String,
    quantity: i64,
    unit_price: Money,
    price_source: String,
}

impl TryFrom<OrderLineRow> for OrderLine {
    type Error = StoreError;

    fn try_from(row: OrderLineRow) -> Result<Self, StoreError> {
        let quantity = u32::try_from(row.quantity).map_err(|_| {
            StoreError::DataCorruption(format!("invalid order quantity: {}", row.quantity))
        })?;
        let source: PriceSource = row
            .price_source
            .parse()
            .map_err(StoreError::DataCorruption)?;
        Ok(Self {
            product_id: row.product_id,
            variant_id: row.variant_id,
            product_name: row.product_name,
            quantity,
            unit_price: UnitPrice::from_parts(source, row.unit_price),
        })
    }
}
