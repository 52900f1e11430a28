//! Demo catalog seeding. Safe to re-run: every insert skips rows that
//! already exist.

use sqlx::PgPool;

use atelier_core::Money;

use super::{CommandError, connect};

const COLORS: &[(&str, &str)] = &[
    ("Black", "#000000"),
    ("White", "#ffffff"),
    ("Navy", "#1f2a44"),
];

const SIZES: &[&str] = &["S", "M", "L", "XL"];

const CATEGORIES: &[&str] = &["Shirts", "Trousers", "Outerwear"];

struct DemoProduct {
    name: &'static str,
    sku: &'static str,
    category: &'static str,
    base_price: Money,
    stock: i64,
}

const PRODUCTS: &[DemoProduct] = &[
    DemoProduct {
        name: "Linen Shirt",
        sku: "AT-SHIRT-001",
        category: "Shirts",
        base_price: Money::new(120_000),
        stock: 25,
    },
    DemoProduct {
        name: "Wool Trousers",
        sku: "AT-TROUSER-001",
        category: "Trousers",
        base_price: Money::new(240_000),
        stock: 12,
    },
    DemoProduct {
        name: "Field Jacket",
        sku: "AT-JACKET-001",
        category: "Outerwear",
        base_price: Money::new(620_000),
        stock: 6,
    },
];

/// Populate the catalog with demo data.
pub async fn run() -> Result<(), CommandError> {
    let pool = connect().await?;

    for (name, hex) in COLORS {
        sqlx::query("INSERT INTO color (name, hex_code) VALUES ($1, $2) ON CONFLICT (name) DO NOTHING")
            .bind(name)
            .bind(hex)
            .execute(&pool)
            .await?;
    }
    for name in SIZES {
        sqlx::query("INSERT INTO size (name) VALUES ($1) ON CONFLICT (name) DO NOTHING")
            .bind(name)
            .execute(&pool)
            .await?;
    }
    for name in CATEGORIES {
        sqlx::query("INSERT INTO category (name) VALUES ($1) ON CONFLICT (name) DO NOTHING")
            .bind(name)
            .execute(&pool)
            .await?;
    }

    for product in PRODUCTS {
        seed_product(&pool, product).await?;
    }

    tracing::info!("Seed complete");
    Ok(())
}

async fn seed_product(pool: &PgPool, demo: &DemoProduct) -> Result<(), CommandError> {
    let category_id: i64 = sqlx::query_scalar("SELECT id FROM category WHERE name = $1")
        .bind(demo.category)
        .fetch_one(pool)
        .await?;

    let product_id: Option<i64> = sqlx::query_scalar(
        r"
        INSERT INTO product (name, description, base_price, category_id, sku, seller, tags)
        VALUES ($1, '', $2, $3, $4, 'Admin', '{}')
        ON CONFLICT (sku) DO NOTHING
        RETURNING id
        ",
    )
    .bind(demo.name)
    .bind(demo.base_price)
    .bind(category_id)
    .bind(demo.sku)
    .fetch_optional(pool)
    .await?;

    let Some(product_id) = product_id else {
        tracing::info!(sku = demo.sku, "Product already seeded, skipping");
        return Ok(());
    };

    // One variant per color in the first two sizes.
    let color_ids: Vec<i64> = sqlx::query_scalar("SELECT id FROM color ORDER BY id")
        .fetch_all(pool)
        .await?;
    let size_ids: Vec<i64> = sqlx::query_scalar("SELECT id FROM size ORDER BY id LIMIT 2")
        .fetch_all(pool)
        .await?;

    for color_id in &color_ids {
        for size_id in &size_ids {
            sqlx::query(
                r"
                INSERT INTO product_variant (product_id, color_id, size_id, price, stock)
                VALUES ($1, $2, $3, NULL, $4)
                ON CONFLICT (product_id, color_id, size_id) DO NOTHING
                ",
            )
            .bind(product_id)
            .bind(color_id)
            .bind(size_id)
            .bind(demo.stock)
            .execute(pool)
            .await?;
        }
    }

    tracing::info!(sku = demo.sku, "Seeded product");
    Ok(())
}
