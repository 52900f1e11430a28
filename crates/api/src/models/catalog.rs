//! Catalog domain types: products and their purchasable variants.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use atelier_core::{CategoryId, ColorId, Money, ProductId, SizeId, VariantId};

/// A catalog product with its embedded variant list.
#[derive(Debug, Clone, Serialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub description: String,
    /// Base price, used when a variant carries no price of its own.
    pub base_price: Money,
    pub category_id: CategoryId,
    /// Unique stock-keeping unit.
    pub sku: String,
    pub seller: String,
    pub tags: Vec<String>,
    /// Purchasable color/size combinations, in catalog order.
    pub variants: Vec<Variant>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Locate a variant by its stable ID within this product.
    #[must_use]
    pub fn variant(&self, id: VariantId) -> Option<&Variant> {
        self.variants.iter().find(|v| v.id == id)
    }
}

/// A purchasable color/size combination with its own price and stock.
#[derive(Debug, Clone, Serialize)]
pub struct Variant {
    pub id: VariantId,
    pub color_id: ColorId,
    pub size_id: SizeId,
    /// Unit price; `None` falls back to the product base price at
    /// order-line-capture time.
    pub price: Option<Money>,
    /// Live stock count. Never negative; the order engine enforces this
    /// through conditional decrements, the store CHECK is only a backstop.
    pub stock: i64,
}

/// Input for creating a product with its variants.
#[derive(Debug, Clone, Deserialize)]
pub struct NewProduct {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub base_price: Money,
    pub category_id: CategoryId,
    pub sku: String,
    #[serde(default = "default_seller")]
    pub seller: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub variants: Vec<NewVariant>,
}

fn default_seller() -> String {
    "Admin".to_owned()
}

/// Input for one variant of a new product.
#[derive(Debug, Clone, Deserialize)]
pub struct NewVariant {
    pub color_id: ColorId,
    pub size_id: SizeId,
    #[serde(default)]
    pub price: Option<Money>,
    #[serde(default)]
    pub stock: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn product_with_variants() -> Product {
        Product {
            id: ProductId::new(1),
            name: "Linen Shirt".to_owned(),
            description: String::new(),
            base_price: Money::new(250_000),
            category_id: CategoryId::new(1),
            sku: "LS-001".to_owned(),
            seller: "Admin".to_owned(),
            tags: vec![],
            variants: vec![
                Variant {
                    id: VariantId::new(10),
                    color_id: ColorId::new(1),
                    size_id: SizeId::new(1),
                    price: Some(Money::new(260_000)),
                    stock: 5,
                },
                Variant {
                    id: VariantId::new(11),
                    color_id: ColorId::new(2),
                    size_id: SizeId::new(1),
                    price: None,
                    stock: 0,
                },
            ],
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_variant_lookup_by_id() {
        let product = product_with_variants();
        assert!(product.variant(VariantId::new(10)).is_some());
        assert!(product.variant(VariantId::new(11)).is_some());
        assert!(product.variant(VariantId::new(99)).is_none());
    }

    #[test]
    fn test_new_product_defaults() {
        let json = r#"{
            "name": "Tote",
            "base_price": 90000,
            "category_id": 2,
            "sku": "TT-01"
        }"#;
        let parsed: NewProduct = serde_json::from_str(json).expect("deserialize");
        assert_eq!(parsed.seller, "Admin");
        assert!(parsed.variants.is_empty());
        assert!(parsed.tags.is_empty());
    }
}
