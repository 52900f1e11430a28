//! Monetary amounts and order-time price resolution.
//!
//! All amounts are whole integer units of the store currency (VND-style,
//! no minor unit). Arithmetic that could overflow an `i64` is far beyond
//! any realistic order total, so plain operators are used.

use serde::{Deserialize, Serialize};

/// A monetary amount in whole currency units.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Money(i64);

impl Money {
    /// The zero amount.
    pub const ZERO: Self = Self(0);

    /// Create an amount from whole currency units.
    #[must_use]
    pub const fn new(amount: i64) -> Self {
        Self(amount)
    }

    /// Get the underlying amount.
    #[must_use]
    pub const fn as_i64(&self) -> i64 {
        self.0
    }

    /// Multiply by a line quantity.
    #[must_use]
    pub const fn times(self, quantity: u32) -> Self {
        Self(self.0 * quantity as i64)
    }
}

impl std::ops::Add for Money {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self(self.0 + rhs.0)
    }
}

impl std::ops::AddAssign for Money {
    fn add_assign(&mut self, rhs: Self) {
        self.0 += rhs.0;
    }
}

impl std::fmt::Display for Money {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for Money {
    fn from(amount: i64) -> Self {
        Self(amount)
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Type<sqlx::Postgres> for Money {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <i64 as sqlx::Type<sqlx::Postgres>>::type_info()
    }

    fn compatible(ty: &sqlx::postgres::PgTypeInfo) -> bool {
        <i64 as sqlx::Type<sqlx::Postgres>>::compatible(ty)
    }
}

#[cfg(feature = "postgres")]
impl<'r> sqlx::Decode<'r, sqlx::Postgres> for Money {
    fn decode(
        value: sqlx::postgres::PgValueRef<'r>,
    ) -> Result<Self, sqlx::error::BoxDynError> {
        let amount = <i64 as sqlx::Decode<sqlx::Postgres>>::decode(value)?;
        Ok(Self(amount))
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Encode<'_, sqlx::Postgres> for Money {
    fn encode_by_ref(
        &self,
        buf: &mut sqlx::postgres::PgArgumentBuffer,
    ) -> Result<sqlx::encode::IsNull, sqlx::error::BoxDynError> {
        <i64 as sqlx::Encode<sqlx::Postgres>>::encode_by_ref(&self.0, buf)
    }
}

/// The unit price captured for an order line, tagged with where it came
/// from.
///
/// Variants normally carry their own price; a variant without one falls
/// back to the parent product's base price. The precedence rule lives in
/// [`UnitPrice::resolve`] so the fallback is explicit and tested rather
/// than an implicit runtime default. Orders persist the source so the
/// catalog inconsistency stays visible after the fact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "source", content = "amount", rename_all = "snake_case")]
pub enum UnitPrice {
    /// The variant's own price.
    Variant(Money),
    /// Fallback to the parent product's base price.
    ProductBase(Money),
}

impl UnitPrice {
    /// Resolve the unit price for a variant at order-line-capture time.
    ///
    /// The variant price wins when present; otherwise the product base
    /// price is used.
    #[must_use]
    pub const fn resolve(variant_price: Option<Money>, base_price: Money) -> Self {
        match variant_price {
            Some(price) => Self::Variant(price),
            None => Self::ProductBase(base_price),
        }
    }

    /// The resolved amount, regardless of source.
    #[must_use]
    pub const fn amount(&self) -> Money {
        match self {
            Self::Variant(amount) | Self::ProductBase(amount) => *amount,
        }
    }

    /// Which side of the precedence rule produced this price.
    #[must_use]
    pub const fn source(&self) -> PriceSource {
        match self {
            Self::Variant(_) => PriceSource::Variant,
            Self::ProductBase(_) => PriceSource::ProductBase,
        }
    }

    /// Reconstruct from a persisted (source, amount) pair.
    #[must_use]
    pub const fn from_parts(source: PriceSource, amount: Money) -> Self {
        match source {
            PriceSource::Variant => Self::Variant(amount),
            PriceSource::ProductBase => Self::ProductBase(amount),
        }
    }
}

/// Persisted tag for [`UnitPrice`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PriceSource {
    Variant,
    ProductBase,
}

impl std::fmt::Display for PriceSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Variant => write!(f, "variant"),
            Self::ProductBase => write!(f, "product_base"),
        }
    }
}

impl std::str::FromStr for PriceSource {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "variant" => Ok(Self::Variant),
            "product_base" => Ok(Self::ProductBase),
            _ => Err(format!("invalid price source: {s}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_money_times_quantity() {
        assert_eq!(Money::new(150_000).times(3), Money::new(450_000));
        assert_eq!(Money::ZERO.times(10), Money::ZERO);
    }

    #[test]
    fn test_unit_price_prefers_variant_price() {
        let price = UnitPrice::resolve(Some(Money::new(120_000)), Money::new(100_000));
        assert_eq!(price, UnitPrice::Variant(Money::new(120_000)));
        assert_eq!(price.amount(), Money::new(120_000));
        assert_eq!(price.source(), PriceSource::Variant);
    }

    #[test]
    fn test_unit_price_falls_back_to_base_price() {
        let price = UnitPrice::resolve(None, Money::new(100_000));
        assert_eq!(price, UnitPrice::ProductBase(Money::new(100_000)));
        assert_eq!(price.amount(), Money::new(100_000));
        assert_eq!(price.source(), PriceSource::ProductBase);
    }

    #[test]
    fn test_price_source_text_roundtrip() {
        for source in [PriceSource::Variant, PriceSource::ProductBase] {
            let text = source.to_string();
            assert_eq!(text.parse::<PriceSource>(), Ok(source));
        }
    }

    #[test]
    fn test_unit_price_from_parts() {
        let price = UnitPrice::from_parts(PriceSource::ProductBase, Money::new(90_000));
        assert_eq!(price, UnitPrice::ProductBase(Money::new(90_000)));
    }
}
