//! API configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `ATELIER_DATABASE_URL` - `PostgreSQL` connection string
//!   (falls back to generic `DATABASE_URL`)
//!
//! ## Optional
//! - `ATELIER_HOST` - Bind address (default: 127.0.0.1)
//! - `ATELIER_PORT` - Listen port (default: 3000)
//! - `ATELIER_TAX_RATE` - Flat tax rate on the items subtotal (default: 0.10)
//! - `ATELIER_FREE_SHIPPING_THRESHOLD` - Subtotal above which shipping is
//!   free (default: 500000)
//! - `ATELIER_SHIPPING_FEE` - Flat shipping fee (default: 30000)
//! - `ATELIER_SAVE_DEADLINE_MS` - Deadline for store writes before the
//!   engine reports "busy, retry" (default: 5000)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name

use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use rust_decimal::Decimal;
use secrecy::SecretString;
use thiserror::Error;

use atelier_core::{Money, PricingPolicy};

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// API application configuration.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// `PostgreSQL` database connection URL (contains password)
    pub database_url: SecretString,
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Pricing rules applied by the order engine
    pub pricing: PricingPolicy,
    /// Deadline for individual store writes before surfacing `Unavailable`
    pub save_deadline: Duration,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment name
    pub sentry_environment: Option<String>,
}

impl ApiConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let database_url = get_database_url("ATELIER_DATABASE_URL")?;
        let host = parse_env_or_default::<IpAddr>("ATELIER_HOST", "127.0.0.1")?;
        let port = parse_env_or_default::<u16>("ATELIER_PORT", "3000")?;
        let pricing = pricing_from_env()?;
        let save_deadline_ms = parse_env_or_default::<u64>("ATELIER_SAVE_DEADLINE_MS", "5000")?;
        let sentry_dsn = get_optional_env("SENTRY_DSN");
        let sentry_environment = get_optional_env("SENTRY_ENVIRONMENT");

        Ok(Self {
            database_url,
            host,
            port,
            pricing,
            save_deadline: Duration::from_millis(save_deadline_ms),
            sentry_dsn,
            sentry_environment,
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

impl Default for ApiConfig {
    /// Local defaults used by tests and tooling that never open a
    /// database connection.
    fn default() -> Self {
        Self {
            database_url: SecretString::from("postgres://localhost/atelier"),
            host: IpAddr::from([127, 0, 0, 1]),
            port: 3000,
            pricing: PricingPolicy::default(),
            save_deadline: Duration::from_millis(5000),
            sentry_dsn: None,
            sentry_environment: None,
        }
    }
}

/// Build the pricing policy from environment overrides.
fn pricing_from_env() -> Result<PricingPolicy, ConfigError> {
    let defaults = PricingPolicy::default();
    Ok(PricingPolicy {
        tax_rate: parse_env_or::<Decimal>("ATELIER_TAX_RATE", defaults.tax_rate)?,
        free_shipping_threshold: parse_env_or::<i64>(
            "ATELIER_FREE_SHIPPING_THRESHOLD",
            defaults.free_shipping_threshold.as_i64(),
        )
        .map(Money::new)?,
        flat_shipping_fee: parse_env_or::<i64>(
            "ATELIER_SHIPPING_FEE",
            defaults.flat_shipping_fee.as_i64(),
        )
        .map(Money::new)?,
    })
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get database URL with fallback to generic `DATABASE_URL`.
fn get_database_url(primary_key: &str) -> Result<SecretString, ConfigError> {
    if let Ok(value) = std::env::var(primary_key) {
        return Ok(SecretString::from(value));
    }
    if let Ok(value) = std::env::var("DATABASE_URL") {
        return Ok(SecretString::from(value));
    }
    Err(ConfigError::MissingEnvVar(primary_key.to_string()))
}

/// Get an optional environment variable.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

/// Parse an environment variable, falling back to a string default.
fn parse_env_or_default<T>(key: &str, default: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    std::env::var(key)
        .unwrap_or_else(|_| default.to_string())
        .parse::<T>()
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
}

/// Parse an environment variable, falling back to a typed default.
fn parse_env_or<T>(key: &str, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(key) {
        Ok(value) => value
            .parse::<T>()
            .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string())),
        Err(_) => Ok(default),
    }
}
