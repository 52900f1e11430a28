//! Domain services: validation and orchestration between the HTTP layer
//! and the store.

pub mod cart;
pub mod catalog;
pub mod orders;

pub use cart::CartService;
pub use catalog::CatalogService;
pub use orders::OrderService;

use std::future::Future;
use std::time::Duration;

use crate::error::{AppError, Result};

/// Run a store write under the configured save deadline.
///
/// An elapsed deadline surfaces as [`AppError::Unavailable`] so clients
/// get a retryable 503 instead of a hung request.
pub(crate) async fn with_deadline<T, E, F>(deadline: Duration, fut: F) -> Result<T>
where
    F: Future<Output = std::result::Result<T, E>>,
    AppError: From<E>,
{
    match tokio::time::timeout(deadline, fut).await {
        Ok(result) => result.map_err(AppError::from),
        Err(_) => Err(AppError::Unavailable("save deadline exceeded".to_owned())),
    }
}
