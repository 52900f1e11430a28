//! Public catalog handlers.

use axum::extract::{Path, Query, State};
use serde::Deserialize;
use tracing::instrument;

use atelier_core::ProductId;

use super::ApiResponse;
use crate::error::Result;
use crate::models::Product;
use crate::services::catalog::DEFAULT_PAGE_SIZE;
use crate::state::AppState;

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct ListQuery {
    #[serde(default)]
    pub page: Option<u32>,
    #[serde(default)]
    pub limit: Option<u32>,
}

/// `GET /api/products`
#[instrument(skip(state))]
pub async fn index(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<ApiResponse<Vec<Product>>> {
    let (products, pagination) = state
        .catalog()
        .list(
            query.page.unwrap_or(1),
            query.limit.unwrap_or(DEFAULT_PAGE_SIZE),
        )
        .await?;
    Ok(ApiResponse::paged(products, pagination))
}

/// `GET /api/products/{id}`
#[instrument(skip(state))]
pub async fn show(
    State(state): State<AppState>,
    Path(id): Path<ProductId>,
) -> Result<ApiResponse<Product>> {
    let product = state.catalog().get(id).await?;
    Ok(ApiResponse::new(product))
}
