//! Product write handlers.
//!
//! Each successful write flushes the product cache.

use axum::{Json, extract::State, http::StatusCode};
use tracing::instrument;

use catalog_core::ProductId;

use super::Ack;
use super::extract::{ApiJson, ApiPath};
use crate::error::Result;
use crate::models::{NewProduct, Product};
use crate::state::AppState;

/// Create a product.
#[instrument(skip(state, product))]
pub async fn create_product(
    State(state): State<AppState>,
    ApiJson(product): ApiJson<NewProduct>,
) -> Result<(StatusCode, Json<Product>)> {
    let created = state.catalog().create_product(&product).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// Replace a product.
#[instrument(skip(state, product))]
pub async fn update_product(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<ProductId>,
    ApiJson(product): ApiJson<NewProduct>,
) -> Result<Json<Product>> {
    Ok(Json(state.catalog().update_product(id, &product).await?))
}

/// Delete a product.
#[instrument(skip(state))]
pub async fn delete_product(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<ProductId>,
) -> Result<Json<Ack>> {
    state.catalog().delete_product(id).await?;
    Ok(Json(Ack::success("product deleted")))
}
