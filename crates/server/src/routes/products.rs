//! Public product read handlers.

use std::collections::BTreeMap;

use axum::{Json, extract::State};
use serde::Deserialize;
use tracing::instrument;

use catalog_core::ProductId;

use super::extract::{ApiPath, ApiQuery};
use crate::error::Result;
use crate::models::{Product, ProductFilter};
use crate::services::CatalogError;
use crate::state::AppState;

/// Query parameters for product search.
#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub q: String,
}

/// Every product.
#[instrument(skip(state))]
pub async fn index(State(state): State<AppState>) -> Result<Json<Vec<Product>>> {
    Ok(Json(state.catalog().list_products().await?))
}

/// A random sample of products.
#[instrument(skip(state))]
pub async fn default_sample(State(state): State<AppState>) -> Result<Json<Vec<Product>>> {
    Ok(Json(state.catalog().default_products().await?))
}

/// Products matching the query-string filter.
///
/// Repeated parameters are grouped; the filter uses the first value of each.
#[instrument(skip(state))]
pub async fn filtered(
    State(state): State<AppState>,
    ApiQuery(pairs): ApiQuery<Vec<(String, String)>>,
) -> Result<Json<Vec<Product>>> {
    let mut params: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for (key, value) in pairs {
        params.entry(key).or_default().push(value);
    }

    let filter = ProductFilter::from_params(&params).map_err(CatalogError::Validation)?;
    Ok(Json(state.catalog().filtered_products(&filter).await?))
}

/// Products whose name or brand contains `q`.
#[instrument(skip(state))]
pub async fn search(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<SearchQuery>,
) -> Result<Json<Vec<Product>>> {
    Ok(Json(state.catalog().search_products(&query.q).await?))
}

/// A single product.
#[instrument(skip(state))]
pub async fn show(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<ProductId>,
) -> Result<Json<Product>> {
    Ok(Json(state.catalog().get_product(id).await?))
}
