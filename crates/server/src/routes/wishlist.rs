//! Wishlist route handlers.

use axum::{Json, extract::State, http::StatusCode};
use serde::Serialize;
use tracing::instrument;

use catalog_core::{ProductId, UserId, WishListEntryId};

use super::Ack;
use super::extract::ApiPath;
use crate::error::Result;
use crate::models::{Product, WishListEntry};
use crate::state::AppState;

/// Response to a successful add.
#[derive(Debug, Serialize)]
pub struct AddToWishListResponse {
    pub message: &'static str,
    pub wish_list_id: WishListEntryId,
}

/// A user's wishlist; `products[i]` belongs to `wish_list_items[i]`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WishListResponse {
    pub result: &'static str,
    pub wish_list_items: Vec<WishListEntry>,
    pub products: Vec<Product>,
}

/// The user's wishlist entries with their products.
#[instrument(skip(state))]
pub async fn show(
    State(state): State<AppState>,
    ApiPath(user_id): ApiPath<UserId>,
) -> Result<Json<WishListResponse>> {
    let list = state.wishlist().fetch(user_id).await?;
    Ok(Json(WishListResponse {
        result: "success",
        wish_list_items: list.entries,
        products: list.products,
    }))
}

/// Save a product to the user's wishlist.
#[instrument(skip(state))]
pub async fn add(
    State(state): State<AppState>,
    ApiPath((user_id, product_id)): ApiPath<(UserId, ProductId)>,
) -> Result<(StatusCode, Json<AddToWishListResponse>)> {
    let wish_list_id = state.wishlist().add(user_id, product_id).await?;
    Ok((
        StatusCode::CREATED,
        Json(AddToWishListResponse {
            message: "Item added to wishlist",
            wish_list_id,
        }),
    ))
}

/// Remove a product from the user's wishlist.
#[instrument(skip(state))]
pub async fn remove(
    State(state): State<AppState>,
    ApiPath((user_id, product_id)): ApiPath<(UserId, ProductId)>,
) -> Result<Json<Ack>> {
    state.wishlist().remove(user_id, product_id).await?;
    Ok(Json(Ack::success("item removed from wishlist")))
}
