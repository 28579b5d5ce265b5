//! Cart route handlers.

use axum::{Json, extract::State};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use catalog_core::{CartItemId, ProductId, UserId};

use super::Ack;
use super::extract::{ApiJson, ApiPath};
use crate::error::Result;
use crate::models::CartContents;
use crate::state::AppState;

/// Body of an add-to-cart request.
#[derive(Debug, Deserialize)]
pub struct AddToCartRequest {
    pub quantity: i32,
    #[serde(default)]
    pub discount: i64,
}

/// Response to a successful add.
#[derive(Debug, Serialize)]
pub struct AddToCartResponse {
    pub message: &'static str,
    pub cart_item_id: CartItemId,
}

/// The user's active cart.
#[instrument(skip(state))]
pub async fn show(
    State(state): State<AppState>,
    ApiPath(user_id): ApiPath<UserId>,
) -> Result<Json<CartContents>> {
    Ok(Json(state.carts().fetch_cart(user_id).await?))
}

/// Add a product to the user's active cart.
#[instrument(skip(state))]
pub async fn add(
    State(state): State<AppState>,
    ApiPath((user_id, product_id)): ApiPath<(UserId, ProductId)>,
    ApiJson(body): ApiJson<AddToCartRequest>,
) -> Result<Json<AddToCartResponse>> {
    let cart_item_id = state
        .carts()
        .add_to_cart(user_id, product_id, body.quantity, body.discount)
        .await?;

    Ok(Json(AddToCartResponse {
        message: "Item added to cart successfully",
        cart_item_id,
    }))
}

/// Remove a product from the user's active cart.
#[instrument(skip(state))]
pub async fn remove(
    State(state): State<AppState>,
    ApiPath((user_id, product_id)): ApiPath<(UserId, ProductId)>,
) -> Result<Json<Ack>> {
    state.carts().remove_from_cart(user_id, product_id).await?;
    Ok(Json(Ack::success("item removed from cart")))
}
