//! Cart domain types and the cart-line decision types.
//!
//! The stores run the add-to-cart sequence atomically, but the decision of
//! what to write (insert, accumulate, or reject) is made by
//! [`crate::services::cart::plan_cart_item`] from a [`ProductSnapshot`] and
//! the [`ExistingLine`], if any.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use catalog_core::{CartId, CartItemId, CartStatus, ProductId, UserId};

/// A user's shopping cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Cart {
    pub cart_id: CartId,
    pub user_id: UserId,
    pub status: CartStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// One product line in a cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct CartItem {
    pub cart_item_id: CartItemId,
    pub cart_id: CartId,
    pub product_id: ProductId,
    pub quantity: i32,
    /// Unit price captured on the first add; later adds never re-read it.
    pub price_at_time: i64,
    /// Discount supplied with the most recent add.
    pub discount: i64,
    pub subtotal: i64,
    pub added_at: DateTime<Utc>,
}

/// A cart together with its lines, oldest first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartContents {
    pub cart: Cart,
    pub items: Vec<CartItem>,
}

/// Price and stock of a product, read under the add-to-cart lock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProductSnapshot {
    pub price: i64,
    pub stock: i32,
}

/// The existing cart line for the product being added.
#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::FromRow)]
pub struct ExistingLine {
    pub cart_item_id: CartItemId,
    pub quantity: i32,
    pub price_at_time: i64,
    pub subtotal: i64,
}

/// What the store should write for an add-to-cart call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CartItemPlan {
    /// Insert a new line.
    Insert {
        quantity: i32,
        price_at_time: i64,
        discount: i64,
        subtotal: i64,
    },
    /// Overwrite an existing line with accumulated totals.
    Update {
        cart_item_id: CartItemId,
        quantity: i32,
        discount: i64,
        subtotal: i64,
    },
}

/// The add was refused because stock cannot cover it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StockShortfall {
    /// Units the caller asked to add.
    pub requested: i32,
    /// Units that could still be added to this cart.
    pub available: i32,
}
