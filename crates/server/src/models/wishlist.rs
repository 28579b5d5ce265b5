//! Wishlist domain types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use catalog_core::{ProductId, UserId, WishListEntryId};

use super::Product;

/// A saved (user, product) pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct WishListEntry {
    pub wish_list_id: WishListEntryId,
    pub user_id: UserId,
    pub product_id: ProductId,
    pub added_at: DateTime<Utc>,
}

/// A user's wishlist as two index-aligned sequences.
///
/// `products[i]` is the product saved by `entries[i]`; both always have the
/// same length.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WishList {
    pub entries: Vec<WishListEntry>,
    pub products: Vec<Product>,
}

impl WishList {
    /// Split joined rows into the parallel sequences.
    #[must_use]
    pub fn from_rows(rows: Vec<(WishListEntry, Product)>) -> Self {
        let (entries, products) = rows.into_iter().unzip();
        Self { entries, products }
    }
}
