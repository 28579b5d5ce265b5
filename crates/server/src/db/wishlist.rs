//! Wishlist repository for database operations.

use async_trait::async_trait;
use sqlx::PgPool;

use catalog_core::{ProductId, UserId, WishListEntryId};

use super::{RepositoryError, WishlistStore};
use crate::models::{Product, WishListEntry};

/// Repository for wishlist database operations.
#[derive(Clone)]
pub struct WishlistRepository {
    pool: PgPool,
}

impl WishlistRepository {
    /// Create a new wishlist repository.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// One row of the entry/product join.
#[derive(sqlx::FromRow)]
struct JoinedRow {
    #[sqlx(flatten)]
    entry: WishListEntry,
    #[sqlx(flatten)]
    product: Product,
}

#[async_trait]
impl WishlistStore for WishlistRepository {
    async fn insert(
        &self,
        user_id: UserId,
        product_id: ProductId,
    ) -> Result<Option<WishListEntryId>, RepositoryError> {
        let row: Option<(WishListEntryId,)> = sqlx::query_as(
            "INSERT INTO wish_list (user_id, product_id) VALUES ($1, $2)
             ON CONFLICT (user_id, product_id) DO NOTHING
             RETURNING wish_list_id",
        )
        .bind(user_id)
        .bind(product_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(RepositoryError::classify)?;
        Ok(row.map(|(id,)| id))
    }

    async fn find(
        &self,
        user_id: UserId,
        product_id: ProductId,
    ) -> Result<Option<WishListEntryId>, RepositoryError> {
        let row: Option<(WishListEntryId,)> = sqlx::query_as(
            "SELECT wish_list_id FROM wish_list WHERE user_id = $1 AND product_id = $2",
        )
        .bind(user_id)
        .bind(product_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(|(id,)| id))
    }

    async fn delete(&self, user_id: UserId, product_id: ProductId) -> Result<u64, RepositoryError> {
        let result = sqlx::query("DELETE FROM wish_list WHERE user_id = $1 AND product_id = $2")
            .bind(user_id)
            .bind(product_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    async fn with_products(
        &self,
        user_id: UserId,
    ) -> Result<Vec<(WishListEntry, Product)>, RepositoryError> {
        let rows = sqlx::query_as::<_, JoinedRow>(
            "SELECT w.wish_list_id, w.user_id, w.added_at,
                    p.product_id, p.name, p.price, p.stock, p.category_id,
                    p.quantity, p.brand, p.images
             FROM wish_list w
             JOIN products p ON p.product_id = w.product_id
             WHERE w.user_id = $1
             ORDER BY w.added_at, w.wish_list_id",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(|row| (row.entry, row.product)).collect())
    }
}
