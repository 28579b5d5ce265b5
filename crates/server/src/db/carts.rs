//! Cart repository for database operations.
//!
//! The add-to-cart sequence runs in a single transaction. The product row is
//! locked with `FOR UPDATE`, so concurrent adds of the same product serialize
//! and the stock check always sees the latest committed line quantities.

use async_trait::async_trait;
use sqlx::PgPool;

use catalog_core::{CartId, CartItemId, ProductId, UserId};

use super::{CartStore, PlanFn, RepositoryError, UpsertError};
use crate::models::{Cart, CartItem, CartItemPlan, ExistingLine, ProductSnapshot};

const CART_COLUMNS: &str = "cart_id, user_id, status, created_at, updated_at";
const ITEM_COLUMNS: &str =
    "cart_item_id, cart_id, product_id, quantity, price_at_time, discount, subtotal, added_at";

/// Repository for cart database operations.
#[derive(Clone)]
pub struct CartRepository {
    pool: PgPool,
}

impl CartRepository {
    /// Create a new cart repository.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CartStore for CartRepository {
    async fn upsert_item(
        &self,
        user_id: UserId,
        product_id: ProductId,
        plan: &PlanFn<'_>,
    ) -> Result<CartItemId, UpsertError> {
        let mut tx = self.pool.begin().await?;

        let snapshot: Option<(i64, i32)> = sqlx::query_as(
            "SELECT price, stock FROM products WHERE product_id = $1 FOR UPDATE",
        )
        .bind(product_id)
        .fetch_optional(&mut *tx)
        .await?;
        let Some((price, stock)) = snapshot else {
            return Err(UpsertError::ProductNotFound);
        };

        // Partial unique index on active carts makes this race-free.
        sqlx::query(
            "INSERT INTO carts (user_id, status) VALUES ($1, 'active')
             ON CONFLICT (user_id) WHERE status = 'active' DO NOTHING",
        )
        .bind(user_id)
        .execute(&mut *tx)
        .await?;

        let (cart_id,): (CartId,) =
            sqlx::query_as("SELECT cart_id FROM carts WHERE user_id = $1 AND status = 'active'")
                .bind(user_id)
                .fetch_one(&mut *tx)
                .await?;

        let existing = sqlx::query_as::<_, ExistingLine>(
            "SELECT cart_item_id, quantity, price_at_time, subtotal
             FROM cart_items
             WHERE cart_id = $1 AND product_id = $2
             FOR UPDATE",
        )
        .bind(cart_id)
        .bind(product_id)
        .fetch_optional(&mut *tx)
        .await?;

        // Dropping the transaction on refusal rolls back the cart insert too.
        let decision =
            plan(ProductSnapshot { price, stock }, existing).map_err(UpsertError::Rejected)?;

        let cart_item_id = match decision {
            CartItemPlan::Insert {
                quantity,
                price_at_time,
                discount,
                subtotal,
            } => {
                let (id,): (CartItemId,) = sqlx::query_as(
                    "INSERT INTO cart_items
                         (cart_id, product_id, quantity, price_at_time, discount, subtotal)
                     VALUES ($1, $2, $3, $4, $5, $6)
                     RETURNING cart_item_id",
                )
                .bind(cart_id)
                .bind(product_id)
                .bind(quantity)
                .bind(price_at_time)
                .bind(discount)
                .bind(subtotal)
                .fetch_one(&mut *tx)
                .await?;
                id
            }
            CartItemPlan::Update {
                cart_item_id,
                quantity,
                discount,
                subtotal,
            } => {
                sqlx::query(
                    "UPDATE cart_items SET quantity = $1, discount = $2, subtotal = $3
                     WHERE cart_item_id = $4",
                )
                .bind(quantity)
                .bind(discount)
                .bind(subtotal)
                .bind(cart_item_id)
                .execute(&mut *tx)
                .await?;
                cart_item_id
            }
        };

        sqlx::query("UPDATE carts SET updated_at = now() WHERE cart_id = $1")
            .bind(cart_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(cart_item_id)
    }

    async fn active_cart(&self, user_id: UserId) -> Result<Option<Cart>, RepositoryError> {
        let sql = format!(
            "SELECT {CART_COLUMNS} FROM carts WHERE user_id = $1 AND status = 'active'"
        );
        let cart = sqlx::query_as::<_, Cart>(&sql)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(cart)
    }

    async fn delete_item(
        &self,
        cart_id: CartId,
        product_id: ProductId,
    ) -> Result<u64, RepositoryError> {
        let result = sqlx::query("DELETE FROM cart_items WHERE cart_id = $1 AND product_id = $2")
            .bind(cart_id)
            .bind(product_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    async fn items(&self, cart_id: CartId) -> Result<Vec<CartItem>, RepositoryError> {
        let sql = format!(
            "SELECT {ITEM_COLUMNS} FROM cart_items WHERE cart_id = $1 ORDER BY added_at, cart_item_id"
        );
        let items = sqlx::query_as::<_, CartItem>(&sql)
            .bind(cart_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(items)
    }
}
