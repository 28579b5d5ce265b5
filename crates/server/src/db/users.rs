//! User repository for database operations.
//!
//! Users exist so carts and wishlists have something to point at. The
//! password hash is written but never read back.

use async_trait::async_trait;
use sqlx::PgPool;

use super::{RepositoryError, UserStore};
use crate::models::{NewUser, User};

const USER_COLUMNS: &str = "user_id, name, email, phone, role, address, created_at, updated_at";

/// Repository for user database operations.
#[derive(Clone)]
pub struct UserRepository {
    pool: PgPool,
}

impl UserRepository {
    /// Create a new user repository.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserStore for UserRepository {
    async fn create(&self, user: &NewUser) -> Result<User, RepositoryError> {
        let sql = format!(
            "INSERT INTO users (name, email, password_hash, phone, role, address)
             VALUES ($1, $2, $3, $4, $5, $6)
             RETURNING {USER_COLUMNS}"
        );
        sqlx::query_as::<_, User>(&sql)
            .bind(&user.name)
            .bind(&user.email)
            .bind(&user.password_hash)
            .bind(&user.phone)
            .bind(user.role)
            .bind(&user.address)
            .fetch_one(&self.pool)
            .await
            .map_err(RepositoryError::classify)
    }
}
