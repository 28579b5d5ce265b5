//! User domain types.
//!
//! Users only anchor carts and wishlists; there is no login flow here.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use catalog_core::{Email, UserId, UserRole};

/// A catalog user as returned to callers (never includes the password hash).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    pub user_id: UserId,
    pub name: String,
    pub email: Email,
    pub phone: Option<String>,
    pub role: UserRole,
    pub address: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields for inserting a user. The password is already hashed.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub email: Email,
    pub password_hash: String,
    pub phone: Option<String>,
    pub role: UserRole,
    pub address: Option<String>,
}
