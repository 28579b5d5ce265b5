//! Business logic services for the catalog.
//!
//! # Services
//!
//! - `catalog` - Product reads through the cache, product writes with invalidation
//! - `cart` - Stock-aware add/remove against the user's active cart
//! - `wishlist` - Conflict-safe add/remove of (user, product) pairs
//! - `users` - User creation with Argon2id password hashing

pub mod cart;
pub mod catalog;
pub mod users;
pub mod wishlist;

use std::fmt;

use thiserror::Error;

use crate::db::RepositoryError;

pub use cart::CartService;
pub use catalog::CatalogService;
pub use users::{CreateUserRequest, UserService};
pub use wishlist::WishlistService;

/// A single failed field check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    /// The field is missing or blank.
    #[must_use]
    pub fn required(field: &str) -> Self {
        Self::invalid(field, "is required")
    }

    #[must_use]
    pub fn invalid(field: &str, message: &str) -> Self {
        Self {
            field: field.to_owned(),
            message: message.to_owned(),
        }
    }
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.field, self.message)
    }
}

/// Errors returned by every service operation.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// The named entity does not exist.
    #[error("{0}")]
    NotFound(String),

    /// The add would push the cart line past the product's stock.
    #[error("cannot add {requested} items, only {available} available in stock")]
    InsufficientStock { requested: i32, available: i32 },

    /// The entity (or pair) already exists.
    #[error("{0}")]
    AlreadyExists(String),

    /// One or more fields failed validation.
    #[error("{}", join_fields(.0))]
    Validation(Vec<FieldError>),

    /// Password hashing error.
    #[error("password hashing failed")]
    PasswordHash,

    /// The store failed; `operation` names what was being attempted.
    #[error("{operation} failed")]
    Storage {
        operation: &'static str,
        #[source]
        source: RepositoryError,
    },
}

impl CatalogError {
    /// Wrap a store error with the operation it interrupted.
    #[must_use]
    pub const fn storage(operation: &'static str, source: RepositoryError) -> Self {
        Self::Storage { operation, source }
    }

    /// A single-field validation failure.
    #[must_use]
    pub fn invalid(field: &str, message: &str) -> Self {
        Self::Validation(vec![FieldError::invalid(field, message)])
    }
}

fn join_fields(errors: &[FieldError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_message_joins_fields() {
        let err = CatalogError::Validation(vec![
            FieldError::required("name"),
            FieldError::invalid("price", "must not be negative"),
        ]);
        assert_eq!(
            err.to_string(),
            "name is required, price must not be negative"
        );
    }

    #[test]
    fn test_insufficient_stock_message() {
        let err = CatalogError::InsufficientStock {
            requested: 5,
            available: 3,
        };
        assert_eq!(
            err.to_string(),
            "cannot add 5 items, only 3 available in stock"
        );
    }

    #[test]
    fn test_storage_keeps_source() {
        let err = CatalogError::storage(
            "get product",
            RepositoryError::Database(sqlx::Error::PoolTimedOut),
        );
        assert_eq!(err.to_string(), "get product failed");
        assert!(std::error::Error::source(&err).is_some());
    }
}
