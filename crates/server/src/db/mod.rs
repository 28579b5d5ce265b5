//! Catalog store: persistence for products, users, carts, and wishlists.
//!
//! # Tables
//!
//! - `products` - Catalog entries; the source of truth the cache mirrors
//! - `users` - Foreign-key anchor for carts and wishlists
//! - `carts` - One `active` cart per user (partial unique index)
//! - `cart_items` - Unique per `(cart_id, product_id)`
//! - `wish_list` - Unique per `(user_id, product_id)`
//!
//! # Seams
//!
//! Services talk to the store through the traits below. Two implementations
//! exist: the `PostgreSQL` repositories in this module's submodules and,
//! for tests, the in-memory store in [`memory`].
//!
//! # Migrations
//!
//! Migrations are stored in `crates/server/migrations/` and run via:
//! ```bash
//! cargo run -p catalog-cli -- migrate
//! ```

pub mod carts;
#[cfg(any(test, feature = "test-util"))]
pub mod memory;
pub mod products;
pub mod users;
pub mod wishlist;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

use catalog_core::{CartId, CartItemId, ProductId, UserId, WishListEntryId};

use crate::models::{
    Cart, CartItem, CartItemPlan, ExistingLine, NewProduct, NewUser, Product, ProductFilter,
    ProductSnapshot, StockShortfall, User, WishListEntry,
};

pub use carts::CartRepository;
pub use products::ProductRepository;
pub use users::UserRepository;
pub use wishlist::WishlistRepository;

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Constraint violation (e.g., unique email).
    #[error("constraint violation: {0}")]
    Conflict(String),

    /// A foreign key points at a row that does not exist.
    #[error("missing reference: {0}")]
    MissingReference(String),
}

impl RepositoryError {
    /// Classify a sqlx error by the constraint it tripped, if any.
    pub(crate) fn classify(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(ref db_err) = err {
            let constraint = db_err.constraint().unwrap_or("unknown").to_owned();
            if db_err.is_unique_violation() {
                return Self::Conflict(constraint);
            }
            if db_err.is_foreign_key_violation() {
                return Self::MissingReference(constraint);
            }
        }
        Self::Database(err)
    }
}

/// Errors from the atomic add-to-cart sequence.
#[derive(Debug, Error)]
pub enum UpsertError {
    /// The product row does not exist.
    #[error("product not found")]
    ProductNotFound,

    /// The plan refused the add.
    #[error("cannot add {} items, only {} available", .0.requested, .0.available)]
    Rejected(StockShortfall),

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

impl From<sqlx::Error> for UpsertError {
    fn from(err: sqlx::Error) -> Self {
        Self::Repository(RepositoryError::classify(err))
    }
}

/// Decides what to write for an add-to-cart call, given the locked product
/// and the existing line for it.
pub type PlanFn<'a> = dyn Fn(ProductSnapshot, Option<ExistingLine>) -> Result<CartItemPlan, StockShortfall>
    + Send
    + Sync
    + 'a;

/// Product persistence.
#[async_trait]
pub trait ProductStore: Send + Sync {
    /// Insert a product and return the stored row.
    async fn create(&self, product: &NewProduct) -> Result<Product, RepositoryError>;

    async fn get(&self, id: ProductId) -> Result<Option<Product>, RepositoryError>;

    /// All products ordered by id.
    async fn list(&self) -> Result<Vec<Product>, RepositoryError>;

    /// A random sample of at most `limit` products.
    async fn sample(&self, limit: i64) -> Result<Vec<Product>, RepositoryError>;

    /// Products matching `filter`, newest id first, at most `limit`.
    async fn filter(
        &self,
        filter: &ProductFilter,
        limit: i64,
    ) -> Result<Vec<Product>, RepositoryError>;

    /// Case-insensitive substring match on name or brand, newest id first.
    async fn search(&self, query: &str, limit: i64) -> Result<Vec<Product>, RepositoryError>;

    /// Replace every field of a product. `None` if it does not exist.
    async fn update(
        &self,
        id: ProductId,
        product: &NewProduct,
    ) -> Result<Option<Product>, RepositoryError>;

    /// Delete a product. Returns `false` if it did not exist.
    async fn delete(&self, id: ProductId) -> Result<bool, RepositoryError>;
}

/// Cart persistence.
#[async_trait]
pub trait CartStore: Send + Sync {
    /// Run the add-to-cart sequence as one atomic unit.
    ///
    /// Resolves (or creates) the user's active cart, reads the product and
    /// any existing line for it, asks `plan` what to write, and writes it.
    /// Nothing is written when `plan` refuses.
    async fn upsert_item(
        &self,
        user_id: UserId,
        product_id: ProductId,
        plan: &PlanFn<'_>,
    ) -> Result<CartItemId, UpsertError>;

    /// The user's active cart, if any.
    async fn active_cart(&self, user_id: UserId) -> Result<Option<Cart>, RepositoryError>;

    /// Delete the line for `product_id`. Returns the number of rows removed.
    async fn delete_item(
        &self,
        cart_id: CartId,
        product_id: ProductId,
    ) -> Result<u64, RepositoryError>;

    /// Lines of a cart, oldest first.
    async fn items(&self, cart_id: CartId) -> Result<Vec<CartItem>, RepositoryError>;
}

/// Wishlist persistence.
#[async_trait]
pub trait WishlistStore: Send + Sync {
    /// Insert unless the pair already exists. `None` on conflict.
    async fn insert(
        &self,
        user_id: UserId,
        product_id: ProductId,
    ) -> Result<Option<WishListEntryId>, RepositoryError>;

    async fn find(
        &self,
        user_id: UserId,
        product_id: ProductId,
    ) -> Result<Option<WishListEntryId>, RepositoryError>;

    /// Returns the number of rows removed.
    async fn delete(&self, user_id: UserId, product_id: ProductId) -> Result<u64, RepositoryError>;

    /// Entries joined to their products, oldest entry first.
    async fn with_products(
        &self,
        user_id: UserId,
    ) -> Result<Vec<(WishListEntry, Product)>, RepositoryError>;
}

/// User persistence.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Returns `RepositoryError::Conflict` if the email is taken.
    async fn create(&self, user: &NewUser) -> Result<User, RepositoryError>;
}

/// The set of stores a running service uses.
#[derive(Clone)]
pub struct Stores {
    pub products: Arc<dyn ProductStore>,
    pub carts: Arc<dyn CartStore>,
    pub wishlist: Arc<dyn WishlistStore>,
    pub users: Arc<dyn UserStore>,
}

impl Stores {
    /// `PostgreSQL` repositories sharing one pool.
    #[must_use]
    pub fn postgres(pool: &PgPool) -> Self {
        Self {
            products: Arc::new(ProductRepository::new(pool.clone())),
            carts: Arc::new(CartRepository::new(pool.clone())),
            wishlist: Arc::new(WishlistRepository::new(pool.clone())),
            users: Arc::new(UserRepository::new(pool.clone())),
        }
    }

    /// Every store backed by the same in-memory state.
    #[cfg(any(test, feature = "test-util"))]
    #[must_use]
    pub fn memory(store: &Arc<memory::MemoryStore>) -> Self {
        Self {
            products: store.clone(),
            carts: store.clone(),
            wishlist: store.clone(),
            users: store.clone(),
        }
    }
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Arguments
///
/// * `database_url` - `PostgreSQL` connection string (wrapped in `SecretString`)
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}
