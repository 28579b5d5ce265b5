//! Application state shared across handlers.

use std::sync::Arc;
use std::time::Duration;

use sqlx::PgPool;

use crate::cache::{CacheBackend, ProductCache};
use crate::db::Stores;
use crate::services::{CartService, CatalogService, UserService, WishlistService};

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to the
/// services and, when running against `PostgreSQL`, the connection pool.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    pool: Option<PgPool>,
    catalog: CatalogService,
    carts: CartService,
    wishlist: WishlistService,
    users: UserService,
}

impl AppState {
    /// Create state backed by `PostgreSQL`.
    ///
    /// # Arguments
    ///
    /// * `pool` - `PostgreSQL` connection pool
    /// * `cache` - Product cache backend
    /// * `cache_ttl` - Lifetime of each cached query result
    #[must_use]
    pub fn new(pool: PgPool, cache: Arc<dyn CacheBackend>, cache_ttl: Duration) -> Self {
        let stores = Stores::postgres(&pool);
        Self::build(Some(pool), &stores, cache, cache_ttl)
    }

    /// Create state over arbitrary stores, with no pool.
    ///
    /// Readiness always reports ready in this mode.
    #[must_use]
    pub fn with_stores(stores: &Stores, cache: Arc<dyn CacheBackend>, cache_ttl: Duration) -> Self {
        Self::build(None, stores, cache, cache_ttl)
    }

    fn build(
        pool: Option<PgPool>,
        stores: &Stores,
        cache: Arc<dyn CacheBackend>,
        cache_ttl: Duration,
    ) -> Self {
        let cache = ProductCache::new(cache, cache_ttl);
        Self {
            inner: Arc::new(AppStateInner {
                pool,
                catalog: CatalogService::new(stores.products.clone(), cache),
                carts: CartService::new(stores.carts.clone()),
                wishlist: WishlistService::new(stores.wishlist.clone()),
                users: UserService::new(stores.users.clone()),
            }),
        }
    }

    /// Get a reference to the database connection pool, if any.
    #[must_use]
    pub fn pool(&self) -> Option<&PgPool> {
        self.inner.pool.as_ref()
    }

    /// Product reads and writes.
    #[must_use]
    pub fn catalog(&self) -> &CatalogService {
        &self.inner.catalog
    }

    /// Cart mutations.
    #[must_use]
    pub fn carts(&self) -> &CartService {
        &self.inner.carts
    }

    /// Wishlist mutations.
    #[must_use]
    pub fn wishlist(&self) -> &WishlistService {
        &self.inner.wishlist
    }

    /// User creation.
    #[must_use]
    pub fn users(&self) -> &UserService {
        &self.inner.users
    }
}
