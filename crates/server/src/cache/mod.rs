//! Read-through cache for product query results.
//!
//! Values are `serde_json` bytes under string keys. Two backends implement
//! [`CacheBackend`]: an in-process `moka` cache ([`local::MokaCache`], the
//! default) and Redis ([`remote::RedisCache`], when a Redis URL is
//! configured).
//!
//! The cache never fails a request. [`ProductCache`] turns backend errors
//! into misses on read and logs-and-drops them on write and flush.

pub mod local;
pub mod remote;

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;

use catalog_core::ProductId;

use crate::config::CatalogConfig;

pub use local::MokaCache;
pub use remote::RedisCache;

/// Errors from a cache backend.
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// A byte-oriented key-value store with per-entry TTL.
#[async_trait]
pub trait CacheBackend: Send + Sync {
    /// `Ok(None)` on a miss.
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, CacheError>;

    async fn set(&self, key: &str, value: Vec<u8>, ttl: Duration) -> Result<(), CacheError>;

    /// Drop every entry in the cache namespace.
    async fn flush_all(&self) -> Result<(), CacheError>;
}

/// Keys for cached product queries.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CacheKey {
    Product(ProductId),
    AllProducts,
    DefaultProducts,
    /// Carries the filter signature, e.g. `brand=Acme;min_price=10;`.
    Filtered(String),
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Product(id) => write!(f, "product:{id}"),
            Self::AllProducts => f.write_str("products:all"),
            Self::DefaultProducts => f.write_str("products:default"),
            Self::Filtered(signature) => write!(f, "products:filtered:{signature}"),
        }
    }
}

/// Typed cache-aside helper over a [`CacheBackend`].
#[derive(Clone)]
pub struct ProductCache {
    backend: Arc<dyn CacheBackend>,
    ttl: Duration,
}

impl ProductCache {
    #[must_use]
    pub fn new(backend: Arc<dyn CacheBackend>, ttl: Duration) -> Self {
        Self { backend, ttl }
    }

    /// Look up and decode a cached value.
    ///
    /// Backend failures and undecodable payloads are both reported as misses.
    pub async fn get<T: DeserializeOwned>(&self, key: &CacheKey) -> Option<T> {
        let key = key.to_string();
        let bytes = match self.backend.get(&key).await {
            Ok(Some(bytes)) => bytes,
            Ok(None) => {
                tracing::debug!(%key, "cache miss");
                return None;
            }
            Err(e) => {
                tracing::warn!(%key, error = %e, "cache read failed, treating as miss");
                return None;
            }
        };

        match serde_json::from_slice(&bytes) {
            Ok(value) => {
                tracing::debug!(%key, "cache hit");
                Some(value)
            }
            Err(e) => {
                tracing::warn!(%key, error = %e, "discarding undecodable cache payload");
                None
            }
        }
    }

    /// Encode and store a value with the configured TTL.
    pub async fn put<T: Serialize + Sync>(&self, key: &CacheKey, value: &T) {
        let key = key.to_string();
        let result = match serde_json::to_vec(value) {
            Ok(bytes) => self.backend.set(&key, bytes, self.ttl).await,
            Err(e) => Err(CacheError::from(e)),
        };
        if let Err(e) = result {
            tracing::warn!(%key, error = %e, "cache write failed");
        }
    }

    /// Drop every cached query result.
    pub async fn flush(&self) {
        match self.backend.flush_all().await {
            Ok(()) => tracing::info!("product cache flushed"),
            Err(e) => tracing::warn!(error = %e, "cache flush failed"),
        }
    }
}

/// Build the configured backend: Redis when a URL is set, `moka` otherwise.
///
/// # Errors
///
/// Returns `CacheError::Redis` if the Redis connection cannot be established.
pub async fn connect(config: &CatalogConfig) -> Result<Arc<dyn CacheBackend>, CacheError> {
    if let Some(url) = &config.redis_url {
        let cache = RedisCache::connect(url).await?;
        tracing::info!("using redis product cache");
        return Ok(Arc::new(cache));
    }
    tracing::info!(
        capacity = config.cache_capacity,
        "using in-process product cache"
    );
    Ok(Arc::new(MokaCache::new(config.cache_capacity)))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Mutex;

    use tracing::field::{Field, Visit};
    use tracing::{Event, Level, Subscriber};
    use tracing_subscriber::layer::{Context, Layer, SubscriberExt};

    use super::*;

    /// Collects the level and message of every event.
    #[derive(Clone, Default)]
    struct Recorded(Arc<Mutex<Vec<(Level, String)>>>);

    struct Message(String);

    impl Visit for Message {
        fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
            if field.name() == "message" {
                self.0 = format!("{value:?}");
            }
        }
    }

    impl<S: Subscriber> Layer<S> for Recorded {
        fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
            let mut message = Message(String::new());
            event.record(&mut message);
            self.0
                .lock()
                .unwrap()
                .push((*event.metadata().level(), message.0));
        }
    }

    #[test]
    fn test_key_format() {
        assert_eq!(CacheKey::Product(ProductId::new(42)).to_string(), "product:42");
        assert_eq!(CacheKey::AllProducts.to_string(), "products:all");
        assert_eq!(CacheKey::DefaultProducts.to_string(), "products:default");
        assert_eq!(
            CacheKey::Filtered("brand=Acme;".to_owned()).to_string(),
            "products:filtered:brand=Acme;"
        );
    }

    #[tokio::test]
    async fn test_corrupt_payload_is_a_miss() {
        let backend = Arc::new(MokaCache::new(16));
        backend
            .set("products:all", b"not json".to_vec(), Duration::from_secs(60))
            .await
            .unwrap();
        let cache = ProductCache::new(backend, Duration::from_secs(60));

        let value: Option<Vec<String>> = cache.get(&CacheKey::AllProducts).await;
        assert!(value.is_none());
    }

    #[tokio::test]
    async fn test_put_then_get_then_flush() {
        let cache = ProductCache::new(Arc::new(MokaCache::new(16)), Duration::from_secs(60));
        let key = CacheKey::Product(ProductId::new(1));

        cache.put(&key, &vec!["a".to_owned()]).await;
        let hit: Option<Vec<String>> = cache.get(&key).await;
        assert_eq!(hit, Some(vec!["a".to_owned()]));

        cache.flush().await;
        let miss: Option<Vec<String>> = cache.get(&key).await;
        assert!(miss.is_none());
    }

    #[tokio::test]
    async fn test_flush_logs_at_info() {
        let recorded = Recorded::default();
        let _guard = tracing::subscriber::set_default(
            tracing_subscriber::registry().with(recorded.clone()),
        );
        let cache = ProductCache::new(Arc::new(MokaCache::new(16)), Duration::from_secs(60));

        cache.flush().await;

        let events = recorded.0.lock().unwrap();
        assert!(
            events
                .iter()
                .any(|(level, message)| *level == Level::INFO && message == "product cache flushed"),
            "{events:?}"
        );
    }
}
