//! Catalog service configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `CATALOG_DATABASE_URL` - `PostgreSQL` connection string (falls back to `DATABASE_URL`)
//!
//! ## Optional
//! - `CATALOG_HOST` - Bind address (default: 127.0.0.1)
//! - `CATALOG_PORT` - Listen port (default: 8082)
//! - `CATALOG_REDIS_URL` - Redis URL; when unset the in-process cache is used
//! - `CATALOG_CACHE_TTL_SECS` - Cache entry lifetime (default: 604800, one week)
//! - `CATALOG_CACHE_CAPACITY` - In-process cache entry limit (default: 10000)
//! - `CATALOG_SHUTDOWN_GRACE_SECS` - Drain period for in-flight requests (default: 5)
//! - `CATALOG_LOG_FORMAT` - `json` for JSON log lines; anything else logs text
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment tag

use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;
use std::time::Duration;

use secrecy::SecretString;
use thiserror::Error;

const DEFAULT_HOST: &str = "127.0.0.1";
const DEFAULT_PORT: &str = "8082";
const DEFAULT_CACHE_TTL_SECS: &str = "604800";
const DEFAULT_CACHE_CAPACITY: &str = "10000";
const DEFAULT_SHUTDOWN_GRACE_SECS: &str = "5";

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Output format of the fmt logging layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Human-readable lines.
    #[default]
    Text,
    /// One flattened JSON object per event.
    Json,
}

impl LogFormat {
    fn from_setting(value: Option<&str>) -> Self {
        match value {
            Some(format) if format.trim().eq_ignore_ascii_case("json") => Self::Json,
            _ => Self::Text,
        }
    }
}

/// Catalog service configuration.
///
/// `Debug` is derived; the database and Redis URLs are `SecretString`s and
/// print redacted.
#[derive(Debug, Clone)]
pub struct CatalogConfig {
    /// `PostgreSQL` database connection URL (contains password)
    pub database_url: SecretString,
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Redis URL for the shared cache (may contain a password)
    pub redis_url: Option<SecretString>,
    /// Lifetime of each cache entry
    pub cache_ttl: Duration,
    /// Maximum entries held by the in-process cache
    pub cache_capacity: u64,
    /// How long in-flight requests may run after a shutdown signal
    pub shutdown_grace: Duration,
    /// Log output format
    pub log_format: LogFormat,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment name
    pub sentry_environment: Option<String>,
}

impl CatalogConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the database URL is missing or any variable
    /// fails to parse.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary variable source.
    ///
    /// # Errors
    ///
    /// Same as [`CatalogConfig::from_env`].
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let vars = Vars { lookup };

        Ok(Self {
            database_url: vars.database_url("CATALOG_DATABASE_URL")?,
            host: vars.parsed("CATALOG_HOST", DEFAULT_HOST)?,
            port: vars.parsed("CATALOG_PORT", DEFAULT_PORT)?,
            redis_url: vars.optional("CATALOG_REDIS_URL").map(SecretString::from),
            cache_ttl: Duration::from_secs(
                vars.parsed("CATALOG_CACHE_TTL_SECS", DEFAULT_CACHE_TTL_SECS)?,
            ),
            cache_capacity: vars.parsed("CATALOG_CACHE_CAPACITY", DEFAULT_CACHE_CAPACITY)?,
            shutdown_grace: Duration::from_secs(
                vars.parsed("CATALOG_SHUTDOWN_GRACE_SECS", DEFAULT_SHUTDOWN_GRACE_SECS)?,
            ),
            log_format: LogFormat::from_setting(vars.optional("CATALOG_LOG_FORMAT").as_deref()),
            sentry_dsn: vars.optional("SENTRY_DSN"),
            sentry_environment: vars.optional("SENTRY_ENVIRONMENT"),
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

struct Vars<F> {
    lookup: F,
}

impl<F: Fn(&str) -> Option<String>> Vars<F> {
    /// Get an optional variable; blank values count as unset.
    fn optional(&self, key: &str) -> Option<String> {
        (self.lookup)(key).filter(|value| !value.trim().is_empty())
    }

    /// Get and parse a variable, falling back to `default` when unset.
    fn parsed<T>(&self, key: &str, default: &str) -> Result<T, ConfigError>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        let raw = self.optional(key).unwrap_or_else(|| default.to_string());
        raw.trim()
            .parse::<T>()
            .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
    }

    /// Get database URL with fallback to generic `DATABASE_URL`.
    fn database_url(&self, primary_key: &str) -> Result<SecretString, ConfigError> {
        self.optional(primary_key)
            .or_else(|| self.optional("DATABASE_URL"))
            .map(SecretString::from)
            .ok_or_else(|| ConfigError::MissingEnvVar(primary_key.to_string()))
    }
}
