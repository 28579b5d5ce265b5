//! CLI subcommands.

pub mod migrate;
pub mod seed;

use thiserror::Error;

use catalog_server::cache::CacheError;
use catalog_server::config::ConfigError;
use catalog_server::services::CatalogError;

/// Errors from any CLI command.
#[derive(Debug, Error)]
pub enum CommandError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("cache error: {0}")]
    Cache(#[from] CacheError),

    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid seed file: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("{0}")]
    Catalog(#[from] CatalogError),

    #[error("{0} seed entries failed validation")]
    Invalid(usize),
}
