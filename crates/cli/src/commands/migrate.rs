//! Database migration command.
//!
//! # Usage
//!
//! ```bash
//! catalog-cli migrate
//! ```
//!
//! # Environment Variables
//!
//! - `CATALOG_DATABASE_URL` - `PostgreSQL` connection string (falls back to `DATABASE_URL`)
//!
//! # Migration Files
//!
//! Migrations live in `crates/server/migrations/` and are embedded at build
//! time.

use tracing::info;

use catalog_server::config::CatalogConfig;
use catalog_server::db;

use super::CommandError;

/// Run all pending catalog migrations.
///
/// # Errors
///
/// Returns an error if configuration is missing, the database is
/// unreachable, or a migration fails.
pub async fn run() -> Result<(), CommandError> {
    let config = CatalogConfig::from_env()?;

    info!("Connecting to catalog database...");
    let pool = db::create_pool(&config.database_url).await?;

    info!("Running catalog migrations...");
    sqlx::migrate!("../server/migrations").run(&pool).await?;

    pool.close().await;
    info!("Catalog migrations complete!");
    Ok(())
}
