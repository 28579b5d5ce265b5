//! Seed the catalog from a YAML file.
//!
//! Products and users go through the same services the HTTP API uses, so
//! they are validated the same way and every product insert flushes the
//! product cache.
//!
//! # File Format
//!
//! ```yaml
//! products:
//!   - name: Trail Running Shoe
//!     price: 120
//!     stock: 40
//!     category_id: 3
//!     quantity: 1
//!     brand: Stride
//!     images: [shoe-front.jpg, shoe-side.jpg]
//! users:
//!   - name: Ada Lovelace
//!     email: ada@example.com
//!     password: analytical-engine
//!     role: admin
//! ```

use std::path::Path;

use serde::Deserialize;
use tracing::{error, info, warn};

use catalog_server::cache;
use catalog_server::config::CatalogConfig;
use catalog_server::db;
use catalog_server::models::NewProduct;
use catalog_server::services::{CatalogError, CreateUserRequest};
use catalog_server::state::AppState;

use super::CommandError;

/// Contents of a seed file.
#[derive(Debug, Deserialize)]
pub struct SeedFile {
    #[serde(default)]
    pub products: Vec<NewProduct>,
    #[serde(default)]
    pub users: Vec<CreateUserRequest>,
}

impl SeedFile {
    /// Parse a seed file.
    ///
    /// # Errors
    ///
    /// Returns `CommandError::Yaml` if the document does not match the format.
    pub fn parse(content: &str) -> Result<Self, CommandError> {
        Ok(serde_yaml::from_str(content)?)
    }

    /// Log every invalid entry and return how many there were.
    #[must_use]
    pub fn report_invalid(&self) -> usize {
        let mut invalid = 0;
        for (index, product) in self.products.iter().enumerate() {
            if let Err(fields) = product.validate() {
                invalid += 1;
                error!(index, name = %product.name, "invalid product: {}", CatalogError::Validation(fields));
            }
        }
        for (index, user) in self.users.iter().enumerate() {
            if let Err(fields) = user.validate() {
                invalid += 1;
                error!(index, email = %user.email, "invalid user: {}", CatalogError::Validation(fields));
            }
        }
        invalid
    }
}

/// Seed products and users from `file`.
///
/// Users whose email already exists are skipped, so re-running a seed file
/// only duplicates products.
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed, any entry is
/// invalid, or the database or cache is unreachable.
pub async fn run(file: &Path, dry_run: bool) -> Result<(), CommandError> {
    info!(path = %file.display(), "Loading seed file");
    let content = tokio::fs::read_to_string(file)
        .await
        .map_err(|source| CommandError::Io {
            path: file.display().to_string(),
            source,
        })?;
    let seed = SeedFile::parse(&content)?;
    info!(
        products = seed.products.len(),
        users = seed.users.len(),
        "Parsed seed file"
    );

    let invalid = seed.report_invalid();
    if invalid > 0 {
        return Err(CommandError::Invalid(invalid));
    }
    if dry_run {
        info!("Seed file is valid (dry run, nothing written)");
        return Ok(());
    }

    let config = CatalogConfig::from_env()?;
    let pool = db::create_pool(&config.database_url).await?;
    let cache_backend = cache::connect(&config).await?;
    let state = AppState::new(pool.clone(), cache_backend, config.cache_ttl);
    info!("Connected to database");

    for product in &seed.products {
        let created = state.catalog().create_product(product).await?;
        info!(product_id = %created.product_id, name = %created.name, "Inserted product");
    }

    let mut skipped = 0;
    for user in seed.users {
        let email = user.email.clone();
        match state.users().create(user).await {
            Ok(created) => info!(user_id = %created.user_id, %email, "Inserted user"),
            Err(CatalogError::AlreadyExists(_)) => {
                skipped += 1;
                warn!(%email, "User already exists, skipping");
            }
            Err(e) => return Err(e.into()),
        }
    }

    pool.close().await;
    info!(skipped, "Seeding complete!");
    Ok(())
}
