//! Catalog query service.
//!
//! Reads consult the [`ProductCache`] before the store and populate it on a
//! miss. Every successful product write flushes the whole cache, so a read
//! after a write never sees a result cached before it.

use std::sync::Arc;

use tracing::instrument;

use catalog_core::ProductId;

use super::CatalogError;
use crate::cache::{CacheKey, ProductCache};
use crate::db::ProductStore;
use crate::models::{LISTING_LIMIT, NewProduct, Product, ProductFilter};

/// Product reads and writes.
#[derive(Clone)]
pub struct CatalogService {
    store: Arc<dyn ProductStore>,
    cache: ProductCache,
}

impl CatalogService {
    #[must_use]
    pub fn new(store: Arc<dyn ProductStore>, cache: ProductCache) -> Self {
        Self { store, cache }
    }

    // =========================================================================
    // Reads
    // =========================================================================

    /// Get a product by id.
    ///
    /// # Errors
    ///
    /// - `NotFound` if no product has this id
    /// - `Storage` on store failure
    #[instrument(skip(self))]
    pub async fn get_product(&self, id: ProductId) -> Result<Product, CatalogError> {
        let key = CacheKey::Product(id);
        if let Some(product) = self.cache.get(&key).await {
            return Ok(product);
        }

        let product = self
            .store
            .get(id)
            .await
            .map_err(|e| CatalogError::storage("get product", e))?
            .ok_or_else(|| CatalogError::NotFound(format!("product {id} not found")))?;

        self.cache.put(&key, &product).await;
        Ok(product)
    }

    /// Every product, ordered by id.
    ///
    /// # Errors
    ///
    /// Returns `Storage` on store failure.
    #[instrument(skip(self))]
    pub async fn list_products(&self) -> Result<Vec<Product>, CatalogError> {
        let key = CacheKey::AllProducts;
        if let Some(products) = self.cache.get(&key).await {
            return Ok(products);
        }

        let products = self
            .store
            .list()
            .await
            .map_err(|e| CatalogError::storage("list products", e))?;

        self.cache.put(&key, &products).await;
        Ok(products)
    }

    /// A random sample of products for the landing listing.
    ///
    /// The sample is cached, so it stays fixed until the cache entry expires
    /// or a product write flushes it.
    ///
    /// # Errors
    ///
    /// Returns `Storage` on store failure.
    #[instrument(skip(self))]
    pub async fn default_products(&self) -> Result<Vec<Product>, CatalogError> {
        let key = CacheKey::DefaultProducts;
        if let Some(products) = self.cache.get(&key).await {
            return Ok(products);
        }

        let products = self
            .store
            .sample(LISTING_LIMIT)
            .await
            .map_err(|e| CatalogError::storage("sample products", e))?;

        self.cache.put(&key, &products).await;
        Ok(products)
    }

    /// Products matching `filter`, newest first.
    ///
    /// Only non-empty results are cached.
    ///
    /// # Errors
    ///
    /// Returns `Storage` on store failure.
    #[instrument(skip(self))]
    pub async fn filtered_products(
        &self,
        filter: &ProductFilter,
    ) -> Result<Vec<Product>, CatalogError> {
        let key = CacheKey::Filtered(filter.signature());
        if let Some(products) = self.cache.get(&key).await {
            return Ok(products);
        }

        let products = self
            .store
            .filter(filter, LISTING_LIMIT)
            .await
            .map_err(|e| CatalogError::storage("filter products", e))?;

        if !products.is_empty() {
            self.cache.put(&key, &products).await;
        }
        Ok(products)
    }

    /// Case-insensitive search over name and brand. Never cached.
    ///
    /// # Errors
    ///
    /// - `Validation` if the query is blank
    /// - `Storage` on store failure
    #[instrument(skip(self))]
    pub async fn search_products(&self, query: &str) -> Result<Vec<Product>, CatalogError> {
        let query = query.trim();
        if query.is_empty() {
            return Err(CatalogError::Validation(vec![super::FieldError::required(
                "q",
            )]));
        }

        self.store
            .search(query, LISTING_LIMIT)
            .await
            .map_err(|e| CatalogError::storage("search products", e))
    }

    // =========================================================================
    // Writes
    // =========================================================================

    /// Create a product.
    ///
    /// # Errors
    ///
    /// - `Validation` if any field is invalid
    /// - `Storage` on store failure
    #[instrument(skip(self, product), fields(name = %product.name))]
    pub async fn create_product(&self, product: &NewProduct) -> Result<Product, CatalogError> {
        product.validate().map_err(CatalogError::Validation)?;

        let created = self
            .store
            .create(product)
            .await
            .map_err(|e| CatalogError::storage("create product", e))?;

        self.cache.flush().await;
        tracing::info!(product_id = %created.product_id, "product created");
        Ok(created)
    }

    /// Replace every field of a product.
    ///
    /// # Errors
    ///
    /// - `Validation` if any field is invalid
    /// - `NotFound` if no product has this id
    /// - `Storage` on store failure
    #[instrument(skip(self, product))]
    pub async fn update_product(
        &self,
        id: ProductId,
        product: &NewProduct,
    ) -> Result<Product, CatalogError> {
        product.validate().map_err(CatalogError::Validation)?;

        let updated = self
            .store
            .update(id, product)
            .await
            .map_err(|e| CatalogError::storage("update product", e))?
            .ok_or_else(|| CatalogError::NotFound(format!("product {id} not found")))?;

        self.cache.flush().await;
        tracing::info!(product_id = %id, "product updated");
        Ok(updated)
    }

    /// Delete a product. Its cart lines and wishlist entries go with it.
    ///
    /// # Errors
    ///
    /// - `NotFound` if no product has this id
    /// - `Storage` on store failure
    #[instrument(skip(self))]
    pub async fn delete_product(&self, id: ProductId) -> Result<(), CatalogError> {
        let deleted = self
            .store
            .delete(id)
            .await
            .map_err(|e| CatalogError::storage("delete product", e))?;
        if !deleted {
            return Err(CatalogError::NotFound(format!("product {id} not found")));
        }

        self.cache.flush().await;
        tracing::info!(product_id = %id, "product deleted");
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::BTreeMap;
    use std::time::Duration;

    use catalog_core::CategoryId;

    use super::*;
    use crate::cache::MokaCache;
    use crate::db::memory::MemoryStore;

    fn service() -> (CatalogService, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::new());
        let cache = ProductCache::new(Arc::new(MokaCache::new(64)), Duration::from_secs(60));
        (CatalogService::new(store.clone(), cache), store)
    }

    fn new_product(name: &str, brand: &str, price: i64) -> NewProduct {
        NewProduct {
            name: name.to_owned(),
            price,
            stock: 5,
            category_id: CategoryId::new(1),
            quantity: 1,
            brand: brand.to_owned(),
            images: vec!["front.jpg".to_owned()],
        }
    }

    #[tokio::test]
    async fn test_second_read_is_served_from_cache() {
        let (catalog, store) = service();
        let product = catalog
            .create_product(&new_product("Lamp", "Lumo", 30))
            .await
            .unwrap();

        catalog.get_product(product.product_id).await.unwrap();
        catalog.get_product(product.product_id).await.unwrap();

        assert_eq!(store.product_queries(), 1);
    }

    #[tokio::test]
    async fn test_write_invalidates_cached_reads() {
        let (catalog, store) = service();
        let product = catalog
            .create_product(&new_product("Lamp", "Lumo", 30))
            .await
            .unwrap();
        catalog.get_product(product.product_id).await.unwrap();
        catalog.list_products().await.unwrap();

        let updated = catalog
            .update_product(product.product_id, &new_product("Desk Lamp", "Lumo", 35))
            .await
            .unwrap();
        assert_eq!(updated.price, 35);

        let fresh = catalog.get_product(product.product_id).await.unwrap();
        assert_eq!(fresh.name, "Desk Lamp");
        assert_eq!(catalog.list_products().await.unwrap()[0].price, 35);
        assert_eq!(store.product_queries(), 4);
    }

    #[tokio::test]
    async fn test_empty_filtered_result_is_not_cached() {
        let (catalog, store) = service();
        let mut params = BTreeMap::new();
        params.insert("brand".to_owned(), vec!["Nobody".to_owned()]);
        let filter = ProductFilter::from_params(&params).unwrap();

        assert!(catalog.filtered_products(&filter).await.unwrap().is_empty());
        assert!(catalog.filtered_products(&filter).await.unwrap().is_empty());
        assert_eq!(store.product_queries(), 2);
    }

    #[tokio::test]
    async fn test_search_is_never_cached() {
        let (catalog, store) = service();
        catalog
            .create_product(&new_product("Lamp", "Lumo", 30))
            .await
            .unwrap();

        assert_eq!(catalog.search_products("lumo").await.unwrap().len(), 1);
        assert_eq!(catalog.search_products("LAMP").await.unwrap().len(), 1);
        assert_eq!(store.product_queries(), 2);
    }

    #[tokio::test]
    async fn test_missing_product_errors() {
        let (catalog, _store) = service();
        let id = ProductId::new(404);

        assert!(matches!(
            catalog.get_product(id).await,
            Err(CatalogError::NotFound(_))
        ));
        assert!(matches!(
            catalog.delete_product(id).await,
            Err(CatalogError::NotFound(_))
        ));
        assert!(matches!(
            catalog
                .update_product(id, &new_product("Lamp", "Lumo", 1))
                .await,
            Err(CatalogError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_invalid_product_is_rejected_before_store() {
        let (catalog, _store) = service();
        let err = catalog
            .create_product(&new_product("", "Lumo", -1))
            .await
            .unwrap_err();
        assert!(matches!(err, CatalogError::Validation(ref fields) if fields.len() == 2));
    }
}
