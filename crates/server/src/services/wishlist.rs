//! Wishlist engine.

use std::sync::Arc;

use tracing::instrument;

use catalog_core::{ProductId, UserId, WishListEntryId};

use super::CatalogError;
use crate::db::{RepositoryError, WishlistStore};
use crate::models::WishList;

/// Wishlist operations.
#[derive(Clone)]
pub struct WishlistService {
    store: Arc<dyn WishlistStore>,
}

impl WishlistService {
    #[must_use]
    pub fn new(store: Arc<dyn WishlistStore>) -> Self {
        Self { store }
    }

    /// Save a product to the user's wishlist.
    ///
    /// # Errors
    ///
    /// - `AlreadyExists` if the pair is already saved
    /// - `NotFound` if the user or product does not exist
    /// - `Storage` on store failure
    #[instrument(skip(self))]
    pub async fn add(
        &self,
        user_id: UserId,
        product_id: ProductId,
    ) -> Result<WishListEntryId, CatalogError> {
        match self.store.insert(user_id, product_id).await {
            Ok(Some(id)) => Ok(id),
            Ok(None) => Err(CatalogError::AlreadyExists(
                "product already added to wish list".to_owned(),
            )),
            Err(RepositoryError::MissingReference(_)) => Err(CatalogError::NotFound(
                "user or product not found".to_owned(),
            )),
            Err(e) => Err(CatalogError::storage("add to wish list", e)),
        }
    }

    /// Remove a product from the user's wishlist.
    ///
    /// # Errors
    ///
    /// - `NotFound` if the pair is not saved
    /// - `Storage` on store failure
    #[instrument(skip(self))]
    pub async fn remove(&self, user_id: UserId, product_id: ProductId) -> Result<(), CatalogError> {
        self.store
            .find(user_id, product_id)
            .await
            .map_err(|e| CatalogError::storage("find wish list entry", e))?
            .ok_or_else(|| CatalogError::NotFound("item not found on wishlist".to_owned()))?;

        let removed = self
            .store
            .delete(user_id, product_id)
            .await
            .map_err(|e| CatalogError::storage("remove from wish list", e))?;
        // A concurrent remove won between the read and the delete; the entry
        // is gone either way.
        if removed == 0 {
            tracing::debug!("wish list entry already removed");
        }
        Ok(())
    }

    /// The user's entries and their products, index-aligned.
    ///
    /// # Errors
    ///
    /// Returns `Storage` on store failure.
    #[instrument(skip(self))]
    pub async fn fetch(&self, user_id: UserId) -> Result<WishList, CatalogError> {
        let rows = self
            .store
            .with_products(user_id)
            .await
            .map_err(|e| CatalogError::storage("fetch wish list", e))?;
        Ok(WishList::from_rows(rows))
    }
}
