//! Cart mutation engine.
//!
//! Adding a product either inserts a new line or accumulates onto the
//! existing one, never letting a line exceed the product's stock. The
//! decision is [`plan_cart_item`]; the store runs it inside its atomic
//! add-to-cart sequence.

use std::sync::Arc;

use tracing::instrument;

use catalog_core::{CartItemId, ProductId, UserId, line_subtotal};

use super::CatalogError;
use crate::db::{CartStore, RepositoryError, UpsertError};
use crate::models::{CartContents, CartItemPlan, ExistingLine, ProductSnapshot, StockShortfall};

/// Decide what an add-to-cart call writes.
///
/// With no existing line, a new line is planned at the current price. With
/// one, the quantity accumulates, the discount is replaced by the latest
/// value, and the subtotal grows by the increment priced at the line's
/// snapshotted `price_at_time`.
///
/// # Errors
///
/// Returns `StockShortfall` when the line would exceed `snapshot.stock`.
pub fn plan_cart_item(
    quantity: i32,
    discount: i64,
    snapshot: ProductSnapshot,
    existing: Option<ExistingLine>,
) -> Result<CartItemPlan, StockShortfall> {
    let in_cart = existing.map_or(0, |line| line.quantity);
    let available = snapshot.stock.saturating_sub(in_cart).max(0);
    if quantity > available {
        return Err(StockShortfall {
            requested: quantity,
            available,
        });
    }

    Ok(match existing {
        None => CartItemPlan::Insert {
            quantity,
            price_at_time: snapshot.price,
            discount,
            subtotal: line_subtotal(snapshot.price, quantity, discount),
        },
        Some(line) => CartItemPlan::Update {
            cart_item_id: line.cart_item_id,
            quantity: line.quantity + quantity,
            discount,
            subtotal: line
                .subtotal
                .saturating_add(line_subtotal(line.price_at_time, quantity, discount)),
        },
    })
}

/// Cart operations scoped to a user's active cart.
#[derive(Clone)]
pub struct CartService {
    store: Arc<dyn CartStore>,
}

impl CartService {
    #[must_use]
    pub fn new(store: Arc<dyn CartStore>) -> Self {
        Self { store }
    }

    /// Add `quantity` units of a product to the user's active cart.
    ///
    /// Creates the cart on first use. Returns the id of the line written.
    ///
    /// # Errors
    ///
    /// - `Validation` if `quantity` is not positive or `discount` is negative
    /// - `NotFound` if the product or user does not exist
    /// - `InsufficientStock` if the line would exceed the product's stock
    /// - `Storage` on store failure
    #[instrument(skip(self))]
    pub async fn add_to_cart(
        &self,
        user_id: UserId,
        product_id: ProductId,
        quantity: i32,
        discount: i64,
    ) -> Result<CartItemId, CatalogError> {
        if quantity <= 0 {
            return Err(CatalogError::invalid("quantity", "must be greater than zero"));
        }
        if discount < 0 {
            return Err(CatalogError::invalid("discount", "must not be negative"));
        }

        let plan = move |snapshot: ProductSnapshot, existing: Option<ExistingLine>| {
            plan_cart_item(quantity, discount, snapshot, existing)
        };

        match self.store.upsert_item(user_id, product_id, &plan).await {
            Ok(cart_item_id) => {
                tracing::debug!(cart_item_id = %cart_item_id, "cart line written");
                Ok(cart_item_id)
            }
            Err(UpsertError::ProductNotFound) => {
                Err(CatalogError::NotFound("product not found".to_owned()))
            }
            Err(UpsertError::Rejected(shortfall)) => Err(CatalogError::InsufficientStock {
                requested: shortfall.requested,
                available: shortfall.available,
            }),
            Err(UpsertError::Repository(RepositoryError::MissingReference(_))) => {
                Err(CatalogError::NotFound("user not found".to_owned()))
            }
            Err(UpsertError::Repository(e)) => Err(CatalogError::storage("add to cart", e)),
        }
    }

    /// Remove a product's line from the user's active cart.
    ///
    /// Removing a product that is not in the cart succeeds.
    ///
    /// # Errors
    ///
    /// - `NotFound` if the user has no active cart
    /// - `Storage` on store failure
    #[instrument(skip(self))]
    pub async fn remove_from_cart(
        &self,
        user_id: UserId,
        product_id: ProductId,
    ) -> Result<(), CatalogError> {
        let cart = self
            .store
            .active_cart(user_id)
            .await
            .map_err(|e| CatalogError::storage("find active cart", e))?
            .ok_or_else(|| CatalogError::NotFound("no cart found for the user".to_owned()))?;

        let removed = self
            .store
            .delete_item(cart.cart_id, product_id)
            .await
            .map_err(|e| CatalogError::storage("remove from cart", e))?;
        tracing::debug!(removed, "cart line removed");
        Ok(())
    }

    /// The user's active cart with its lines, oldest first.
    ///
    /// # Errors
    ///
    /// - `NotFound` if the user has no active cart
    /// - `Storage` on store failure
    #[instrument(skip(self))]
    pub async fn fetch_cart(&self, user_id: UserId) -> Result<CartContents, CatalogError> {
        let cart = self
            .store
            .active_cart(user_id)
            .await
            .map_err(|e| CatalogError::storage("find active cart", e))?
            .ok_or_else(|| CatalogError::NotFound("no cart found for the user".to_owned()))?;

        let items = self
            .store
            .items(cart.cart_id)
            .await
            .map_err(|e| CatalogError::storage("list cart items", e))?;
        Ok(CartContents { cart, items })
    }
}
