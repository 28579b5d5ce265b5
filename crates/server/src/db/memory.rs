//! In-memory store for tests.
//!
//! Implements every store trait over one mutex-guarded set of tables, with
//! the same constraints the `PostgreSQL` schema enforces: unique emails, one
//! active cart per user, unique cart lines and wishlist pairs, foreign keys,
//! and cascading product deletes. Each trait method holds the lock for its
//! whole body, so the add-to-cart sequence is atomic here too.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use chrono::Utc;
use rand::seq::SliceRandom;

use catalog_core::{
    CartId, CartItemId, CartStatus, ProductId, UserId, WishListEntryId,
};

use super::{
    CartStore, PlanFn, ProductStore, RepositoryError, UpsertError, UserStore, WishlistStore,
};
use crate::models::{
    Cart, CartItem, CartItemPlan, ExistingLine, NewProduct, NewUser, Product, ProductFilter,
    ProductSnapshot, User, WishListEntry,
};

#[derive(Default)]
struct Tables {
    products: BTreeMap<ProductId, Product>,
    users: BTreeMap<UserId, User>,
    carts: Vec<Cart>,
    cart_items: Vec<CartItem>,
    wish_list: Vec<WishListEntry>,
    next_id: i32,
}

impl Tables {
    /// One sequence shared by every table, like `SERIAL` columns but global.
    fn next_id(&mut self) -> i32 {
        self.next_id += 1;
        self.next_id
    }
}

/// Store backed by process memory.
#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
    product_queries: AtomicUsize,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of product reads that reached the store.
    ///
    /// Tests use this to tell cache hits from misses.
    #[must_use]
    pub fn product_queries(&self) -> usize {
        self.product_queries.load(Ordering::SeqCst)
    }

    /// Set a product's stock directly, bypassing the cache.
    pub fn set_stock(&self, id: ProductId, stock: i32) {
        if let Some(product) = self.lock().products.get_mut(&id) {
            product.stock = stock;
        }
    }

    fn lock(&self) -> MutexGuard<'_, Tables> {
        self.tables.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn count_product_query(&self) {
        self.product_queries.fetch_add(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl ProductStore for MemoryStore {
    async fn create(&self, product: &NewProduct) -> Result<Product, RepositoryError> {
        let mut tables = self.lock();
        let product_id = ProductId::new(tables.next_id());
        let stored = Product {
            product_id,
            name: product.name.clone(),
            price: product.price,
            stock: product.stock,
            category_id: product.category_id,
            quantity: product.quantity,
            brand: product.brand.clone(),
            images: product.images.clone(),
        };
        tables.products.insert(product_id, stored.clone());
        Ok(stored)
    }

    async fn get(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        self.count_product_query();
        Ok(self.lock().products.get(&id).cloned())
    }

    async fn list(&self) -> Result<Vec<Product>, RepositoryError> {
        self.count_product_query();
        Ok(self.lock().products.values().cloned().collect())
    }

    async fn sample(&self, limit: i64) -> Result<Vec<Product>, RepositoryError> {
        self.count_product_query();
        let mut products: Vec<Product> = self.lock().products.values().cloned().collect();
        products.shuffle(&mut rand::rng());
        products.truncate(usize::try_from(limit).unwrap_or(0));
        Ok(products)
    }

    async fn filter(
        &self,
        filter: &ProductFilter,
        limit: i64,
    ) -> Result<Vec<Product>, RepositoryError> {
        self.count_product_query();
        Ok(self
            .lock()
            .products
            .values()
            .rev()
            .filter(|product| filter.matches(product))
            .take(usize::try_from(limit).unwrap_or(0))
            .cloned()
            .collect())
    }

    async fn search(&self, query: &str, limit: i64) -> Result<Vec<Product>, RepositoryError> {
        self.count_product_query();
        let needle = query.to_lowercase();
        Ok(self
            .lock()
            .products
            .values()
            .rev()
            .filter(|product| {
                product.name.to_lowercase().contains(&needle)
                    || product.brand.to_lowercase().contains(&needle)
            })
            .take(usize::try_from(limit).unwrap_or(0))
            .cloned()
            .collect())
    }

    async fn update(
        &self,
        id: ProductId,
        product: &NewProduct,
    ) -> Result<Option<Product>, RepositoryError> {
        let mut tables = self.lock();
        let Some(stored) = tables.products.get_mut(&id) else {
            return Ok(None);
        };
        stored.name.clone_from(&product.name);
        stored.price = product.price;
        stored.stock = product.stock;
        stored.category_id = product.category_id;
        stored.quantity = product.quantity;
        stored.brand.clone_from(&product.brand);
        stored.images.clone_from(&product.images);
        Ok(Some(stored.clone()))
    }

    async fn delete(&self, id: ProductId) -> Result<bool, RepositoryError> {
        let mut tables = self.lock();
        if tables.products.remove(&id).is_none() {
            return Ok(false);
        }
        tables.cart_items.retain(|item| item.product_id != id);
        tables.wish_list.retain(|entry| entry.product_id != id);
        Ok(true)
    }
}

#[async_trait]
impl CartStore for MemoryStore {
    async fn upsert_item(
        &self,
        user_id: UserId,
        product_id: ProductId,
        plan: &PlanFn<'_>,
    ) -> Result<CartItemId, UpsertError> {
        let mut tables = self.lock();

        let Some(product) = tables.products.get(&product_id) else {
            return Err(UpsertError::ProductNotFound);
        };
        let snapshot = ProductSnapshot {
            price: product.price,
            stock: product.stock,
        };
        if !tables.users.contains_key(&user_id) {
            return Err(RepositoryError::MissingReference("carts_user_id_fkey".to_owned()).into());
        }

        let cart_id = tables
            .carts
            .iter()
            .find(|cart| cart.user_id == user_id && cart.status == CartStatus::Active)
            .map(|cart| cart.cart_id);
        let existing = cart_id.and_then(|cart_id| {
            tables
                .cart_items
                .iter()
                .find(|item| item.cart_id == cart_id && item.product_id == product_id)
                .map(|item| ExistingLine {
                    cart_item_id: item.cart_item_id,
                    quantity: item.quantity,
                    price_at_time: item.price_at_time,
                    subtotal: item.subtotal,
                })
        });

        // Decide before writing anything, so a refusal leaves no new cart behind.
        let decision = plan(snapshot, existing).map_err(UpsertError::Rejected)?;

        let now = Utc::now();
        let cart_id = match cart_id {
            Some(cart_id) => cart_id,
            None => {
                let cart_id = CartId::new(tables.next_id());
                tables.carts.push(Cart {
                    cart_id,
                    user_id,
                    status: CartStatus::Active,
                    created_at: now,
                    updated_at: now,
                });
                cart_id
            }
        };

        let cart_item_id = match decision {
            CartItemPlan::Insert {
                quantity,
                price_at_time,
                discount,
                subtotal,
            } => {
                let cart_item_id = CartItemId::new(tables.next_id());
                tables.cart_items.push(CartItem {
                    cart_item_id,
                    cart_id,
                    product_id,
                    quantity,
                    price_at_time,
                    discount,
                    subtotal,
                    added_at: now,
                });
                cart_item_id
            }
            CartItemPlan::Update {
                cart_item_id,
                quantity,
                discount,
                subtotal,
            } => {
                if let Some(item) = tables
                    .cart_items
                    .iter_mut()
                    .find(|item| item.cart_item_id == cart_item_id)
                {
                    item.quantity = quantity;
                    item.discount = discount;
                    item.subtotal = subtotal;
                }
                cart_item_id
            }
        };

        if let Some(cart) = tables.carts.iter_mut().find(|cart| cart.cart_id == cart_id) {
            cart.updated_at = now;
        }
        Ok(cart_item_id)
    }

    async fn active_cart(&self, user_id: UserId) -> Result<Option<Cart>, RepositoryError> {
        Ok(self
            .lock()
            .carts
            .iter()
            .find(|cart| cart.user_id == user_id && cart.status == CartStatus::Active)
            .cloned())
    }

    async fn delete_item(
        &self,
        cart_id: CartId,
        product_id: ProductId,
    ) -> Result<u64, RepositoryError> {
        let mut tables = self.lock();
        let before = tables.cart_items.len();
        tables
            .cart_items
            .retain(|item| !(item.cart_id == cart_id && item.product_id == product_id));
        Ok((before - tables.cart_items.len()) as u64)
    }

    async fn items(&self, cart_id: CartId) -> Result<Vec<CartItem>, RepositoryError> {
        Ok(self
            .lock()
            .cart_items
            .iter()
            .filter(|item| item.cart_id == cart_id)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl WishlistStore for MemoryStore {
    async fn insert(
        &self,
        user_id: UserId,
        product_id: ProductId,
    ) -> Result<Option<WishListEntryId>, RepositoryError> {
        let mut tables = self.lock();
        if !tables.users.contains_key(&user_id) {
            return Err(RepositoryError::MissingReference(
                "wish_list_user_id_fkey".to_owned(),
            ));
        }
        if !tables.products.contains_key(&product_id) {
            return Err(RepositoryError::MissingReference(
                "wish_list_product_id_fkey".to_owned(),
            ));
        }
        if tables
            .wish_list
            .iter()
            .any(|entry| entry.user_id == user_id && entry.product_id == product_id)
        {
            return Ok(None);
        }
        let wish_list_id = WishListEntryId::new(tables.next_id());
        tables.wish_list.push(WishListEntry {
            wish_list_id,
            user_id,
            product_id,
            added_at: Utc::now(),
        });
        Ok(Some(wish_list_id))
    }

    async fn find(
        &self,
        user_id: UserId,
        product_id: ProductId,
    ) -> Result<Option<WishListEntryId>, RepositoryError> {
        Ok(self
            .lock()
            .wish_list
            .iter()
            .find(|entry| entry.user_id == user_id && entry.product_id == product_id)
            .map(|entry| entry.wish_list_id))
    }

    async fn delete(&self, user_id: UserId, product_id: ProductId) -> Result<u64, RepositoryError> {
        let mut tables = self.lock();
        let before = tables.wish_list.len();
        tables
            .wish_list
            .retain(|entry| !(entry.user_id == user_id && entry.product_id == product_id));
        Ok((before - tables.wish_list.len()) as u64)
    }

    async fn with_products(
        &self,
        user_id: UserId,
    ) -> Result<Vec<(WishListEntry, Product)>, RepositoryError> {
        let tables = self.lock();
        Ok(tables
            .wish_list
            .iter()
            .filter(|entry| entry.user_id == user_id)
            .filter_map(|entry| {
                tables
                    .products
                    .get(&entry.product_id)
                    .map(|product| (entry.clone(), product.clone()))
            })
            .collect())
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn create(&self, user: &NewUser) -> Result<User, RepositoryError> {
        let mut tables = self.lock();
        if tables.users.values().any(|existing| existing.email == user.email) {
            return Err(RepositoryError::Conflict("users_email_key".to_owned()));
        }
        let now = Utc::now();
        let user_id = UserId::new(tables.next_id());
        let stored = User {
            user_id,
            name: user.name.clone(),
            email: user.email.clone(),
            phone: user.phone.clone(),
            role: user.role,
            address: user.address.clone(),
            created_at: now,
            updated_at: now,
        };
        tables.users.insert(user_id, stored.clone());
        Ok(stored)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use catalog_core::{CategoryId, Email, UserRole};

    use super::*;

    fn new_product(name: &str, stock: i32) -> NewProduct {
        NewProduct {
            name: name.to_owned(),
            price: 10,
            stock,
            category_id: CategoryId::new(1),
            quantity: 1,
            brand: "Acme".to_owned(),
            images: vec![],
        }
    }

    fn new_user(email: &str) -> NewUser {
        NewUser {
            name: "Test".to_owned(),
            email: Email::parse(email).unwrap(),
            password_hash: "hash".to_owned(),
            phone: None,
            role: UserRole::User,
            address: None,
        }
    }

    #[tokio::test]
    async fn test_product_delete_cascades_to_wishlist() {
        let store = MemoryStore::new();
        let user = UserStore::create(&store, &new_user("a@example.com")).await.unwrap();
        let product = ProductStore::create(&store, &new_product("Lamp", 3)).await.unwrap();
        WishlistStore::insert(&store, user.user_id, product.product_id)
            .await
            .unwrap();

        assert!(ProductStore::delete(&store, product.product_id).await.unwrap());
        let rows = store.with_products(user.user_id).await.unwrap();
        assert!(rows.is_empty());
    }

    #[tokio::test]
    async fn test_refused_plan_creates_no_cart() {
        let store = MemoryStore::new();
        let user = UserStore::create(&store, &new_user("b@example.com")).await.unwrap();
        let product = ProductStore::create(&store, &new_product("Lamp", 1)).await.unwrap();

        let result = store
            .upsert_item(
                user.user_id,
                product.product_id,
                &|_: ProductSnapshot, _: Option<ExistingLine>| {
                    Err(crate::models::StockShortfall {
                        requested: 5,
                        available: 1,
                    })
                },
            )
            .await;

        assert!(matches!(result, Err(UpsertError::Rejected(_))));
        assert!(store.active_cart(user.user_id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_email_conflicts() {
        let store = MemoryStore::new();
        UserStore::create(&store, &new_user("c@example.com")).await.unwrap();
        let err = UserStore::create(&store, &new_user("C@Example.com"))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            RepositoryError::Conflict(ref constraint) if constraint == "users_email_key"
        ));
    }

    #[tokio::test]
    async fn test_product_reads_are_counted() {
        let store = MemoryStore::new();
        let product = ProductStore::create(&store, &new_product("Lamp", 1)).await.unwrap();
        assert_eq!(store.product_queries(), 0);
        ProductStore::get(&store, product.product_id).await.unwrap();
        ProductStore::list(&store).await.unwrap();
        assert_eq!(store.product_queries(), 2);
    }
}
