//! Product repository for database operations.

use async_trait::async_trait;
use sqlx::{PgPool, Postgres, QueryBuilder};

use catalog_core::ProductId;

use super::{ProductStore, RepositoryError};
use crate::models::{NewProduct, Product, ProductFilter};

const PRODUCT_COLUMNS: &str =
    "product_id, name, price, stock, category_id, quantity, brand, images";

/// Repository for product database operations.
#[derive(Clone)]
pub struct ProductRepository {
    pool: PgPool,
}

impl ProductRepository {
    /// Create a new product repository.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ProductStore for ProductRepository {
    async fn create(&self, product: &NewProduct) -> Result<Product, RepositoryError> {
        let sql = format!(
            "INSERT INTO products (name, price, stock, category_id, quantity, brand, images)
             VALUES ($1, $2, $3, $4, $5, $6, $7)
             RETURNING {PRODUCT_COLUMNS}"
        );
        sqlx::query_as::<_, Product>(&sql)
            .bind(&product.name)
            .bind(product.price)
            .bind(product.stock)
            .bind(product.category_id)
            .bind(product.quantity)
            .bind(&product.brand)
            .bind(&product.images)
            .fetch_one(&self.pool)
            .await
            .map_err(RepositoryError::classify)
    }

    async fn get(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        let sql = format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE product_id = $1");
        let product = sqlx::query_as::<_, Product>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(product)
    }

    async fn list(&self) -> Result<Vec<Product>, RepositoryError> {
        let sql = format!("SELECT {PRODUCT_COLUMNS} FROM products ORDER BY product_id");
        let products = sqlx::query_as::<_, Product>(&sql)
            .fetch_all(&self.pool)
            .await?;
        Ok(products)
    }

    async fn sample(&self, limit: i64) -> Result<Vec<Product>, RepositoryError> {
        let sql = format!("SELECT {PRODUCT_COLUMNS} FROM products ORDER BY RANDOM() LIMIT $1");
        let products = sqlx::query_as::<_, Product>(&sql)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;
        Ok(products)
    }

    async fn filter(
        &self,
        filter: &ProductFilter,
        limit: i64,
    ) -> Result<Vec<Product>, RepositoryError> {
        let mut query: QueryBuilder<'_, Postgres> =
            QueryBuilder::new(format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE TRUE"));

        if let Some(name) = &filter.name {
            query.push(" AND name ILIKE ").push_bind(format!("%{name}%"));
        }
        if let Some(brand) = &filter.brand {
            query.push(" AND brand = ").push_bind(brand.clone());
        }
        if let Some(category_id) = filter.category_id {
            query.push(" AND category_id = ").push_bind(category_id);
        }
        if let Some(min_price) = filter.min_price {
            query.push(" AND price >= ").push_bind(min_price);
        }
        if let Some(max_price) = filter.max_price {
            query.push(" AND price <= ").push_bind(max_price);
        }
        if let Some(stock_gt) = filter.stock_gt {
            query.push(" AND stock > ").push_bind(stock_gt);
        }
        query.push(" ORDER BY product_id DESC LIMIT ").push_bind(limit);

        let products = query
            .build_query_as::<Product>()
            .fetch_all(&self.pool)
            .await?;
        Ok(products)
    }

    async fn search(&self, query: &str, limit: i64) -> Result<Vec<Product>, RepositoryError> {
        let sql = format!(
            "SELECT {PRODUCT_COLUMNS} FROM products
             WHERE name ILIKE $1 OR brand ILIKE $1
             ORDER BY product_id DESC
             LIMIT $2"
        );
        let products = sqlx::query_as::<_, Product>(&sql)
            .bind(format!("%{query}%"))
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;
        Ok(products)
    }

    async fn update(
        &self,
        id: ProductId,
        product: &NewProduct,
    ) -> Result<Option<Product>, RepositoryError> {
        let sql = format!(
            "UPDATE products
             SET name = $1, price = $2, stock = $3, category_id = $4,
                 quantity = $5, brand = $6, images = $7
             WHERE product_id = $8
             RETURNING {PRODUCT_COLUMNS}"
        );
        sqlx::query_as::<_, Product>(&sql)
            .bind(&product.name)
            .bind(product.price)
            .bind(product.stock)
            .bind(product.category_id)
            .bind(product.quantity)
            .bind(&product.brand)
            .bind(&product.images)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(RepositoryError::classify)
    }

    async fn delete(&self, id: ProductId) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM products WHERE product_id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
