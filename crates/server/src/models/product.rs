//! Product domain types.

use std::collections::BTreeMap;
use std::fmt::Write as _;

use serde::{Deserialize, Serialize};

use catalog_core::{CategoryId, ProductId};

use crate::services::FieldError;

/// Maximum number of rows returned by the sampled, filtered, and search reads.
pub const LISTING_LIMIT: i64 = 50;

/// A catalog product.
///
/// This is also the cache payload: the JSON produced by `serde_json` for a
/// `Product` (or a `Vec<Product>`) is what the cache stores.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Product {
    pub product_id: ProductId,
    pub name: String,
    /// Price in whole currency units.
    pub price: i64,
    /// Units available.
    pub stock: i32,
    pub category_id: CategoryId,
    /// Pack size (units per sale), independent of `stock`.
    pub quantity: i32,
    pub brand: String,
    /// Image references in display order.
    pub images: Vec<String>,
}

/// Fields for creating or replacing a product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewProduct {
    pub name: String,
    pub price: i64,
    pub stock: i32,
    pub category_id: CategoryId,
    pub quantity: i32,
    pub brand: String,
    #[serde(default)]
    pub images: Vec<String>,
}

impl NewProduct {
    /// Check field-level invariants before anything reaches the store.
    ///
    /// # Errors
    ///
    /// Returns every failing field, not just the first.
    pub fn validate(&self) -> Result<(), Vec<FieldError>> {
        let mut errors = Vec::new();
        if self.name.trim().is_empty() {
            errors.push(FieldError::required("name"));
        }
        if self.brand.trim().is_empty() {
            errors.push(FieldError::required("brand"));
        }
        if self.price < 0 {
            errors.push(FieldError::invalid("price", "must not be negative"));
        }
        if self.stock < 0 {
            errors.push(FieldError::invalid("stock", "must not be negative"));
        }
        if self.quantity < 1 {
            errors.push(FieldError::invalid("quantity", "must be at least 1"));
        }
        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

/// Predicate for the filtered product listing.
///
/// Each field narrows the result set; an empty filter matches everything.
/// Only the first value of a repeated query parameter is used.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProductFilter {
    /// Case-insensitive substring of the product name.
    pub name: Option<String>,
    /// Exact brand.
    pub brand: Option<String>,
    pub category_id: Option<CategoryId>,
    /// Inclusive lower price bound.
    pub min_price: Option<i64>,
    /// Inclusive upper price bound.
    pub max_price: Option<i64>,
    /// Strict lower bound on stock.
    pub stock_gt: Option<i32>,
}

impl ProductFilter {
    /// Recognized query parameter names, in cache-key order.
    pub const FIELDS: [&'static str; 6] = [
        "brand",
        "category_id",
        "max_price",
        "min_price",
        "name",
        "stock_gt",
    ];

    /// Build a filter from query parameters (field name to one or more values).
    ///
    /// Unknown fields are ignored.
    ///
    /// # Errors
    ///
    /// Returns a `FieldError` for each numeric field that fails to parse.
    pub fn from_params(params: &BTreeMap<String, Vec<String>>) -> Result<Self, Vec<FieldError>> {
        let first = |field: &str| {
            params
                .get(field)
                .and_then(|values| values.first())
                .map(|value| value.trim().to_owned())
                .filter(|value| !value.is_empty())
        };

        let mut errors = Vec::new();
        let mut numeric = |field: &'static str| -> Option<i64> {
            let raw = first(field)?;
            match raw.parse::<i64>() {
                Ok(value) => Some(value),
                Err(_) => {
                    errors.push(FieldError::invalid(field, "must be an integer"));
                    None
                }
            }
        };

        let category_id = numeric("category_id");
        let min_price = numeric("min_price");
        let max_price = numeric("max_price");
        let stock_gt = numeric("stock_gt");

        let narrow = |field: &'static str, value: Option<i64>, errors: &mut Vec<FieldError>| {
            value.and_then(|v| {
                i32::try_from(v)
                    .map_err(|_| errors.push(FieldError::invalid(field, "is out of range")))
                    .ok()
            })
        };
        let category_id = narrow("category_id", category_id, &mut errors).map(CategoryId::new);
        let stock_gt = narrow("stock_gt", stock_gt, &mut errors);

        if !errors.is_empty() {
            return Err(errors);
        }

        Ok(Self {
            name: first("name"),
            brand: first("brand"),
            category_id,
            min_price,
            max_price,
            stock_gt,
        })
    }

    /// Deterministic `field=value;` signature over the set fields, sorted by
    /// field name. Used as the suffix of the filtered-listing cache key.
    #[must_use]
    pub fn signature(&self) -> String {
        let mut signature = String::new();
        for field in Self::FIELDS {
            let value = match field {
                "brand" => self.brand.clone(),
                "category_id" => self.category_id.map(|id| id.to_string()),
                "max_price" => self.max_price.map(|v| v.to_string()),
                "min_price" => self.min_price.map(|v| v.to_string()),
                "name" => self.name.clone(),
                "stock_gt" => self.stock_gt.map(|v| v.to_string()),
                _ => None,
            };
            if let Some(value) = value {
                let _ = write!(signature, "{field}={value};");
            }
        }
        signature
    }

    /// Whether a product satisfies every set predicate.
    ///
    /// Mirrors the SQL built by the Postgres repository; used by the
    /// in-memory store.
    #[must_use]
    pub fn matches(&self, product: &Product) -> bool {
        let name_ok = self.name.as_ref().is_none_or(|needle| {
            product
                .name
                .to_lowercase()
                .contains(&needle.to_lowercase())
        });
        let brand_ok = self.brand.as_ref().is_none_or(|brand| product.brand == *brand);
        let category_ok = self
            .category_id
            .is_none_or(|category| product.category_id == category);
        let min_ok = self.min_price.is_none_or(|min| product.price >= min);
        let max_ok = self.max_price.is_none_or(|max| product.price <= max);
        let stock_ok = self.stock_gt.is_none_or(|floor| product.stock > floor);

        name_ok && brand_ok && category_ok && min_ok && max_ok && stock_ok
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn params(pairs: &[(&str, &str)]) -> BTreeMap<String, Vec<String>> {
        let mut map: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for (key, value) in pairs {
            map.entry((*key).to_owned())
                .or_default()
                .push((*value).to_owned());
        }
        map
    }

    fn sample_product() -> Product {
        Product {
            product_id: ProductId::new(1),
            name: "Trail Running Shoe".to_owned(),
            price: 120,
            stock: 8,
            category_id: CategoryId::new(3),
            quantity: 1,
            brand: "Stride".to_owned(),
            images: vec![],
        }
    }

    #[test]
    fn test_from_params_uses_first_value() {
        let filter =
            ProductFilter::from_params(&params(&[("brand", "Stride"), ("brand", "Other")]))
                .unwrap();
        assert_eq!(filter.brand.as_deref(), Some("Stride"));
    }

    #[test]
    fn test_from_params_rejects_non_numeric_bounds() {
        let errors =
            ProductFilter::from_params(&params(&[("min_price", "cheap"), ("stock_gt", "x")]))
                .unwrap_err();
        let fields: Vec<_> = errors.iter().map(|e| e.field.as_str()).collect();
        assert_eq!(fields, vec!["min_price", "stock_gt"]);
    }

    #[test]
    fn test_from_params_ignores_unknown_and_blank_fields() {
        let filter =
            ProductFilter::from_params(&params(&[("color", "red"), ("name", "  ")])).unwrap();
        assert_eq!(filter, ProductFilter::default());
    }

    #[test]
    fn test_signature_is_independent_of_parameter_order() {
        let a = ProductFilter::from_params(&params(&[("name", "shoe"), ("max_price", "200")]))
            .unwrap();
        let b = ProductFilter::from_params(&params(&[("max_price", "200"), ("name", "shoe")]))
            .unwrap();
        assert_eq!(a.signature(), b.signature());
        assert_eq!(a.signature(), "max_price=200;name=shoe;");
    }

    #[test]
    fn test_matches_applies_every_predicate() {
        let product = sample_product();
        let filter = ProductFilter {
            name: Some("running".to_owned()),
            brand: Some("Stride".to_owned()),
            category_id: Some(CategoryId::new(3)),
            min_price: Some(120),
            max_price: Some(120),
            stock_gt: Some(7),
        };
        assert!(filter.matches(&product));

        let too_little_stock = ProductFilter {
            stock_gt: Some(8),
            ..ProductFilter::default()
        };
        assert!(!too_little_stock.matches(&product));
    }

    #[test]
    fn test_new_product_validation_collects_all_errors() {
        let product = NewProduct {
            name: String::new(),
            price: -1,
            stock: -5,
            category_id: CategoryId::new(1),
            quantity: 0,
            brand: "Acme".to_owned(),
            images: vec![],
        };
        let errors = product.validate().unwrap_err();
        assert_eq!(errors.len(), 4);
    }
}
