//! Domain models for the catalog.
//!
//! These are the shapes passed between routes, services, and stores. Row
//! types derive `sqlx::FromRow` directly since the column names match.

pub mod cart;
pub mod product;
pub mod user;
pub mod wishlist;

pub use cart::{
    Cart, CartContents, CartItem, CartItemPlan, ExistingLine, ProductSnapshot, StockShortfall,
};
pub use product::{LISTING_LIMIT, NewProduct, Product, ProductFilter};
pub use user::{NewUser, User};
pub use wishlist::{WishList, WishListEntry};
