//! Product catalog service library.
//!
//! Inventory reads behind a read-through cache, stock-aware carts, and
//! wishlists, served over HTTP by the `catalog-server` binary. The library
//! split lets the CLI and the integration tests reuse the same stores,
//! services, and router.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod cache;
pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;
