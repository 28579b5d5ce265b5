//! Catalog Core - Shared types library.
//!
//! This crate provides the domain vocabulary shared by every catalog component:
//! - `server` - HTTP service exposing products, carts, and wishlists
//! - `cli` - Command-line tools for migrations and seed data
//! - `integration-tests` - End-to-end tests against the router
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no database
//! access, no caching. Database encoding is available behind the `postgres`
//! feature.
//!
//! # Modules
//!
//! - [`types`] - Typed IDs, statuses, emails, and money arithmetic

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
