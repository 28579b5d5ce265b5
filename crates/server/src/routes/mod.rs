//! HTTP route handlers for the catalog service.
//!
//! # Route Structure
//!
//! ```text
//! GET    /health                           - Liveness
//! GET    /health/ready                     - Readiness (database ping)
//!
//! # Products
//! GET    /products                         - All products
//! GET    /products/default                 - Random sample
//! GET    /products/filtered?name=&brand=.. - Filtered listing
//! GET    /products/search?q=               - Name/brand search
//! GET    /products/{id}                    - Product detail
//!
//! # Admin
//! POST   /admin/products                   - Create product
//! PUT    /admin/products/{id}              - Replace product
//! DELETE /admin/products/{id}              - Delete product
//!
//! # Users
//! POST   /users                            - Create user
//!
//! # Cart
//! GET    /cart/{user_id}                   - Active cart with lines
//! POST   /cart/{user_id}/{product_id}      - Add to cart
//! DELETE /cart/{user_id}/{product_id}      - Remove from cart
//!
//! # Wishlist
//! GET    /wishlist/{user_id}               - Entries with products
//! POST   /wishlist/{user_id}/{product_id}  - Add to wishlist
//! DELETE /wishlist/{user_id}/{product_id}  - Remove from wishlist
//! ```

pub mod admin;
pub mod cart;
pub mod extract;
pub mod health;
pub mod products;
pub mod users;
pub mod wishlist;

use axum::{
    Router,
    routing::{get, post, put},
};
use serde::Serialize;
use tower_http::trace::{DefaultOnResponse, OnResponse, TraceLayer};
use tracing::Span;

use crate::middleware::request_id_middleware;
use crate::state::AppState;

/// Body for writes that return nothing else.
#[derive(Debug, Serialize)]
pub struct Ack {
    pub message: &'static str,
    pub result: &'static str,
}

impl Ack {
    #[must_use]
    pub const fn success(message: &'static str) -> Self {
        Self {
            message,
            result: "success",
        }
    }
}

/// Create the health check routes router.
pub fn health_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(health::health))
        .route("/ready", get(health::readiness))
}

/// Create the product routes router.
pub fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(products::index))
        .route("/default", get(products::default_sample))
        .route("/filtered", get(products::filtered))
        .route("/search", get(products::search))
        .route("/{id}", get(products::show))
}

/// Create the admin routes router.
pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/products", post(admin::create_product))
        .route(
            "/products/{id}",
            put(admin::update_product).delete(admin::delete_product),
        )
}

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/{user_id}", get(cart::show))
        .route("/{user_id}/{product_id}", post(cart::add).delete(cart::remove))
}

/// Create the wishlist routes router.
pub fn wishlist_routes() -> Router<AppState> {
    Router::new()
        .route("/{user_id}", get(wishlist::show))
        .route(
            "/{user_id}/{product_id}",
            post(wishlist::add).delete(wishlist::remove),
        )
}

/// Create all routes for the catalog service.
pub fn routes() -> Router<AppState> {
    Router::new()
        .nest("/health", health_routes())
        .nest("/products", product_routes())
        .nest("/admin", admin_routes())
        .route("/users", post(users::create))
        .nest("/cart", cart_routes())
        .nest("/wishlist", wishlist_routes())
}

/// Build the full application: routes, request IDs, and request tracing.
///
/// Sentry layers are added by the binary on top of this.
pub fn app(state: AppState) -> Router {
    routes()
        .layer(axum::middleware::from_fn(request_id_middleware))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|request: &axum::http::Request<_>| {
                    tracing::info_span!(
                        "http_request",
                        method = %request.method(),
                        uri = %request.uri(),
                        request_id = tracing::field::Empty,
                        status = tracing::field::Empty,
                        latency_ms = tracing::field::Empty,
                    )
                })
                .on_response(
                    |response: &axum::http::Response<_>,
                     latency: std::time::Duration,
                     span: &Span| {
                        span.record("status", response.status().as_u16());
                        span.record(
                            "latency_ms",
                            u64::try_from(latency.as_millis()).unwrap_or(u64::MAX),
                        );
                        DefaultOnResponse::default().on_response(response, latency, span);
                    },
                ),
        )
        .with_state(state)
}
