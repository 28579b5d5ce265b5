//! Integration test helpers for the catalog service.
//!
//! Most tests drive the full router in process: [`TestApp`] wires the real
//! handlers, services, and product cache over the in-memory store, and sends
//! requests with `tower::ServiceExt::oneshot`. No database or network is
//! needed.
//!
//! Tests marked `#[ignore]` need external services:
//! - `postgres.rs` needs `CATALOG_TEST_DATABASE_URL` pointing at a scratch
//!   database (migrations are applied by the test)
//! - `live_server.rs` needs a running server at `CATALOG_BASE_URL`
//!
//! Run them with `cargo test -p catalog-integration-tests -- --ignored`.

#![allow(clippy::unwrap_used, clippy::missing_panics_doc)]

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::body::Body;
use axum::http::{Method, Request, StatusCode, header};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tower::ServiceExt;

use catalog_server::cache::local::MokaCache;
use catalog_server::db::Stores;
use catalog_server::db::memory::MemoryStore;
use catalog_server::routes;
use catalog_server::state::AppState;

/// Lifetime of cached entries in tests; long enough never to expire mid-test.
const TEST_CACHE_TTL: Duration = Duration::from_secs(3600);

/// Response status and parsed JSON body.
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub body: Value,
}

/// The full application over an in-memory store.
pub struct TestApp {
    router: Router,
    store: Arc<MemoryStore>,
}

impl Default for TestApp {
    fn default() -> Self {
        Self::new()
    }
}

impl TestApp {
    #[must_use]
    pub fn new() -> Self {
        let store = Arc::new(MemoryStore::new());
        let state = AppState::with_stores(
            &Stores::memory(&store),
            Arc::new(MokaCache::new(1_000)),
            TEST_CACHE_TTL,
        );
        Self {
            router: routes::app(state),
            store,
        }
    }

    /// The backing store, for inspecting query counts or adjusting stock.
    #[must_use]
    pub fn store(&self) -> &MemoryStore {
        &self.store
    }

    /// A clone of the router, for driving concurrent requests.
    #[must_use]
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    pub async fn get(&self, uri: &str) -> TestResponse {
        self.send(Method::GET, uri, None).await
    }

    pub async fn post(&self, uri: &str, body: Value) -> TestResponse {
        self.send(Method::POST, uri, Some(body)).await
    }

    pub async fn post_empty(&self, uri: &str) -> TestResponse {
        self.send(Method::POST, uri, None).await
    }

    pub async fn put(&self, uri: &str, body: Value) -> TestResponse {
        self.send(Method::PUT, uri, Some(body)).await
    }

    pub async fn delete(&self, uri: &str) -> TestResponse {
        self.send(Method::DELETE, uri, None).await
    }

    pub async fn send(&self, method: Method, uri: &str, body: Option<Value>) -> TestResponse {
        send(self.router(), method, uri, body).await
    }

    // =========================================================================
    // Fixtures
    // =========================================================================

    /// Create a product through the admin API and return its id.
    pub async fn create_product(&self, name: &str, brand: &str, price: i64, stock: i32) -> i64 {
        let response = self
            .post(
                "/admin/products",
                json!({
                    "name": name,
                    "price": price,
                    "stock": stock,
                    "category_id": 1,
                    "quantity": 1,
                    "brand": brand,
                    "images": [format!("{}.jpg", name.to_lowercase().replace(' ', "-"))],
                }),
            )
            .await;
        assert_eq!(response.status, StatusCode::CREATED, "{:?}", response.body);
        response.body["product_id"].as_i64().unwrap()
    }

    /// Create a user through the API and return its id.
    pub async fn create_user(&self, email: &str) -> i64 {
        let response = self
            .post(
                "/users",
                json!({
                    "name": "Test Shopper",
                    "email": email,
                    "password": "correct horse battery",
                }),
            )
            .await;
        assert_eq!(response.status, StatusCode::CREATED, "{:?}", response.body);
        response.body["user_id"].as_i64().unwrap()
    }
}

/// Send one request through `router` and parse the JSON response body.
///
/// An empty body parses as `Value::Null`; a non-JSON body is returned as a
/// JSON string.
pub async fn send(router: Router, method: Method, uri: &str, body: Option<Value>) -> TestResponse {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string())),
        None => builder.body(Body::empty()),
    }
    .unwrap();

    let response = router.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();

    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes)
            .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
    };

    TestResponse { status, body }
}
