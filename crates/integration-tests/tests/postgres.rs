//! The application against a real `PostgreSQL` database.
//!
//! These tests require a scratch database reachable through
//! `CATALOG_TEST_DATABASE_URL`. Migrations are applied on connect. Rows are
//! never cleaned up, so every test uses its own user and products.
//!
//! Run with: cargo test -p catalog-integration-tests --test postgres -- --ignored

#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use axum::Router;
use axum::http::{Method, StatusCode};
use secrecy::SecretString;
use serde_json::{Value, json};

use catalog_integration_tests::{TestResponse, send};
use catalog_server::cache::MokaCache;
use catalog_server::db::create_pool;
use catalog_server::routes;
use catalog_server::state::AppState;

async fn app() -> Router {
    let url = std::env::var("CATALOG_TEST_DATABASE_URL")
        .expect("CATALOG_TEST_DATABASE_URL must be set for database tests");
    let pool = create_pool(&SecretString::from(url))
        .await
        .expect("Failed to connect to test database");
    sqlx::migrate!("../server/migrations")
        .run(&pool)
        .await
        .expect("Failed to run migrations");

    let state = AppState::new(pool, Arc::new(MokaCache::new(100)), Duration::from_secs(60));
    routes::app(state)
}

/// Suffix that keeps emails and names distinct across runs.
fn unique() -> u128 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_nanos()
}

async fn call(app: &Router, method: Method, uri: &str, body: Option<Value>) -> TestResponse {
    send(app.clone(), method, uri, body).await
}

async fn create_user(app: &Router) -> i64 {
    let response = call(
        app,
        Method::POST,
        "/users",
        Some(json!({
            "name": "Database Shopper",
            "email": format!("shopper-{}@example.com", unique()),
            "password": "correct horse battery",
        })),
    )
    .await;
    assert_eq!(response.status, StatusCode::CREATED, "{:?}", response.body);
    response.body["user_id"].as_i64().unwrap()
}

async fn create_product(app: &Router, stock: i32) -> i64 {
    let response = call(
        app,
        Method::POST,
        "/admin/products",
        Some(json!({
            "name": format!("Product {}", unique()),
            "price": 40,
            "stock": stock,
            "category_id": 1,
            "quantity": 1,
            "brand": "Integration",
        })),
    )
    .await;
    assert_eq!(response.status, StatusCode::CREATED, "{:?}", response.body);
    response.body["product_id"].as_i64().unwrap()
}

// =============================================================================
// Cart
// =============================================================================

#[tokio::test]
#[ignore = "Requires PostgreSQL at CATALOG_TEST_DATABASE_URL"]
async fn test_stock_check_and_accumulation() {
    let app = app().await;
    let user = create_user(&app).await;
    let product = create_product(&app, 7).await;
    let uri = format!("/cart/{user}/{product}");

    let first = call(&app, Method::POST, &uri, Some(json!({ "quantity": 5 }))).await;
    assert_eq!(first.status, StatusCode::OK);

    let refused = call(&app, Method::POST, &uri, Some(json!({ "quantity": 3 }))).await;
    assert_eq!(refused.status, StatusCode::CONFLICT);

    let accepted = call(&app, Method::POST, &uri, Some(json!({ "quantity": 2 }))).await;
    assert_eq!(accepted.body["cart_item_id"], first.body["cart_item_id"]);

    let cart = call(&app, Method::GET, &format!("/cart/{user}"), None).await;
    assert_eq!(cart.body["items"][0]["quantity"], 7);
    assert_eq!(cart.body["items"][0]["subtotal"], 280);
}

#[tokio::test]
#[ignore = "Requires PostgreSQL at CATALOG_TEST_DATABASE_URL"]
async fn test_concurrent_adds_never_oversell() {
    let app = app().await;
    let user = create_user(&app).await;
    let product = create_product(&app, 4).await;
    let uri = format!("/cart/{user}/{product}");

    let handles: Vec<_> = (0..10)
        .map(|_| {
            let app = app.clone();
            let uri = uri.clone();
            tokio::spawn(async move {
                send(app, Method::POST, &uri, Some(json!({ "quantity": 1 }))).await
            })
        })
        .collect();

    let mut accepted = 0;
    for handle in handles {
        let response = handle.await.unwrap();
        match response.status {
            StatusCode::OK => accepted += 1,
            StatusCode::CONFLICT => {}
            other => panic!("unexpected status {other}: {:?}", response.body),
        }
    }
    assert_eq!(accepted, 4);

    let cart = call(&app, Method::GET, &format!("/cart/{user}"), None).await;
    assert_eq!(cart.body["items"].as_array().unwrap().len(), 1);
    assert_eq!(cart.body["items"][0]["quantity"], 4);
}

// =============================================================================
// Wishlist and users
// =============================================================================

#[tokio::test]
#[ignore = "Requires PostgreSQL at CATALOG_TEST_DATABASE_URL"]
async fn test_wishlist_pair_is_unique() {
    let app = app().await;
    let user = create_user(&app).await;
    let product = create_product(&app, 1).await;
    let uri = format!("/wishlist/{user}/{product}");

    assert_eq!(call(&app, Method::POST, &uri, None).await.status, StatusCode::CREATED);
    assert_eq!(call(&app, Method::POST, &uri, None).await.status, StatusCode::CONFLICT);

    let list = call(&app, Method::GET, &format!("/wishlist/{user}"), None).await;
    assert_eq!(list.body["products"][0]["product_id"], product);
}

#[tokio::test]
#[ignore = "Requires PostgreSQL at CATALOG_TEST_DATABASE_URL"]
async fn test_unknown_user_is_not_found() {
    let app = app().await;
    let product = create_product(&app, 3).await;

    let cart = call(
        &app,
        Method::POST,
        &format!("/cart/{}/{product}", i32::MAX),
        Some(json!({ "quantity": 1 })),
    )
    .await;
    assert_eq!(cart.status, StatusCode::NOT_FOUND);

    let wishlist = call(&app, Method::POST, &format!("/wishlist/{}/{product}", i32::MAX), None).await;
    assert_eq!(wishlist.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
#[ignore = "Requires PostgreSQL at CATALOG_TEST_DATABASE_URL"]
async fn test_readiness_pings_database() {
    let app = app().await;
    let response = call(&app, Method::GET, "/health/ready", None).await;
    assert_eq!(response.status, StatusCode::OK);
}

#[tokio::test]
#[ignore = "Requires PostgreSQL at CATALOG_TEST_DATABASE_URL"]
async fn test_duplicate_email_is_conflict() {
    let app = app().await;
    let body = json!({
        "name": "Twice",
        "email": format!("twice-{}@example.com", unique()),
        "password": "correct horse battery",
    });

    let first = call(&app, Method::POST, "/users", Some(body.clone())).await;
    assert_eq!(first.status, StatusCode::CREATED);

    let second = call(&app, Method::POST, "/users", Some(body)).await;
    assert_eq!(second.status, StatusCode::CONFLICT);
    assert_eq!(second.body["error"], "email already registered");
}
