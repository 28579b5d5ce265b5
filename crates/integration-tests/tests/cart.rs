//! Cart endpoints: stock-checked adds, accumulation, removal.

use axum::http::{Method, StatusCode};
use serde_json::json;

use catalog_integration_tests::{TestApp, send};

#[tokio::test]
async fn test_second_add_beyond_stock_is_refused() {
    let app = TestApp::new();
    let user = app.create_user("shopper@example.com").await;
    let product = app.create_product("Trail Shoe", "Stride", 40, 7).await;
    let uri = format!("/cart/{user}/{product}");

    let first = app.post(&uri, json!({ "quantity": 5 })).await;
    assert_eq!(first.status, StatusCode::OK);
    assert_eq!(first.body["message"], "Item added to cart successfully");

    let second = app.post(&uri, json!({ "quantity": 3 })).await;
    assert_eq!(second.status, StatusCode::CONFLICT);
    assert_eq!(
        second.body["error"],
        "cannot add 3 items, only 2 available in stock"
    );

    let cart = app.get(&format!("/cart/{user}")).await;
    assert_eq!(cart.body["items"][0]["quantity"], 5);
    assert_eq!(cart.body["items"][0]["subtotal"], 200);
}

#[tokio::test]
async fn test_repeat_adds_accumulate_on_one_line() {
    let app = TestApp::new();
    let user = app.create_user("shopper@example.com").await;
    let product = app.create_product("Trail Shoe", "Stride", 100, 10).await;
    let uri = format!("/cart/{user}/{product}");

    let first = app.post(&uri, json!({ "quantity": 2 })).await;
    let second = app
        .post(&uri, json!({ "quantity": 3, "discount": 50 }))
        .await;
    assert_eq!(first.body["cart_item_id"], second.body["cart_item_id"]);

    let cart = app.get(&format!("/cart/{user}")).await;
    assert_eq!(cart.status, StatusCode::OK);
    assert_eq!(cart.body["cart"]["status"], "active");

    let items = cart.body["items"].as_array().unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["quantity"], 5);
    assert_eq!(items[0]["price_at_time"], 100);
    assert_eq!(items[0]["discount"], 50);
    assert_eq!(items[0]["subtotal"], 200 + 250);
}

#[tokio::test]
async fn test_concurrent_adds_never_oversell() {
    let app = TestApp::new();
    let user = app.create_user("shopper@example.com").await;
    let product = app.create_product("Last Pairs", "Stride", 80, 5).await;
    let uri = format!("/cart/{user}/{product}");

    let handles: Vec<_> = (0..12)
        .map(|_| {
            let router = app.router();
            let uri = uri.clone();
            tokio::spawn(async move {
                send(router, Method::POST, &uri, Some(json!({ "quantity": 1 }))).await
            })
        })
        .collect();

    let mut accepted = 0;
    let mut refused = 0;
    for handle in handles {
        match handle.await.unwrap().status {
            StatusCode::OK => accepted += 1,
            StatusCode::CONFLICT => refused += 1,
            other => panic!("unexpected status {other}"),
        }
    }
    assert_eq!(accepted, 5);
    assert_eq!(refused, 7);

    let cart = app.get(&format!("/cart/{user}")).await;
    assert_eq!(cart.body["items"].as_array().unwrap().len(), 1);
    assert_eq!(cart.body["items"][0]["quantity"], 5);
}

#[tokio::test]
async fn test_add_validates_quantity_and_references() {
    let app = TestApp::new();
    let user = app.create_user("shopper@example.com").await;
    let product = app.create_product("Trail Shoe", "Stride", 40, 7).await;

    let zero = app
        .post(&format!("/cart/{user}/{product}"), json!({ "quantity": 0 }))
        .await;
    assert_eq!(zero.status, StatusCode::BAD_REQUEST);

    let missing_product = app
        .post(&format!("/cart/{user}/9999"), json!({ "quantity": 1 }))
        .await;
    assert_eq!(missing_product.status, StatusCode::NOT_FOUND);
    assert_eq!(missing_product.body["error"], "product not found");

    let missing_user = app
        .post(&format!("/cart/9999/{product}"), json!({ "quantity": 1 }))
        .await;
    assert_eq!(missing_user.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_remove_from_cart() {
    let app = TestApp::new();
    let user = app.create_user("shopper@example.com").await;
    let product = app.create_product("Trail Shoe", "Stride", 40, 7).await;
    let uri = format!("/cart/{user}/{product}");

    let no_cart = app.delete(&uri).await;
    assert_eq!(no_cart.status, StatusCode::NOT_FOUND);
    assert_eq!(no_cart.body["error"], "no cart found for the user");

    app.post(&uri, json!({ "quantity": 2 })).await;
    let removed = app.delete(&uri).await;
    assert_eq!(removed.status, StatusCode::OK);
    assert_eq!(removed.body["result"], "success");

    // Removing a line that is already gone still succeeds.
    assert_eq!(app.delete(&uri).await.status, StatusCode::OK);

    let cart = app.get(&format!("/cart/{user}")).await;
    assert_eq!(cart.body["items"], json!([]));
}

#[tokio::test]
async fn test_deleting_product_removes_its_cart_lines() {
    let app = TestApp::new();
    let user = app.create_user("shopper@example.com").await;
    let product = app.create_product("Trail Shoe", "Stride", 40, 7).await;
    app.post(&format!("/cart/{user}/{product}"), json!({ "quantity": 1 }))
        .await;

    app.delete(&format!("/admin/products/{product}")).await;

    let cart = app.get(&format!("/cart/{user}")).await;
    assert_eq!(cart.body["items"], json!([]));
}
