//! Product catalog integration tests for commerce-service.

mod common;

use common::{with_identity, TestApp};
use reqwest::Client;

async fn seed_category(app: &TestApp, client: &Client, name: &str) -> String {
    let admin = app.admin("catalog-admin");
    let response = with_identity(client.post(&format!("{}/categories", app.address)), &admin)
        .json(&serde_json::json!({"name": name}))
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(response.status().as_u16(), 201);
    let body: serde_json::Value = response.json().await.expect("Failed to parse JSON");
    body["id"].as_str().unwrap().to_string()
}

async fn seed_product(app: &TestApp, client: &Client, body: serde_json::Value) -> serde_json::Value {
    let admin = app.admin("catalog-admin");
    let response = with_identity(client.post(&format!("{}/products", app.address)), &admin)
        .json(&body)
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(response.status().as_u16(), 201);
    response.json().await.expect("Failed to parse JSON")
}

#[tokio::test]
async fn create_product_requires_admin() {
    let Some(app) = TestApp::try_spawn().await else {
        return;
    };
    let client = Client::new();
    let shopper = app.user("alice");

    let response = with_identity(client.post(&format!("{}/products", app.address)), &shopper)
        .json(&serde_json::json!({"name": "Widget", "price": "19.99"}))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status().as_u16(), 403);
    let body: serde_json::Value = response.json().await.expect("Failed to parse JSON");
    assert_eq!(body["error"], "Admin privileges required");

    app.cleanup().await;
}

#[tokio::test]
async fn create_product_carries_category_name() {
    let Some(app) = TestApp::try_spawn().await else {
        return;
    };
    let client = Client::new();

    let category_id = seed_category(&app, &client, "Hardware").await;
    let product = seed_product(
        &app,
        &client,
        serde_json::json!({
            "name": "Widget",
            "description": "A fine widget",
            "category_id": category_id,
            "price": "19.99",
            "stock": 3,
        }),
    )
    .await;

    assert_eq!(product["name"], "Widget");
    assert_eq!(product["category"].as_str().unwrap(), category_id);
    assert_eq!(product["category_name"], "Hardware");
    assert_eq!(product["price"], "19.99");
    assert_eq!(product["is_active"], true);

    app.cleanup().await;
}

#[tokio::test]
async fn create_product_rejects_bad_input() {
    let Some(app) = TestApp::try_spawn().await else {
        return;
    };
    let client = Client::new();
    let admin = app.admin("catalog-admin");

    // Empty name fails DTO validation
    let response = with_identity(client.post(&format!("{}/products", app.address)), &admin)
        .json(&serde_json::json!({"name": "", "price": "19.99"}))
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(response.status().as_u16(), 422);

    // Negative price is rejected before it reaches the database
    let response = with_identity(client.post(&format!("{}/products", app.address)), &admin)
        .json(&serde_json::json!({"name": "Widget", "price": "-1.00"}))
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(response.status().as_u16(), 400);
    let body: serde_json::Value = response.json().await.expect("Failed to parse JSON");
    assert_eq!(body["error"], "Price cannot be negative");

    app.cleanup().await;
}

#[tokio::test]
async fn listing_filters_by_category_and_active() {
    let Some(app) = TestApp::try_spawn().await else {
        return;
    };
    let client = Client::new();
    let shopper = app.user("bob");

    let hardware = seed_category(&app, &client, "Hardware").await;
    let toys = seed_category(&app, &client, "Toys").await;

    seed_product(
        &app,
        &client,
        serde_json::json!({"name": "Hammer", "category_id": hardware, "price": "10.00"}),
    )
    .await;
    seed_product(
        &app,
        &client,
        serde_json::json!({"name": "Drill", "category_id": hardware, "price": "50.00", "is_active": false}),
    )
    .await;
    seed_product(
        &app,
        &client,
        serde_json::json!({"name": "Ball", "category_id": toys, "price": "5.00"}),
    )
    .await;

    let response = with_identity(
        client.get(&format!("{}/products?category={}", app.address, hardware)),
        &shopper,
    )
    .send()
    .await
    .expect("Failed to execute request");
    let products: serde_json::Value = response.json().await.expect("Failed to parse JSON");
    assert_eq!(products.as_array().unwrap().len(), 2);

    let response = with_identity(
        client.get(&format!(
            "{}/products?category={}&active=true",
            app.address, hardware
        )),
        &shopper,
    )
    .send()
    .await
    .expect("Failed to execute request");
    let products: serde_json::Value = response.json().await.expect("Failed to parse JSON");
    let products = products.as_array().unwrap();
    assert_eq!(products.len(), 1);
    assert_eq!(products[0]["name"], "Hammer");

    let response = with_identity(client.get(&format!("{}/products", app.address)), &shopper)
        .send()
        .await
        .expect("Failed to execute request");
    let products: serde_json::Value = response.json().await.expect("Failed to parse JSON");
    assert_eq!(products.as_array().unwrap().len(), 3);

    app.cleanup().await;
}

#[tokio::test]
async fn search_matches_name_and_description_case_insensitively() {
    let Some(app) = TestApp::try_spawn().await else {
        return;
    };
    let client = Client::new();
    let shopper = app.user("carol");

    let hardware = seed_category(&app, &client, "Hardware").await;
    seed_product(
        &app,
        &client,
        serde_json::json!({"name": "Claw Hammer", "category_id": hardware, "price": "10.00"}),
    )
    .await;
    seed_product(
        &app,
        &client,
        serde_json::json!({
            "name": "Mallet",
            "description": "Rubber hammer for delicate work",
            "price": "12.00",
        }),
    )
    .await;
    seed_product(
        &app,
        &client,
        serde_json::json!({"name": "Hidden Hammer", "price": "1.00", "is_active": false}),
    )
    .await;

    let response = with_identity(
        client.get(&format!("{}/products/search?q=HAMMER", app.address)),
        &shopper,
    )
    .send()
    .await
    .expect("Failed to execute request");
    let results: serde_json::Value = response.json().await.expect("Failed to parse JSON");
    let results = results.as_array().unwrap();
    // Inactive products never appear in search
    assert_eq!(results.len(), 2);

    let response = with_identity(
        client.get(&format!(
            "{}/products/search?q=hammer&category={}",
            app.address, hardware
        )),
        &shopper,
    )
    .send()
    .await
    .expect("Failed to execute request");
    let results: serde_json::Value = response.json().await.expect("Failed to parse JSON");
    let results = results.as_array().unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0]["name"], "Claw Hammer");

    app.cleanup().await;
}

#[tokio::test]
async fn update_product_is_partial_and_admin_only() {
    let Some(app) = TestApp::try_spawn().await else {
        return;
    };
    let client = Client::new();
    let admin = app.admin("catalog-admin");
    let shopper = app.user("dave");

    let product = seed_product(
        &app,
        &client,
        serde_json::json!({"name": "Widget", "price": "19.99", "stock": 5}),
    )
    .await;
    let product_id = product["id"].as_str().unwrap();
    let url = format!("{}/products/{}", app.address, product_id);

    let response = with_identity(client.put(&url), &shopper)
        .json(&serde_json::json!({"price": "0.01"}))
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(response.status().as_u16(), 403);

    let response = with_identity(client.put(&url), &admin)
        .json(&serde_json::json!({"price": "24.99", "is_active": false}))
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(response.status().as_u16(), 200);
    let body: serde_json::Value = response.json().await.expect("Failed to parse JSON");
    assert_eq!(body["price"], "24.99");
    assert_eq!(body["is_active"], false);
    // Untouched fields survive
    assert_eq!(body["name"], "Widget");
    assert_eq!(body["stock"], 5);

    app.cleanup().await;
}

#[tokio::test]
async fn unknown_product_is_not_found() {
    let Some(app) = TestApp::try_spawn().await else {
        return;
    };
    let client = Client::new();
    let shopper = app.user("erin");
    let admin = app.admin("catalog-admin");
    let missing = uuid::Uuid::new_v4();

    let response = with_identity(
        client.get(&format!("{}/products/{}", app.address, missing)),
        &shopper,
    )
    .send()
    .await
    .expect("Failed to execute request");
    assert_eq!(response.status().as_u16(), 404);
    let body: serde_json::Value = response.json().await.expect("Failed to parse JSON");
    assert_eq!(body["error"], "Product not found");

    let response = with_identity(
        client.put(&format!("{}/products/{}", app.address, missing)),
        &admin,
    )
    .json(&serde_json::json!({"price": "1.00"}))
    .send()
    .await
    .expect("Failed to execute request");
    assert_eq!(response.status().as_u16(), 404);

    app.cleanup().await;
}
