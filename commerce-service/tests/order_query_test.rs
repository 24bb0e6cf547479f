//! Order listing and details integration tests for commerce-service.

mod common;

use common::{with_identity, TestApp, TestUser};
use reqwest::Client;
use uuid::Uuid;

async fn seed_product(app: &TestApp, client: &Client, name: &str, price: &str, stock: i32) -> Uuid {
    let admin = app.admin("catalog-admin");
    let response = with_identity(client.post(&format!("{}/products", app.address)), &admin)
        .json(&serde_json::json!({"name": name, "price": price, "stock": stock}))
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(response.status().as_u16(), 201);
    let body: serde_json::Value = response.json().await.expect("Failed to parse JSON");
    Uuid::parse_str(body["id"].as_str().unwrap()).unwrap()
}

async fn place_order(
    app: &TestApp,
    client: &Client,
    buyer: &TestUser,
    product_id: Uuid,
) -> serde_json::Value {
    let response = with_identity(client.post(&format!("{}/orders/create", app.address)), buyer)
        .json(&serde_json::json!({"items": [{"product_id": product_id, "quantity": 1}]}))
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(response.status().as_u16(), 201);
    response.json().await.expect("Failed to parse JSON")
}

#[tokio::test]
async fn callers_see_only_their_own_orders() {
    let Some(app) = TestApp::try_spawn().await else {
        return;
    };
    let client = Client::new();
    let alice = app.user("alice");
    let bob = app.user("bob");

    let widget = seed_product(&app, &client, "Widget", "19.99", 10).await;
    place_order(&app, &client, &alice, widget).await;
    place_order(&app, &client, &alice, widget).await;
    place_order(&app, &client, &bob, widget).await;

    let response = with_identity(client.get(&format!("{}/orders", app.address)), &alice)
        .send()
        .await
        .expect("Failed to execute request");
    assert!(response.status().is_success());
    let orders: serde_json::Value = response.json().await.expect("Failed to parse JSON");
    let orders = orders.as_array().unwrap();
    assert_eq!(orders.len(), 2);
    for order in orders {
        assert_eq!(order["user_username"], "alice");
        assert!(order["items"].is_array());
    }

    app.cleanup().await;
}

#[tokio::test]
async fn admins_see_every_order() {
    let Some(app) = TestApp::try_spawn().await else {
        return;
    };
    let client = Client::new();
    let alice = app.user("alice");
    let bob = app.user("bob");
    let admin = app.admin("ops");

    let widget = seed_product(&app, &client, "Widget", "19.99", 10).await;
    place_order(&app, &client, &alice, widget).await;
    place_order(&app, &client, &bob, widget).await;

    let response = with_identity(client.get(&format!("{}/orders", app.address)), &admin)
        .send()
        .await
        .expect("Failed to execute request");
    assert!(response.status().is_success());
    let orders: serde_json::Value = response.json().await.expect("Failed to parse JSON");
    assert_eq!(orders.as_array().unwrap().len(), 2);

    app.cleanup().await;
}

#[tokio::test]
async fn order_listing_honors_paging() {
    let Some(app) = TestApp::try_spawn().await else {
        return;
    };
    let client = Client::new();
    let buyer = app.user("carol");

    let widget = seed_product(&app, &client, "Widget", "1.00", 50).await;
    for _ in 0..3 {
        place_order(&app, &client, &buyer, widget).await;
    }

    let response = with_identity(
        client.get(&format!("{}/orders?limit=2&offset=0", app.address)),
        &buyer,
    )
    .send()
    .await
    .expect("Failed to execute request");
    let page: serde_json::Value = response.json().await.expect("Failed to parse JSON");
    assert_eq!(page.as_array().unwrap().len(), 2);

    let response = with_identity(
        client.get(&format!("{}/orders?limit=2&offset=2", app.address)),
        &buyer,
    )
    .send()
    .await
    .expect("Failed to execute request");
    let page: serde_json::Value = response.json().await.expect("Failed to parse JSON");
    assert_eq!(page.as_array().unwrap().len(), 1);

    // Out-of-range limits are clamped instead of erroring
    let response = with_identity(
        client.get(&format!("{}/orders?limit=5000", app.address)),
        &buyer,
    )
    .send()
    .await
    .expect("Failed to execute request");
    assert!(response.status().is_success());

    app.cleanup().await;
}

#[tokio::test]
async fn order_details_include_items() {
    let Some(app) = TestApp::try_spawn().await else {
        return;
    };
    let client = Client::new();
    let buyer = app.user("dave");

    let widget = seed_product(&app, &client, "Widget", "19.99", 10).await;
    let order = place_order(&app, &client, &buyer, widget).await;
    let order_id = order["id"].as_str().unwrap();

    let response = with_identity(
        client.get(&format!("{}/orders/{}/details", app.address, order_id)),
        &buyer,
    )
    .send()
    .await
    .expect("Failed to execute request");

    assert_eq!(response.status().as_u16(), 200);
    let body: serde_json::Value = response.json().await.expect("Failed to parse JSON");
    assert_eq!(body["id"].as_str().unwrap(), order_id);
    assert_eq!(body["items"][0]["product_name"], "Widget");
    assert_eq!(body["items"][0]["total"], "19.99");

    app.cleanup().await;
}

#[tokio::test]
async fn order_details_hide_other_callers_orders() {
    let Some(app) = TestApp::try_spawn().await else {
        return;
    };
    let client = Client::new();
    let buyer = app.user("erin");
    let stranger = app.user("mallory");
    let admin = app.admin("ops");

    let widget = seed_product(&app, &client, "Widget", "19.99", 10).await;
    let order = place_order(&app, &client, &buyer, widget).await;
    let order_id = order["id"].as_str().unwrap();

    let url = format!("{}/orders/{}/details", app.address, order_id);

    let response = with_identity(client.get(&url), &stranger)
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(response.status().as_u16(), 404);
    let body: serde_json::Value = response.json().await.expect("Failed to parse JSON");
    assert_eq!(body["error"], "Order not found");

    // Admins can read anyone's order
    let response = with_identity(client.get(&url), &admin)
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(response.status().as_u16(), 200);

    app.cleanup().await;
}
