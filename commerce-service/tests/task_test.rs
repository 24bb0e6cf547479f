//! Task board integration tests for commerce-service.

mod common;

use common::{with_identity, TestApp, TestUser};
use reqwest::Client;

async fn create_task(
    app: &TestApp,
    client: &Client,
    user: &TestUser,
    body: serde_json::Value,
) -> serde_json::Value {
    let response = with_identity(client.post(&format!("{}/tasks", app.address)), user)
        .json(&body)
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(response.status().as_u16(), 201);
    response.json().await.expect("Failed to parse JSON")
}

#[tokio::test]
async fn create_task_defaults_to_pending() {
    let Some(app) = TestApp::try_spawn().await else {
        return;
    };
    let client = Client::new();
    let user = app.user("alice");

    let task = create_task(
        &app,
        &client,
        &user,
        serde_json::json!({"title": "Restock shelves", "due_date": "2026-09-01"}),
    )
    .await;

    assert_eq!(task["title"], "Restock shelves");
    assert_eq!(task["status"], "pending");
    assert_eq!(task["due_date"], "2026-09-01");
    assert_eq!(task["created_by_username"], "alice");

    app.cleanup().await;
}

#[tokio::test]
async fn create_task_rejects_missing_title_and_bad_status() {
    let Some(app) = TestApp::try_spawn().await else {
        return;
    };
    let client = Client::new();
    let user = app.user("bob");

    let response = with_identity(client.post(&format!("{}/tasks", app.address)), &user)
        .json(&serde_json::json!({"title": ""}))
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(response.status().as_u16(), 422);

    let response = with_identity(client.post(&format!("{}/tasks", app.address)), &user)
        .json(&serde_json::json!({"title": "Things", "status": "paused"}))
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(response.status().as_u16(), 400);
    let body: serde_json::Value = response.json().await.expect("Failed to parse JSON");
    assert_eq!(
        body["error"],
        "Invalid status. Valid values are: pending, in_progress, completed"
    );

    app.cleanup().await;
}

#[tokio::test]
async fn tasks_are_private_to_their_creator() {
    let Some(app) = TestApp::try_spawn().await else {
        return;
    };
    let client = Client::new();
    let alice = app.user("alice");
    let bob = app.user("bob");
    let admin = app.admin("ops");

    let task = create_task(
        &app,
        &client,
        &alice,
        serde_json::json!({"title": "Private errand"}),
    )
    .await;
    let task_id = task["id"].as_str().unwrap();
    let url = format!("{}/tasks/{}", app.address, task_id);

    // Another user cannot see, edit, or delete it; the id acts unknown
    let response = with_identity(client.get(&url), &bob)
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(response.status().as_u16(), 404);

    let response = with_identity(client.put(&url), &bob)
        .json(&serde_json::json!({"title": "Hijacked"}))
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(response.status().as_u16(), 404);

    let response = with_identity(client.delete(&url), &bob)
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(response.status().as_u16(), 404);

    // Even admins only work their own board
    let response = with_identity(client.get(&url), &admin)
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(response.status().as_u16(), 404);

    // Bob's listing stays empty
    let response = with_identity(client.get(&format!("{}/tasks", app.address)), &bob)
        .send()
        .await
        .expect("Failed to execute request");
    let tasks: serde_json::Value = response.json().await.expect("Failed to parse JSON");
    assert_eq!(tasks.as_array().unwrap().len(), 0);

    app.cleanup().await;
}

#[tokio::test]
async fn update_task_is_partial() {
    let Some(app) = TestApp::try_spawn().await else {
        return;
    };
    let client = Client::new();
    let user = app.user("carol");

    let task = create_task(
        &app,
        &client,
        &user,
        serde_json::json!({"title": "Write report", "description": "Q3 numbers"}),
    )
    .await;
    let task_id = task["id"].as_str().unwrap();

    let response = with_identity(
        client.put(&format!("{}/tasks/{}", app.address, task_id)),
        &user,
    )
    .json(&serde_json::json!({"status": "in_progress"}))
    .send()
    .await
    .expect("Failed to execute request");

    assert_eq!(response.status().as_u16(), 200);
    let body: serde_json::Value = response.json().await.expect("Failed to parse JSON");
    assert_eq!(body["status"], "in_progress");
    assert_eq!(body["title"], "Write report");
    assert_eq!(body["description"], "Q3 numbers");

    app.cleanup().await;
}

#[tokio::test]
async fn delete_task_works() {
    let Some(app) = TestApp::try_spawn().await else {
        return;
    };
    let client = Client::new();
    let user = app.user("dave");

    let task = create_task(&app, &client, &user, serde_json::json!({"title": "Done soon"})).await;
    let task_id = task["id"].as_str().unwrap();
    let url = format!("{}/tasks/{}", app.address, task_id);

    let response = with_identity(client.delete(&url), &user)
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(response.status().as_u16(), 204);

    let response = with_identity(client.get(&url), &user)
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(response.status().as_u16(), 404);

    app.cleanup().await;
}
