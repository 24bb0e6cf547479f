//! Post CRUD integration tests for blog-service.

mod common;

use common::{with_identity, TestApp, TestUser};
use reqwest::Client;
use uuid::Uuid;

/// Create a post and return the response body.
async fn seed_post(
    app: &TestApp,
    client: &Client,
    author: &TestUser,
    title: &str,
    body: serde_json::Value,
) -> serde_json::Value {
    let mut payload = serde_json::json!({
        "title": title,
        "content": format!("Body of {}", title),
    });
    for (key, value) in body.as_object().cloned().unwrap_or_default() {
        payload[key] = value;
    }

    let response = with_identity(client.post(&format!("{}/posts", app.address)), author)
        .json(&payload)
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(response.status().as_u16(), 201, "post seed should succeed");

    response.json().await.expect("Failed to parse JSON")
}

/// Create a category and return its id and slug.
async fn seed_category(app: &TestApp, client: &Client, name: &str) -> (Uuid, String) {
    let caller = app.user("category-seeder");
    let response = with_identity(client.post(&format!("{}/categories", app.address)), &caller)
        .json(&serde_json::json!({ "name": name }))
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(response.status().as_u16(), 201);

    let body: serde_json::Value = response.json().await.expect("Failed to parse JSON");
    (
        Uuid::parse_str(body["id"].as_str().unwrap()).unwrap(),
        body["slug"].as_str().unwrap().to_string(),
    )
}

#[tokio::test]
async fn create_post_defaults_to_draft() {
    let Some(app) = TestApp::try_spawn().await else {
        return;
    };
    let client = Client::new();
    let author = app.user("alice");

    let body = seed_post(&app, &client, &author, "Hello World", serde_json::json!({})).await;

    assert_eq!(body["slug"], "hello-world");
    assert_eq!(body["status"], "draft");
    assert_eq!(body["author"]["username"], "alice");
    assert_eq!(body["views"], 0);
    assert_eq!(body["comments_count"], 0);
    assert_eq!(body["likes_count"], 0);
    assert!(body["tags"].as_array().unwrap().is_empty());
    assert!(body["category"].is_null());
    // the comment tree only rides along on detail reads
    assert!(body.get("comments").is_none());

    app.cleanup().await;
}

#[tokio::test]
async fn slug_collisions_get_a_numeric_suffix() {
    let Some(app) = TestApp::try_spawn().await else {
        return;
    };
    let client = Client::new();
    let author = app.user("alice");

    let first = seed_post(&app, &client, &author, "My First Post", serde_json::json!({})).await;
    let second = seed_post(&app, &client, &author, "My First Post", serde_json::json!({})).await;
    let third = seed_post(&app, &client, &author, "My First Post", serde_json::json!({})).await;

    assert_eq!(first["slug"], "my-first-post");
    assert_eq!(second["slug"], "my-first-post-2");
    assert_eq!(third["slug"], "my-first-post-3");

    app.cleanup().await;
}

#[tokio::test]
async fn create_post_attaches_parsed_tags() {
    let Some(app) = TestApp::try_spawn().await else {
        return;
    };
    let client = Client::new();
    let author = app.user("alice");

    let body = seed_post(
        &app,
        &client,
        &author,
        "Tagged Post",
        serde_json::json!({ "tags": "Rust, Web Dev , ,Async" }),
    )
    .await;

    let tags = body["tags"].as_array().unwrap();
    let names: Vec<&str> = tags.iter().map(|t| t["name"].as_str().unwrap()).collect();
    assert_eq!(names, vec!["Async", "Rust", "Web Dev"]);

    let web_dev = tags.iter().find(|t| t["name"] == "Web Dev").unwrap();
    assert_eq!(web_dev["slug"], "web-dev");
    assert_eq!(web_dev["post_count"], 1);

    app.cleanup().await;
}

#[tokio::test]
async fn create_post_rejects_bad_input() {
    let Some(app) = TestApp::try_spawn().await else {
        return;
    };
    let client = Client::new();
    let author = app.user("alice");

    // empty title fails validation
    let response = with_identity(client.post(&format!("{}/posts", app.address)), &author)
        .json(&serde_json::json!({ "title": "", "content": "body" }))
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(response.status().as_u16(), 422);

    // unknown status names the valid set
    let response = with_identity(client.post(&format!("{}/posts", app.address)), &author)
        .json(&serde_json::json!({
            "title": "Post",
            "content": "body",
            "status": "archived",
        }))
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(response.status().as_u16(), 400);
    let body: serde_json::Value = response.json().await.expect("Failed to parse JSON");
    assert_eq!(body["error"], "Invalid status. Valid values are: draft, published");

    // unknown category is rejected up front
    let response = with_identity(client.post(&format!("{}/posts", app.address)), &author)
        .json(&serde_json::json!({
            "title": "Post",
            "content": "body",
            "category_id": Uuid::new_v4(),
        }))
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(response.status().as_u16(), 400);
    let body: serde_json::Value = response.json().await.expect("Failed to parse JSON");
    assert_eq!(body["error"], "Category not found");

    app.cleanup().await;
}

#[tokio::test]
async fn published_listing_hides_drafts() {
    let Some(app) = TestApp::try_spawn().await else {
        return;
    };
    let client = Client::new();
    let author = app.user("alice");

    seed_post(
        &app,
        &client,
        &author,
        "Draft Notes",
        serde_json::json!({ "status": "draft" }),
    )
    .await;
    seed_post(
        &app,
        &client,
        &author,
        "Published Piece",
        serde_json::json!({ "status": "published" }),
    )
    .await;

    let response = with_identity(client.get(&format!("{}/posts", app.address)), &author)
        .send()
        .await
        .expect("Failed to execute request");
    assert!(response.status().is_success());
    let posts: serde_json::Value = response.json().await.expect("Failed to parse JSON");
    let posts = posts.as_array().unwrap();
    assert_eq!(posts.len(), 1);
    assert_eq!(posts[0]["slug"], "published-piece");

    // the draft is still reachable by slug
    let response = with_identity(
        client.get(&format!("{}/posts/draft-notes", app.address)),
        &author,
    )
    .send()
    .await
    .expect("Failed to execute request");
    assert!(response.status().is_success());

    app.cleanup().await;
}

#[tokio::test]
async fn listing_is_newest_first_with_paging() {
    let Some(app) = TestApp::try_spawn().await else {
        return;
    };
    let client = Client::new();
    let author = app.user("alice");

    for n in 1..=3 {
        seed_post(
            &app,
            &client,
            &author,
            &format!("Post {}", n),
            serde_json::json!({ "status": "published" }),
        )
        .await;
    }

    let response = with_identity(client.get(&format!("{}/posts", app.address)), &author)
        .send()
        .await
        .expect("Failed to execute request");
    let posts: serde_json::Value = response.json().await.expect("Failed to parse JSON");
    let titles: Vec<&str> = posts
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["title"].as_str().unwrap())
        .collect();
    assert_eq!(titles, vec!["Post 3", "Post 2", "Post 1"]);

    let response = with_identity(
        client.get(&format!("{}/posts?limit=2&offset=2", app.address)),
        &author,
    )
    .send()
    .await
    .expect("Failed to execute request");
    let posts: serde_json::Value = response.json().await.expect("Failed to parse JSON");
    let posts = posts.as_array().unwrap();
    assert_eq!(posts.len(), 1);
    assert_eq!(posts[0]["title"], "Post 1");

    app.cleanup().await;
}

#[tokio::test]
async fn listing_matches_query_across_fields() {
    let Some(app) = TestApp::try_spawn().await else {
        return;
    };
    let client = Client::new();

    let alice = app.user("alice");
    seed_post(
        &app,
        &client,
        &alice,
        "Needle in the title",
        serde_json::json!({ "status": "published" }),
    )
    .await;
    seed_post(
        &app,
        &client,
        &alice,
        "Body match",
        serde_json::json!({ "status": "published", "content": "a needle hides here" }),
    )
    .await;
    seed_post(
        &app,
        &client,
        &alice,
        "Excerpt match",
        serde_json::json!({ "status": "published", "excerpt": "needle teaser" }),
    )
    .await;
    let fan = app.user("needle-fan");
    seed_post(
        &app,
        &client,
        &fan,
        "Author match",
        serde_json::json!({ "status": "published" }),
    )
    .await;
    seed_post(
        &app,
        &client,
        &alice,
        "Unrelated",
        serde_json::json!({ "status": "published" }),
    )
    .await;

    let response = with_identity(
        client.get(&format!("{}/posts?q=NEEDLE", app.address)),
        &alice,
    )
    .send()
    .await
    .expect("Failed to execute request");
    let posts: serde_json::Value = response.json().await.expect("Failed to parse JSON");
    let posts = posts.as_array().unwrap();
    assert_eq!(posts.len(), 4);
    assert!(posts.iter().all(|p| p["title"] != "Unrelated"));

    app.cleanup().await;
}

#[tokio::test]
async fn listing_filters_by_category_and_tag_slug() {
    let Some(app) = TestApp::try_spawn().await else {
        return;
    };
    let client = Client::new();
    let author = app.user("alice");

    let (category_id, category_slug) = seed_category(&app, &client, "Tech Talk").await;
    assert_eq!(category_slug, "tech-talk");

    seed_post(
        &app,
        &client,
        &author,
        "Categorized",
        serde_json::json!({ "status": "published", "category_id": category_id }),
    )
    .await;
    seed_post(
        &app,
        &client,
        &author,
        "Tagged",
        serde_json::json!({ "status": "published", "tags": "Web Dev" }),
    )
    .await;

    let response = with_identity(
        client.get(&format!("{}/posts?category=tech-talk", app.address)),
        &author,
    )
    .send()
    .await
    .expect("Failed to execute request");
    let posts: serde_json::Value = response.json().await.expect("Failed to parse JSON");
    let posts = posts.as_array().unwrap();
    assert_eq!(posts.len(), 1);
    assert_eq!(posts[0]["title"], "Categorized");
    assert_eq!(posts[0]["category"]["name"], "Tech Talk");
    assert_eq!(posts[0]["category"]["post_count"], 1);

    let response = with_identity(
        client.get(&format!("{}/posts?tag=web-dev", app.address)),
        &author,
    )
    .send()
    .await
    .expect("Failed to execute request");
    let posts: serde_json::Value = response.json().await.expect("Failed to parse JSON");
    let posts = posts.as_array().unwrap();
    assert_eq!(posts.len(), 1);
    assert_eq!(posts[0]["title"], "Tagged");

    app.cleanup().await;
}

#[tokio::test]
async fn detail_reads_count_views() {
    let Some(app) = TestApp::try_spawn().await else {
        return;
    };
    let client = Client::new();
    let author = app.user("alice");

    seed_post(
        &app,
        &client,
        &author,
        "Counted",
        serde_json::json!({ "status": "published" }),
    )
    .await;

    for expected in 1..=2 {
        let response = with_identity(
            client.get(&format!("{}/posts/counted", app.address)),
            &author,
        )
        .send()
        .await
        .expect("Failed to execute request");
        assert!(response.status().is_success());
        let body: serde_json::Value = response.json().await.expect("Failed to parse JSON");
        assert_eq!(body["views"], expected);
        assert!(body["comments"].as_array().unwrap().is_empty());
    }

    let response = with_identity(
        client.get(&format!("{}/posts/never-written", app.address)),
        &author,
    )
    .send()
    .await
    .expect("Failed to execute request");
    assert_eq!(response.status().as_u16(), 404);
    let body: serde_json::Value = response.json().await.expect("Failed to parse JSON");
    assert_eq!(body["error"], "Post not found");

    app.cleanup().await;
}

#[tokio::test]
async fn update_post_is_partial_and_retags() {
    let Some(app) = TestApp::try_spawn().await else {
        return;
    };
    let client = Client::new();
    let author = app.user("alice");

    seed_post(
        &app,
        &client,
        &author,
        "Evolving Post",
        serde_json::json!({ "tags": "Rust, Web" }),
    )
    .await;

    // title-only update keeps everything else, including the slug
    let response = with_identity(
        client.put(&format!("{}/posts/evolving-post", app.address)),
        &author,
    )
    .json(&serde_json::json!({ "title": "Evolved Post" }))
    .send()
    .await
    .expect("Failed to execute request");
    assert!(response.status().is_success());
    let body: serde_json::Value = response.json().await.expect("Failed to parse JSON");
    assert_eq!(body["title"], "Evolved Post");
    assert_eq!(body["slug"], "evolving-post");
    assert_eq!(body["content"], "Body of Evolving Post");
    let names: Vec<&str> = body["tags"]
        .as_array()
        .unwrap()
        .iter()
        .map(|t| t["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["Rust", "Web"]);

    // a tags string replaces the whole set
    let response = with_identity(
        client.put(&format!("{}/posts/evolving-post", app.address)),
        &author,
    )
    .json(&serde_json::json!({ "tags": "Databases", "status": "published" }))
    .send()
    .await
    .expect("Failed to execute request");
    assert!(response.status().is_success());
    let body: serde_json::Value = response.json().await.expect("Failed to parse JSON");
    assert_eq!(body["status"], "published");
    let names: Vec<&str> = body["tags"]
        .as_array()
        .unwrap()
        .iter()
        .map(|t| t["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["Databases"]);

    app.cleanup().await;
}

#[tokio::test]
async fn editing_is_reserved_for_the_author_and_admins() {
    let Some(app) = TestApp::try_spawn().await else {
        return;
    };
    let client = Client::new();
    let author = app.user("alice");
    let stranger = app.user("bob");
    let admin = app.admin("root");

    seed_post(&app, &client, &author, "Guarded", serde_json::json!({})).await;

    let response = with_identity(
        client.put(&format!("{}/posts/guarded", app.address)),
        &stranger,
    )
    .json(&serde_json::json!({ "title": "Hijacked" }))
    .send()
    .await
    .expect("Failed to execute request");
    assert_eq!(response.status().as_u16(), 403);
    let body: serde_json::Value = response.json().await.expect("Failed to parse JSON");
    assert_eq!(body["error"], "You do not have permission to edit this post");

    let response = with_identity(
        client.put(&format!("{}/posts/guarded", app.address)),
        &admin,
    )
    .json(&serde_json::json!({ "title": "Moderated" }))
    .send()
    .await
    .expect("Failed to execute request");
    assert!(response.status().is_success());
    let body: serde_json::Value = response.json().await.expect("Failed to parse JSON");
    assert_eq!(body["title"], "Moderated");

    app.cleanup().await;
}

#[tokio::test]
async fn deleting_is_reserved_and_cascades() {
    let Some(app) = TestApp::try_spawn().await else {
        return;
    };
    let client = Client::new();
    let author = app.user("alice");
    let stranger = app.user("bob");

    seed_post(
        &app,
        &client,
        &author,
        "Doomed Post",
        serde_json::json!({ "status": "published", "tags": "Fleeting" }),
    )
    .await;

    let response = with_identity(
        client.post(&format!("{}/posts/doomed-post/comments", app.address)),
        &stranger,
    )
    .json(&serde_json::json!({ "content": "so long" }))
    .send()
    .await
    .expect("Failed to execute request");
    assert_eq!(response.status().as_u16(), 201);

    let response = with_identity(
        client.delete(&format!("{}/posts/doomed-post", app.address)),
        &stranger,
    )
    .send()
    .await
    .expect("Failed to execute request");
    assert_eq!(response.status().as_u16(), 403);
    let body: serde_json::Value = response.json().await.expect("Failed to parse JSON");
    assert_eq!(body["error"], "You do not have permission to delete this post");

    let response = with_identity(
        client.delete(&format!("{}/posts/doomed-post", app.address)),
        &author,
    )
    .send()
    .await
    .expect("Failed to execute request");
    assert_eq!(response.status().as_u16(), 204);

    let response = with_identity(
        client.get(&format!("{}/posts/doomed-post", app.address)),
        &author,
    )
    .send()
    .await
    .expect("Failed to execute request");
    assert_eq!(response.status().as_u16(), 404);

    // comments went with the post
    let remaining =
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM comments")
            .fetch_one(app.db.pool())
            .await
            .expect("Failed to count comments");
    assert_eq!(remaining, 0);

    app.cleanup().await;
}
