//! Test helper module for commerce-service integration tests.
//!
//! Provides common setup utilities for PostgreSQL-based tests.

#![allow(dead_code)]

use commerce_service::config::CommerceConfig;
use commerce_service::services::database::Database;
use commerce_service::startup::Application;
use platform_core::config::{DatabaseConfig, ServerConfig};
use std::sync::atomic::{AtomicU32, Ordering};
use uuid::Uuid;

// Counter for unique schema names
static SCHEMA_COUNTER: AtomicU32 = AtomicU32::new(0);

/// Generate a unique schema name for test isolation.
fn unique_schema_name() -> String {
    let counter = SCHEMA_COUNTER.fetch_add(1, Ordering::SeqCst);
    format!("test_commerce_{}_{}", std::process::id(), counter)
}

/// A caller identity to stamp onto requests, the way the gateway would.
pub struct TestUser {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub role: &'static str,
}

impl TestUser {
    fn new(username: &str, role: &'static str) -> Self {
        TestUser {
            id: Uuid::new_v4(),
            username: username.to_string(),
            email: format!("{}@example.com", username),
            role,
        }
    }
}

/// Attach gateway identity headers to a request.
pub fn with_identity(
    req: reqwest::RequestBuilder,
    user: &TestUser,
) -> reqwest::RequestBuilder {
    req.header("x-user-id", user.id.to_string())
        .header("x-username", &user.username)
        .header("x-user-email", &user.email)
        .header("x-user-role", user.role)
}

/// Test application wrapper for integration tests.
pub struct TestApp {
    pub address: String,
    pub port: u16,
    pub db: Database,
    schema_name: String,
    base_url: String,
}

impl TestApp {
    /// Spawn a new test application on a random port.
    ///
    /// Returns `None` when `TEST_DATABASE_URL` is not set, so suites can
    /// skip cleanly on machines without a PostgreSQL instance.
    pub async fn try_spawn() -> Option<Self> {
        let base_url = match std::env::var("TEST_DATABASE_URL") {
            Ok(url) => url,
            Err(_) => {
                eprintln!("TEST_DATABASE_URL not set; skipping integration test");
                return None;
            }
        };

        let schema_name = unique_schema_name();

        // Create schema for test isolation
        let pool = sqlx::postgres::PgPoolOptions::new()
            .max_connections(2)
            .connect(&base_url)
            .await
            .expect("Failed to connect to test database");

        sqlx::query(&format!("DROP SCHEMA IF EXISTS {} CASCADE", schema_name))
            .execute(&pool)
            .await
            .ok();
        sqlx::query(&format!("CREATE SCHEMA {}", schema_name))
            .execute(&pool)
            .await
            .expect("Failed to create test schema");

        // Close the setup pool
        pool.close().await;

        // Point the service at the fresh schema via search_path
        let separator = if base_url.contains('?') { "&" } else { "?" };
        let db_url_with_schema = format!(
            "{}{}options=-c search_path%3D{}",
            base_url, separator, schema_name
        );

        let config = CommerceConfig {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 0, // Random port
            },
            database: DatabaseConfig {
                url: db_url_with_schema.clone(),
                max_connections: 5,
                min_connections: 1,
            },
            service_name: "commerce-service-test".to_string(),
            log_level: "warn".to_string(),
            otlp_endpoint: None,
            allowed_origins: vec!["*".to_string()],
        };

        let app = Application::build(config)
            .await
            .expect("Failed to build test application");

        let port = app.port();
        let db = Database::new(&db_url_with_schema, 5, 1)
            .await
            .expect("Failed to create test database handle");

        let address = format!("http://127.0.0.1:{}", port);

        tokio::spawn(async move {
            app.run_until_stopped().await.ok();
        });

        // Wait for the server to be ready by polling the health endpoint
        let client = reqwest::Client::new();
        let health_url = format!("http://127.0.0.1:{}/health", port);
        for _ in 0..50 {
            if client.get(&health_url).send().await.is_ok() {
                break;
            }
            tokio::time::sleep(tokio::time::Duration::from_millis(50)).await;
        }

        Some(TestApp {
            address,
            port,
            db,
            schema_name,
            base_url,
        })
    }

    /// A regular caller.
    pub fn user(&self, username: &str) -> TestUser {
        TestUser::new(username, "user")
    }

    /// An admin caller.
    pub fn admin(&self, username: &str) -> TestUser {
        TestUser::new(username, "admin")
    }

    /// Cleanup test resources (schema).
    pub async fn cleanup(&self) {
        let pool = sqlx::postgres::PgPoolOptions::new()
            .max_connections(1)
            .connect(&self.base_url)
            .await
            .ok();

        if let Some(pool) = pool {
            let _ = sqlx::query(&format!(
                "DROP SCHEMA IF EXISTS {} CASCADE",
                self.schema_name
            ))
            .execute(&pool)
            .await;
            pool.close().await;
        }
    }
}
