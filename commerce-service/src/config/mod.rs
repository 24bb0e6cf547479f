use anyhow::Result;
use dotenvy::dotenv;
use platform_core::config::{DatabaseConfig, ServerConfig};
use platform_core::error::AppError;
use serde::Deserialize;
use std::env;

#[derive(Deserialize, Clone, Debug)]
pub struct CommerceConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub service_name: String,
    pub log_level: String,
    pub otlp_endpoint: Option<String>,
    pub allowed_origins: Vec<String>,
}

impl CommerceConfig {
    pub fn from_env() -> Result<Self, AppError> {
        dotenv().ok();

        let host = env::var("COMMERCE_SERVICE_HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
        let port = env::var("COMMERCE_SERVICE_PORT")
            .unwrap_or_else(|_| "8081".to_string())
            .parse()
            .map_err(|e| AppError::ConfigError(anyhow::anyhow!("Invalid COMMERCE_SERVICE_PORT: {}", e)))?;

        let db_url = env::var("COMMERCE_DATABASE_URL").map_err(|_| {
            AppError::ConfigError(anyhow::anyhow!("COMMERCE_DATABASE_URL must be set"))
        })?;
        let max_connections = env::var("COMMERCE_DB_MAX_CONNECTIONS")
            .unwrap_or_else(|_| "10".to_string())
            .parse()
            .unwrap_or(10);
        let min_connections = env::var("COMMERCE_DB_MIN_CONNECTIONS")
            .unwrap_or_else(|_| "1".to_string())
            .parse()
            .unwrap_or(1);

        let log_level = env::var("COMMERCE_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());
        let otlp_endpoint = env::var("COMMERCE_OTLP_ENDPOINT").ok();

        let allowed_origins = env::var("COMMERCE_ALLOWED_ORIGINS")
            .unwrap_or_else(|_| "*".to_string())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        Ok(Self {
            server: ServerConfig { host, port },
            database: DatabaseConfig {
                url: db_url,
                max_connections,
                min_connections,
            },
            service_name: "commerce-service".to_string(),
            log_level,
            otlp_endpoint,
            allowed_origins,
        })
    }
}
