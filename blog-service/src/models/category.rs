//! Blog category model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// A category row with the number of posts attached to it.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Category {
    pub category_id: Uuid,
    pub name: String,
    pub slug: String,
    pub description: String,
    pub created_utc: DateTime<Utc>,
    pub post_count: i64,
}

/// Input for creating a category. The slug is derived from the name.
#[derive(Debug, Clone)]
pub struct CreateCategory {
    pub name: String,
    pub description: String,
}
