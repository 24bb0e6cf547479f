//! Comment model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// A comment row with its like count joined in. `parent_id` of `None`
/// marks a top-level comment.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Comment {
    pub comment_id: Uuid,
    pub post_id: Uuid,
    pub author_id: Uuid,
    pub author_username: String,
    pub content: String,
    pub parent_id: Option<Uuid>,
    pub created_utc: DateTime<Utc>,
    pub like_count: i64,
}

/// Input for creating a comment.
#[derive(Debug, Clone)]
pub struct CreateComment {
    pub post_id: Uuid,
    pub author_id: Uuid,
    pub author_username: String,
    pub content: String,
    pub parent_id: Option<Uuid>,
}
