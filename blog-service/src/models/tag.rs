//! Tag model.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// A tag row with the number of posts attached to it.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Tag {
    pub tag_id: Uuid,
    pub name: String,
    pub slug: String,
    pub post_count: i64,
}
