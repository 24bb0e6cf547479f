//! Post model and lifecycle status.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Publication status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PostStatus {
    Draft,
    Published,
}

impl PostStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PostStatus::Draft => "draft",
            PostStatus::Published => "published",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "draft" => Some(PostStatus::Draft),
            "published" => Some(PostStatus::Published),
            _ => None,
        }
    }

    pub fn valid_values() -> &'static str {
        "draft, published"
    }
}

/// A post row together with the joined category fields and the comment and
/// like counts every read surface needs.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Post {
    pub post_id: Uuid,
    pub title: String,
    pub slug: String,
    pub content: String,
    pub excerpt: String,
    pub featured_image_url: Option<String>,
    pub author_id: Uuid,
    pub author_username: String,
    pub category_id: Option<Uuid>,
    pub status: String,
    pub views: i64,
    pub created_utc: DateTime<Utc>,
    pub updated_utc: DateTime<Utc>,
    pub category_name: Option<String>,
    pub category_slug: Option<String>,
    pub category_description: Option<String>,
    pub category_created_utc: Option<DateTime<Utc>>,
    pub category_post_count: Option<i64>,
    pub comments_count: i64,
    pub likes_count: i64,
}

/// Input for creating a post. Tags arrive already parsed from the
/// comma-separated request field.
#[derive(Debug, Clone)]
pub struct CreatePost {
    pub author_id: Uuid,
    pub author_username: String,
    pub title: String,
    pub content: String,
    pub excerpt: String,
    pub featured_image_url: Option<String>,
    pub category_id: Option<Uuid>,
    pub status: PostStatus,
    pub tags: Vec<String>,
}

/// Input for a partial post update. `tags` of `Some` replaces the whole
/// tag set; `None` leaves the existing attachments alone.
#[derive(Debug, Clone, Default)]
pub struct UpdatePost {
    pub title: Option<String>,
    pub content: Option<String>,
    pub excerpt: Option<String>,
    pub featured_image_url: Option<String>,
    pub category_id: Option<Uuid>,
    pub status: Option<PostStatus>,
    pub tags: Option<Vec<String>>,
}

/// Filters for the published-post listing.
#[derive(Debug, Clone, Default)]
pub struct ListPostsFilter {
    pub query: Option<String>,
    pub category_slug: Option<String>,
    pub tag_slug: Option<String>,
    pub limit: i64,
    pub offset: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_round_trips_through_parse() {
        for status in [PostStatus::Draft, PostStatus::Published] {
            assert_eq!(PostStatus::parse(status.as_str()), Some(status));
        }
    }

    #[test]
    fn unknown_status_is_rejected() {
        assert_eq!(PostStatus::parse("archived"), None);
        assert_eq!(PostStatus::parse("Published"), None);
    }
}
