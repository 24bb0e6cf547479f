use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::dtos::comments::CommentResponse;
use crate::dtos::taxonomy::{CategoryResponse, TagResponse};
use crate::models::{Post, Tag};

/// The author identity embedded in posts, comments, and profiles.
#[derive(Debug, Clone, Serialize)]
pub struct AuthorRef {
    pub id: Uuid,
    pub username: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreatePostRequest {
    #[validate(length(min = 1, message = "Title is required"))]
    pub title: String,

    #[validate(length(min = 1, message = "Content is required"))]
    pub content: String,

    #[serde(default)]
    pub excerpt: String,

    pub featured_image_url: Option<String>,
    pub category_id: Option<Uuid>,
    pub status: Option<String>,

    /// Comma-separated tag names.
    pub tags: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
pub struct UpdatePostRequest {
    pub title: Option<String>,
    pub content: Option<String>,
    pub excerpt: Option<String>,
    pub featured_image_url: Option<String>,
    pub category_id: Option<Uuid>,
    pub status: Option<String>,

    /// Comma-separated tag names; when present the whole tag set is
    /// replaced.
    pub tags: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
pub struct ListPostsQuery {
    pub q: Option<String>,
    pub category: Option<String>,
    pub tag: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct PostResponse {
    pub id: Uuid,
    pub title: String,
    pub slug: String,
    pub content: String,
    pub excerpt: String,
    pub featured_image_url: Option<String>,
    pub author: AuthorRef,
    pub category: Option<CategoryResponse>,
    pub tags: Vec<TagResponse>,
    pub status: String,
    pub views: i64,
    pub comments_count: i64,
    pub likes_count: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comments: Option<Vec<CommentResponse>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl PostResponse {
    /// Assemble the wire shape from a post row, its tags, and (on detail
    /// reads) the threaded comments.
    pub fn from_parts(post: Post, tags: Vec<Tag>, comments: Option<Vec<CommentResponse>>) -> Self {
        let category = match (
            post.category_id,
            post.category_name.clone(),
            post.category_slug.clone(),
            post.category_created_utc,
        ) {
            (Some(id), Some(name), Some(slug), Some(created_at)) => Some(CategoryResponse {
                id,
                name,
                slug,
                description: post.category_description.clone().unwrap_or_default(),
                created_at,
                post_count: post.category_post_count.unwrap_or(0),
            }),
            _ => None,
        };

        Self {
            id: post.post_id,
            title: post.title,
            slug: post.slug,
            content: post.content,
            excerpt: post.excerpt,
            featured_image_url: post.featured_image_url,
            author: AuthorRef {
                id: post.author_id,
                username: post.author_username,
            },
            category,
            tags: tags.into_iter().map(TagResponse::from).collect(),
            status: post.status,
            views: post.views,
            comments_count: post.comments_count,
            likes_count: post.likes_count,
            comments,
            created_at: post.created_utc,
            updated_at: post.updated_utc,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct LikeResponse {
    pub liked: bool,
    pub count: i64,
}
