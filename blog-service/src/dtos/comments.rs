use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::dtos::posts::AuthorRef;
use crate::models::Comment;
use crate::services::CommentNode;

#[derive(Debug, Deserialize, Validate)]
pub struct CreateCommentRequest {
    #[validate(length(min = 1, message = "Content is required"))]
    pub content: String,

    pub parent_id: Option<Uuid>,
}

#[derive(Debug, Serialize)]
pub struct CommentResponse {
    pub id: Uuid,
    pub post: Uuid,
    pub author: AuthorRef,
    pub content: String,
    pub parent: Option<Uuid>,
    pub like_count: i64,
    pub replies: Vec<CommentResponse>,
    pub created_at: DateTime<Utc>,
}

impl From<Comment> for CommentResponse {
    fn from(comment: Comment) -> Self {
        Self {
            id: comment.comment_id,
            post: comment.post_id,
            author: AuthorRef {
                id: comment.author_id,
                username: comment.author_username,
            },
            content: comment.content,
            parent: comment.parent_id,
            like_count: comment.like_count,
            replies: Vec::new(),
            created_at: comment.created_utc,
        }
    }
}

impl From<CommentNode> for CommentResponse {
    fn from(node: CommentNode) -> Self {
        let mut response = CommentResponse::from(node.comment);
        response.replies = node.replies.into_iter().map(CommentResponse::from).collect();
        response
    }
}
