//! Comment creation and threaded reads.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use platform_core::error::AppError;
use platform_core::middleware::identity::Identity;
use validator::Validate;

use crate::{
    AppState,
    dtos::comments::{CommentResponse, CreateCommentRequest},
    models::CreateComment,
    services::comment_tree::build_forest,
    services::metrics::record_comment_created,
};

/// Add a comment to a post. A reply's parent must exist and belong to the
/// same post.
pub async fn create_comment(
    State(state): State<AppState>,
    identity: Identity,
    Path(slug): Path<String>,
    Json(payload): Json<CreateCommentRequest>,
) -> Result<(StatusCode, Json<CommentResponse>), AppError> {
    payload.validate()?;

    let post = state
        .db
        .get_post_by_slug(&slug)
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Post not found")))?;

    if let Some(parent_id) = payload.parent_id {
        let parent = state
            .db
            .get_comment(parent_id)
            .await?
            .ok_or_else(|| AppError::BadRequest(anyhow::anyhow!("Parent comment not found")))?;
        if parent.post_id != post.post_id {
            return Err(AppError::BadRequest(anyhow::anyhow!(
                "Parent comment belongs to a different post"
            )));
        }
    }

    let input = CreateComment {
        post_id: post.post_id,
        author_id: identity.user_id,
        author_username: identity.username,
        content: payload.content,
        parent_id: payload.parent_id,
    };

    let comment = state.db.create_comment(&input).await?;
    record_comment_created();

    Ok((StatusCode::CREATED, Json(CommentResponse::from(comment))))
}

/// The post's comments as a reply tree: top-level newest first, replies
/// oldest first.
pub async fn list_comments(
    State(state): State<AppState>,
    _identity: Identity,
    Path(slug): Path<String>,
) -> Result<Json<Vec<CommentResponse>>, AppError> {
    let post = state
        .db
        .get_post_by_slug(&slug)
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Post not found")))?;

    let comments = state.db.list_comments_for_post(post.post_id).await?;
    let tree = build_forest(comments)
        .into_iter()
        .map(CommentResponse::from)
        .collect();

    Ok(Json(tree))
}
