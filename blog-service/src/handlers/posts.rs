//! Post CRUD, detail reads, and like toggling.
//!
//! Posts are public to every authenticated caller; editing and deleting
//! are reserved for the author and admins.

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use platform_core::error::AppError;
use platform_core::middleware::identity::Identity;
use std::collections::HashMap;
use uuid::Uuid;
use validator::Validate;

use crate::{
    AppState,
    dtos::comments::CommentResponse,
    dtos::posts::{
        CreatePostRequest, LikeResponse, ListPostsQuery, PostResponse, UpdatePostRequest,
    },
    models::{CreatePost, ListPostsFilter, Post, PostStatus, UpdatePost},
    services::comment_tree::build_forest,
    services::metrics::{record_like_toggled, record_post_created},
    services::slug::parse_tags,
};

const DEFAULT_PAGE_SIZE: i64 = 50;

fn parse_status(status: &str) -> Result<PostStatus, AppError> {
    PostStatus::parse(status).ok_or_else(|| {
        AppError::BadRequest(anyhow::anyhow!(
            "Invalid status. Valid values are: {}",
            PostStatus::valid_values()
        ))
    })
}

/// The author and admins may touch a post; everyone else gets a 403 with
/// an action-specific message.
fn require_author(identity: &Identity, post: &Post, denial: &str) -> Result<(), AppError> {
    if identity.is_admin() || identity.user_id == post.author_id {
        Ok(())
    } else {
        Err(AppError::Forbidden(anyhow::anyhow!("{}", denial)))
    }
}

/// List published posts, newest first.
pub async fn list_posts(
    State(state): State<AppState>,
    _identity: Identity,
    Query(query): Query<ListPostsQuery>,
) -> Result<Json<Vec<PostResponse>>, AppError> {
    let filter = ListPostsFilter {
        query: query.q,
        category_slug: query.category,
        tag_slug: query.tag,
        limit: query.limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, 100),
        offset: query.offset.unwrap_or(0).max(0),
    };

    let posts = state.db.list_posts(&filter).await?;
    Ok(Json(with_tags(&state, posts).await?))
}

/// Create a post authored by the caller.
pub async fn create_post(
    State(state): State<AppState>,
    identity: Identity,
    Json(payload): Json<CreatePostRequest>,
) -> Result<(StatusCode, Json<PostResponse>), AppError> {
    payload.validate()?;

    let status = match payload.status.as_deref() {
        Some(value) => parse_status(value)?,
        None => PostStatus::Draft,
    };

    if let Some(category_id) = payload.category_id {
        if !state.db.category_exists(category_id).await? {
            return Err(AppError::BadRequest(anyhow::anyhow!("Category not found")));
        }
    }

    let input = CreatePost {
        author_id: identity.user_id,
        author_username: identity.username,
        title: payload.title,
        content: payload.content,
        excerpt: payload.excerpt,
        featured_image_url: payload.featured_image_url,
        category_id: payload.category_id,
        status,
        tags: payload.tags.as_deref().map(parse_tags).unwrap_or_default(),
    };

    let post = state.db.create_post(&input).await?;
    record_post_created();

    let tags = state.db.get_post_tags(post.post_id).await?;
    Ok((
        StatusCode::CREATED,
        Json(PostResponse::from_parts(post, tags, None)),
    ))
}

/// Full post detail with the threaded comments. Every read counts a view.
pub async fn post_detail(
    State(state): State<AppState>,
    _identity: Identity,
    Path(slug): Path<String>,
) -> Result<Json<PostResponse>, AppError> {
    let post = state
        .db
        .read_post_by_slug(&slug)
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Post not found")))?;

    let tags = state.db.get_post_tags(post.post_id).await?;
    let comments = state.db.list_comments_for_post(post.post_id).await?;
    let tree: Vec<CommentResponse> = build_forest(comments)
        .into_iter()
        .map(CommentResponse::from)
        .collect();

    Ok(Json(PostResponse::from_parts(post, tags, Some(tree))))
}

/// Partially update a post, re-tagging when a tag string is supplied.
pub async fn update_post(
    State(state): State<AppState>,
    identity: Identity,
    Path(slug): Path<String>,
    Json(payload): Json<UpdatePostRequest>,
) -> Result<Json<PostResponse>, AppError> {
    let post = state
        .db
        .get_post_by_slug(&slug)
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Post not found")))?;
    require_author(
        &identity,
        &post,
        "You do not have permission to edit this post",
    )?;

    let status = match payload.status.as_deref() {
        Some(value) => Some(parse_status(value)?),
        None => None,
    };

    if let Some(category_id) = payload.category_id {
        if !state.db.category_exists(category_id).await? {
            return Err(AppError::BadRequest(anyhow::anyhow!("Category not found")));
        }
    }

    let input = UpdatePost {
        title: payload.title,
        content: payload.content,
        excerpt: payload.excerpt,
        featured_image_url: payload.featured_image_url,
        category_id: payload.category_id,
        status,
        tags: payload.tags.as_deref().map(parse_tags),
    };

    let updated = state
        .db
        .update_post(post.post_id, &input)
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Post not found")))?;
    let tags = state.db.get_post_tags(updated.post_id).await?;

    Ok(Json(PostResponse::from_parts(updated, tags, None)))
}

/// Delete a post along with its comments, likes, and tag links.
pub async fn delete_post(
    State(state): State<AppState>,
    identity: Identity,
    Path(slug): Path<String>,
) -> Result<StatusCode, AppError> {
    let post = state
        .db
        .get_post_by_slug(&slug)
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Post not found")))?;
    require_author(
        &identity,
        &post,
        "You do not have permission to delete this post",
    )?;

    state.db.delete_post(post.post_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Toggle the caller's like on a post.
pub async fn like_post(
    State(state): State<AppState>,
    identity: Identity,
    Path(slug): Path<String>,
) -> Result<Json<LikeResponse>, AppError> {
    let post = state
        .db
        .get_post_by_slug(&slug)
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Post not found")))?;

    let (liked, count) = state.db.toggle_post_like(post.post_id, identity.user_id).await?;
    record_like_toggled(liked);

    Ok(Json(LikeResponse { liked, count }))
}

/// Attach tags to a batch of post rows in one query.
pub(crate) async fn with_tags(
    state: &AppState,
    posts: Vec<Post>,
) -> Result<Vec<PostResponse>, AppError> {
    let post_ids: Vec<Uuid> = posts.iter().map(|p| p.post_id).collect();
    let mut tags_by_post: HashMap<Uuid, Vec<_>> = state.db.get_tags_for_posts(&post_ids).await?;

    Ok(posts
        .into_iter()
        .map(|post| {
            let tags = tags_by_post.remove(&post.post_id).unwrap_or_default();
            PostResponse::from_parts(post, tags, None)
        })
        .collect())
}
