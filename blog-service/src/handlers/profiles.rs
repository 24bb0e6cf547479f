//! Author profile handlers.
//!
//! Profiles materialize lazily: the caller's own profile is created on
//! first access, and a public author page can materialize one for an
//! author known only through their posts.

use axum::{
    Json,
    extract::{Path, State},
};
use platform_core::error::AppError;
use platform_core::middleware::identity::Identity;

use crate::{
    AppState,
    dtos::profiles::{AuthorPageResponse, ProfileResponse, UpdateProfileRequest},
    handlers::posts::with_tags,
    models::UpdateAuthorProfile,
};

/// Public author page: the profile plus every post by the author, newest
/// first.
pub async fn author_page(
    State(state): State<AppState>,
    _identity: Identity,
    Path(username): Path<String>,
) -> Result<Json<AuthorPageResponse>, AppError> {
    let profile = match state.db.get_profile_by_username(&username).await? {
        Some(profile) => profile,
        None => {
            let author_id = state
                .db
                .find_post_author(&username)
                .await?
                .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Profile not found")))?;
            state.db.get_or_create_profile(author_id, &username).await?
        }
    };

    let posts = state.db.list_posts_by_author(profile.user_id).await?;
    let posts = with_tags(&state, posts).await?;

    Ok(Json(AuthorPageResponse {
        profile: ProfileResponse::from(profile),
        posts,
    }))
}

/// The caller's own profile, created on first access.
pub async fn my_profile(
    State(state): State<AppState>,
    identity: Identity,
) -> Result<Json<ProfileResponse>, AppError> {
    let profile = state
        .db
        .get_or_create_profile(identity.user_id, &identity.username)
        .await?;
    Ok(Json(ProfileResponse::from(profile)))
}

/// Partially update the caller's profile.
pub async fn update_my_profile(
    State(state): State<AppState>,
    identity: Identity,
    Json(payload): Json<UpdateProfileRequest>,
) -> Result<Json<ProfileResponse>, AppError> {
    state
        .db
        .get_or_create_profile(identity.user_id, &identity.username)
        .await?;

    let input = UpdateAuthorProfile {
        bio: payload.bio,
        avatar_url: payload.avatar_url,
        website: payload.website,
        twitter: payload.twitter,
        github: payload.github,
        linkedin: payload.linkedin,
    };

    let profile = state
        .db
        .update_profile(identity.user_id, &input)
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Profile not found")))?;

    Ok(Json(ProfileResponse::from(profile)))
}
