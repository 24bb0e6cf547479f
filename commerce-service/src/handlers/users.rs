//! Profile and notification settings handlers. Rows are created on first
//! access, seeded from the caller's identity.

use axum::{Json, extract::State};
use platform_core::error::AppError;
use platform_core::middleware::identity::Identity;

use crate::{
    AppState,
    dtos::users::{ProfileResponse, SettingsResponse, UpdateProfileRequest, UpdateSettingsRequest},
    models::{UpdateUserProfile, UpdateUserSettings},
};

pub async fn get_profile(
    State(state): State<AppState>,
    identity: Identity,
) -> Result<Json<ProfileResponse>, AppError> {
    let profile = state
        .db
        .get_or_create_profile(identity.user_id, &identity.username, identity.email.as_deref())
        .await?;

    Ok(Json(ProfileResponse::from(profile)))
}

pub async fn update_profile(
    State(state): State<AppState>,
    identity: Identity,
    Json(payload): Json<UpdateProfileRequest>,
) -> Result<Json<ProfileResponse>, AppError> {
    state
        .db
        .get_or_create_profile(identity.user_id, &identity.username, identity.email.as_deref())
        .await?;

    let input = UpdateUserProfile {
        email: payload.email,
        avatar_url: payload.avatar_url,
        bio: payload.bio,
        location: payload.location,
        phone: payload.phone,
        website: payload.website,
    };

    let profile = state
        .db
        .update_profile(identity.user_id, &input)
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Profile not found")))?;

    Ok(Json(ProfileResponse::from(profile)))
}

pub async fn get_settings(
    State(state): State<AppState>,
    identity: Identity,
) -> Result<Json<SettingsResponse>, AppError> {
    let settings = state
        .db
        .get_or_create_settings(identity.user_id, &identity.username)
        .await?;

    Ok(Json(SettingsResponse::from(settings)))
}

pub async fn update_settings(
    State(state): State<AppState>,
    identity: Identity,
    Json(payload): Json<UpdateSettingsRequest>,
) -> Result<Json<SettingsResponse>, AppError> {
    state
        .db
        .get_or_create_settings(identity.user_id, &identity.username)
        .await?;

    let input = UpdateUserSettings {
        email_notifications: payload.email_notifications,
        sms_notifications: payload.sms_notifications,
        browser_notifications: payload.browser_notifications,
    };

    let settings = state
        .db
        .update_settings(identity.user_id, &input)
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Settings not found")))?;

    Ok(Json(SettingsResponse::from(settings)))
}
