//! Category and tag listings. Any authenticated caller may create a
//! category; tags only come into being through post tagging.

use axum::{Json, extract::State, http::StatusCode};
use platform_core::error::AppError;
use platform_core::middleware::identity::Identity;
use validator::Validate;

use crate::{
    AppState,
    dtos::taxonomy::{CategoryResponse, CreateCategoryRequest, TagResponse},
    models::CreateCategory,
};

/// List every category with its post count, alphabetically.
pub async fn list_categories(
    State(state): State<AppState>,
    _identity: Identity,
) -> Result<Json<Vec<CategoryResponse>>, AppError> {
    let categories = state.db.list_categories().await?;
    Ok(Json(
        categories.into_iter().map(CategoryResponse::from).collect(),
    ))
}

/// Create a category. The slug is derived from the name.
pub async fn create_category(
    State(state): State<AppState>,
    _identity: Identity,
    Json(payload): Json<CreateCategoryRequest>,
) -> Result<(StatusCode, Json<CategoryResponse>), AppError> {
    payload.validate()?;

    let input = CreateCategory {
        name: payload.name,
        description: payload.description,
    };

    let category = state.db.create_category(&input).await?;
    Ok((StatusCode::CREATED, Json(CategoryResponse::from(category))))
}

/// List every tag with its post count, alphabetically.
pub async fn list_tags(
    State(state): State<AppState>,
    _identity: Identity,
) -> Result<Json<Vec<TagResponse>>, AppError> {
    let tags = state.db.list_tags().await?;
    Ok(Json(tags.into_iter().map(TagResponse::from).collect()))
}
