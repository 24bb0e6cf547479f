//! Category handlers. Reads are open to any caller; mutations are admin only.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use platform_core::error::AppError;
use platform_core::middleware::identity::Identity;
use uuid::Uuid;
use validator::Validate;

use crate::{
    AppState,
    dtos::categories::{CategoryResponse, CreateCategoryRequest, UpdateCategoryRequest},
    models::{CreateCategory, UpdateCategory},
};

fn require_admin(identity: &Identity) -> Result<(), AppError> {
    if identity.is_admin() {
        Ok(())
    } else {
        Err(AppError::Forbidden(anyhow::anyhow!(
            "Admin privileges required"
        )))
    }
}

pub async fn list_categories(
    State(state): State<AppState>,
    _identity: Identity,
) -> Result<Json<Vec<CategoryResponse>>, AppError> {
    let categories = state.db.list_categories().await?;
    Ok(Json(
        categories.into_iter().map(CategoryResponse::from).collect(),
    ))
}

pub async fn get_category(
    State(state): State<AppState>,
    _identity: Identity,
    Path(category_id): Path<Uuid>,
) -> Result<Json<CategoryResponse>, AppError> {
    let category = state
        .db
        .get_category(category_id)
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Category not found")))?;

    Ok(Json(CategoryResponse::from(category)))
}

pub async fn create_category(
    State(state): State<AppState>,
    identity: Identity,
    Json(payload): Json<CreateCategoryRequest>,
) -> Result<(StatusCode, Json<CategoryResponse>), AppError> {
    require_admin(&identity)?;
    payload.validate()?;

    let input = CreateCategory {
        name: payload.name,
        description: payload.description,
    };

    let category = state.db.create_category(&input).await?;
    Ok((StatusCode::CREATED, Json(CategoryResponse::from(category))))
}

pub async fn update_category(
    State(state): State<AppState>,
    identity: Identity,
    Path(category_id): Path<Uuid>,
    Json(payload): Json<UpdateCategoryRequest>,
) -> Result<Json<CategoryResponse>, AppError> {
    require_admin(&identity)?;

    let input = UpdateCategory {
        name: payload.name,
        description: payload.description,
    };

    let category = state
        .db
        .update_category(category_id, &input)
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Category not found")))?;

    Ok(Json(CategoryResponse::from(category)))
}
