//! Catalog handlers. Reads are open to any caller; mutations are admin only.

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use platform_core::error::AppError;
use platform_core::middleware::identity::Identity;
use rust_decimal::Decimal;
use uuid::Uuid;
use validator::Validate;

use crate::{
    AppState,
    dtos::products::{
        CreateProductRequest, ListProductsQuery, ProductResponse, SearchProductsQuery,
        UpdateProductRequest,
    },
    models::{CreateProduct, ListProductsFilter, ProductSearch, UpdateProduct},
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

/// List products, optionally filtered by category and `active=true`.
pub async fn list_products(
    State(state): State<AppState>,
    _identity: Identity,
    Query(query): Query<ListProductsQuery>,
) -> Result<Json<Vec<ProductResponse>>, AppError> {
    let filter = ListProductsFilter {
        category_id: query.category,
        active_only: query.active.as_deref() == Some("true"),
    };

    let products = state.db.list_products(&filter).await?;
    Ok(Json(
        products.into_iter().map(ProductResponse::from).collect(),
    ))
}

/// Storefront search over active products.
pub async fn search_products(
    State(state): State<AppState>,
    _identity: Identity,
    Query(query): Query<SearchProductsQuery>,
) -> Result<Json<Vec<ProductResponse>>, AppError> {
    let search = ProductSearch {
        query: query.q.filter(|q| !q.is_empty()),
        category_id: query.category,
    };

    let products = state.db.search_products(&search).await?;
    Ok(Json(
        products.into_iter().map(ProductResponse::from).collect(),
    ))
}

/// One product.
pub async fn get_product(
    State(state): State<AppState>,
    _identity: Identity,
    Path(product_id): Path<Uuid>,
) -> Result<Json<ProductResponse>, AppError> {
    let product = state
        .db
        .get_product(product_id)
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Product not found")))?;

    Ok(Json(ProductResponse::from(product)))
}

/// Create a product (admin only).
pub async fn create_product(
    State(state): State<AppState>,
    identity: Identity,
    Json(payload): Json<CreateProductRequest>,
) -> Result<(StatusCode, Json<ProductResponse>), AppError> {
    require_admin(&identity)?;
    payload.validate()?;

    if payload.price < Decimal::ZERO {
        return Err(AppError::BadRequest(anyhow::anyhow!(
            "Price cannot be negative"
        )));
    }

    let input = CreateProduct {
        name: payload.name,
        description: payload.description,
        category_id: payload.category_id,
        price: payload.price,
        image_url: payload.image_url,
        stock: payload.stock,
        is_active: payload.is_active,
    };

    let product = state.db.create_product(&input).await?;
    Ok((StatusCode::CREATED, Json(ProductResponse::from(product))))
}

/// Partially update a product (admin only).
pub async fn update_product(
    State(state): State<AppState>,
    identity: Identity,
    Path(product_id): Path<Uuid>,
    Json(payload): Json<UpdateProductRequest>,
) -> Result<Json<ProductResponse>, AppError> {
    require_admin(&identity)?;

    if payload.price.is_some_and(|price| price < Decimal::ZERO) {
        return Err(AppError::BadRequest(anyhow::anyhow!(
            "Price cannot be negative"
        )));
    }
    if payload.stock.is_some_and(|stock| stock < 0) {
        return Err(AppError::BadRequest(anyhow::anyhow!(
            "Stock cannot be negative"
        )));
    }

    let input = UpdateProduct {
        name: payload.name,
        description: payload.description,
        category_id: payload.category_id,
        price: payload.price,
        image_url: payload.image_url,
        stock: payload.stock,
        is_active: payload.is_active,
    };

    let product = state
        .db
        .update_product(product_id, &input)
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Product not found")))?;

    Ok(Json(ProductResponse::from(product)))
}
