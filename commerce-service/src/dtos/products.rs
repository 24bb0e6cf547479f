use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::models::Product;

fn default_true() -> bool {
    true
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateProductRequest {
    #[validate(length(min = 1, message = "Name is required"))]
    pub name: String,

    #[serde(default)]
    pub description: String,

    pub category_id: Option<Uuid>,
    pub price: Decimal,
    pub image_url: Option<String>,

    #[serde(default)]
    #[validate(range(min = 0, message = "Stock cannot be negative"))]
    pub stock: i32,

    #[serde(default = "default_true")]
    pub is_active: bool,
}

#[derive(Debug, Deserialize, Default)]
pub struct UpdateProductRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub category_id: Option<Uuid>,
    pub price: Option<Decimal>,
    pub image_url: Option<String>,
    pub stock: Option<i32>,
    pub is_active: Option<bool>,
}

/// `active` is matched against the literal string `true`, any other value
/// leaves the listing unfiltered.
#[derive(Debug, Deserialize)]
pub struct ListProductsQuery {
    pub category: Option<Uuid>,
    pub active: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SearchProductsQuery {
    pub q: Option<String>,
    pub category: Option<Uuid>,
}

#[derive(Debug, Serialize)]
pub struct ProductResponse {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub category: Option<Uuid>,
    pub category_name: Option<String>,
    pub price: Decimal,
    pub image_url: Option<String>,
    pub stock: i32,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Product> for ProductResponse {
    fn from(product: Product) -> Self {
        Self {
            id: product.product_id,
            name: product.name,
            description: product.description,
            category: product.category_id,
            category_name: product.category_name,
            price: product.price,
            image_url: product.image_url,
            stock: product.stock,
            is_active: product.is_active,
            created_at: product.created_utc,
            updated_at: product.updated_utc,
        }
    }
}
