use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::models::{Order, OrderItemRecord};
use crate::services::placement::line_total;

fn default_quantity() -> i32 {
    1
}

#[derive(Debug, Deserialize, Validate)]
pub struct OrderItemRequest {
    pub product_id: Uuid,

    #[serde(default = "default_quantity")]
    #[validate(range(min = 1, message = "Quantity must be at least 1"))]
    pub quantity: i32,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateOrderRequest {
    #[serde(default)]
    #[validate(nested)]
    pub items: Vec<OrderItemRequest>,

    pub shipping_address: Option<String>,
    pub phone_number: Option<String>,
    pub email: Option<String>,
}

/// `status` stays optional so its absence can be reported as a 400 rather
/// than a deserialization failure.
#[derive(Debug, Deserialize)]
pub struct UpdateOrderStatusRequest {
    pub status: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ListOrdersQuery {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct OrderItemResponse {
    pub id: Uuid,
    pub product: Uuid,
    pub product_name: String,
    pub quantity: i32,
    pub price: Decimal,
    pub total: Decimal,
}

impl From<OrderItemRecord> for OrderItemResponse {
    fn from(item: OrderItemRecord) -> Self {
        let total = line_total(item.price, item.quantity);
        Self {
            id: item.order_item_id,
            product: item.product_id,
            product_name: item.product_name,
            quantity: item.quantity,
            price: item.price,
            total,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct OrderResponse {
    pub id: Uuid,
    pub user: Uuid,
    pub user_username: String,
    pub total_amount: Decimal,
    pub status: String,
    pub shipping_address: String,
    pub phone_number: String,
    pub email: String,
    pub items: Vec<OrderItemResponse>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl OrderResponse {
    pub fn from_parts(order: Order, items: Vec<OrderItemRecord>) -> Self {
        Self {
            id: order.order_id,
            user: order.user_id,
            user_username: order.username,
            total_amount: order.total_amount,
            status: order.status,
            shipping_address: order.shipping_address,
            phone_number: order.phone_number,
            email: order.email,
            items: items.into_iter().map(OrderItemResponse::from).collect(),
            created_at: order.created_utc,
            updated_at: order.updated_utc,
        }
    }
}
