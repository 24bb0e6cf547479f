//! Order and order item models.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Order lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    Pending,
    Processing,
    Shipped,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Processing => "processing",
            OrderStatus::Shipped => "shipped",
            OrderStatus::Delivered => "delivered",
            OrderStatus::Cancelled => "cancelled",
        }
    }

    /// Strict parse; unknown values are rejected rather than defaulted so
    /// callers can surface the valid set.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(OrderStatus::Pending),
            "processing" => Some(OrderStatus::Processing),
            "shipped" => Some(OrderStatus::Shipped),
            "delivered" => Some(OrderStatus::Delivered),
            "cancelled" => Some(OrderStatus::Cancelled),
            _ => None,
        }
    }

    pub fn valid_values() -> &'static str {
        "pending, processing, shipped, delivered, cancelled"
    }
}

/// Order row. `username` and `total_amount` are captured at placement and
/// never recomputed.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Order {
    pub order_id: Uuid,
    pub user_id: Uuid,
    pub username: String,
    pub total_amount: Decimal,
    pub status: String,
    pub shipping_address: String,
    pub phone_number: String,
    pub email: String,
    pub created_utc: DateTime<Utc>,
    pub updated_utc: DateTime<Utc>,
}

/// Order item row joined with the product's current name.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct OrderItemRecord {
    pub order_item_id: Uuid,
    pub order_id: Uuid,
    pub product_id: Uuid,
    pub product_name: String,
    pub quantity: i32,
    pub price: Decimal,
}

/// One requested line of a new order.
#[derive(Debug, Clone)]
pub struct OrderLine {
    pub product_id: Uuid,
    pub quantity: i32,
}

/// Input for placing an order.
#[derive(Debug, Clone)]
pub struct PlaceOrder {
    pub user_id: Uuid,
    pub username: String,
    pub shipping_address: String,
    pub phone_number: String,
    pub email: String,
    pub items: Vec<OrderLine>,
}

/// Filter parameters for listing orders. `user_id = None` lists every order
/// (admin scope).
#[derive(Debug, Clone, Default)]
pub struct ListOrdersFilter {
    pub user_id: Option<Uuid>,
    pub limit: i64,
    pub offset: i64,
}
