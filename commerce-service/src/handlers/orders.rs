//! Order placement and lifecycle handlers.
//!
//! Non-admin callers only ever see their own orders; an order owned by
//! someone else resolves like one that does not exist.

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
    dtos::orders::{CreateOrderRequest, ListOrdersQuery, OrderResponse, UpdateOrderStatusRequest},
    models::{ListOrdersFilter, Order, OrderItemRecord, OrderLine, OrderStatus, PlaceOrder},
    services::metrics::{record_order_placed, record_order_transition},
};

const DEFAULT_PAGE_SIZE: i64 = 50;

/// Place a new order for the caller.
pub async fn create_order(
    State(state): State<AppState>,
    identity: Identity,
    Json(payload): Json<CreateOrderRequest>,
) -> Result<(StatusCode, Json<OrderResponse>), AppError> {
    payload.validate()?;

    // The email on the order falls back to the caller's own address.
    let email = payload.email.or(identity.email).unwrap_or_default();

    let input = PlaceOrder {
        user_id: identity.user_id,
        username: identity.username,
        shipping_address: payload.shipping_address.unwrap_or_default(),
        phone_number: payload.phone_number.unwrap_or_default(),
        email,
        items: payload
            .items
            .iter()
            .map(|item| OrderLine {
                product_id: item.product_id,
                quantity: item.quantity,
            })
            .collect(),
    };

    let (order, items) = state.db.place_order(&input).await?;
    record_order_placed();

    Ok((
        StatusCode::CREATED,
        Json(OrderResponse::from_parts(order, items)),
    ))
}

/// List orders: admins see every order, everyone else their own.
pub async fn list_orders(
    State(state): State<AppState>,
    identity: Identity,
    Query(query): Query<ListOrdersQuery>,
) -> Result<Json<Vec<OrderResponse>>, AppError> {
    let filter = ListOrdersFilter {
        user_id: if identity.is_admin() {
            None
        } else {
            Some(identity.user_id)
        },
        limit: query.limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, 100),
        offset: query.offset.unwrap_or(0).max(0),
    };

    let orders = state.db.list_orders(&filter).await?;
    Ok(Json(with_items(&state, orders).await?))
}

/// One order with its items.
pub async fn order_details(
    State(state): State<AppState>,
    identity: Identity,
    Path(order_id): Path<Uuid>,
) -> Result<Json<OrderResponse>, AppError> {
    let scope_user = if identity.is_admin() {
        None
    } else {
        Some(identity.user_id)
    };

    let order = state
        .db
        .get_order(order_id, scope_user)
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Order not found")))?;
    let items = state.db.get_order_items(order_id).await?;

    Ok(Json(OrderResponse::from_parts(order, items)))
}

/// Transition an order's status. Cancelling restores the stock it claimed.
pub async fn update_order_status(
    State(state): State<AppState>,
    identity: Identity,
    Path(order_id): Path<Uuid>,
    Json(payload): Json<UpdateOrderStatusRequest>,
) -> Result<Json<OrderResponse>, AppError> {
    let status = payload
        .status
        .as_deref()
        .ok_or_else(|| AppError::BadRequest(anyhow::anyhow!("Status not provided")))?;

    let new_status = OrderStatus::parse(status).ok_or_else(|| {
        AppError::BadRequest(anyhow::anyhow!(
            "Invalid status. Valid values are: {}",
            OrderStatus::valid_values()
        ))
    })?;

    let scope_user = if identity.is_admin() {
        None
    } else {
        Some(identity.user_id)
    };

    let (order, items) = state
        .db
        .update_order_status(order_id, scope_user, new_status)
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Order not found")))?;

    record_order_transition(new_status.as_str());

    Ok(Json(OrderResponse::from_parts(order, items)))
}

/// Attach items to a page of orders with a single lookup.
async fn with_items(
    state: &AppState,
    orders: Vec<Order>,
) -> Result<Vec<OrderResponse>, AppError> {
    let ids: Vec<Uuid> = orders.iter().map(|order| order.order_id).collect();

    let mut grouped: HashMap<Uuid, Vec<OrderItemRecord>> = HashMap::new();
    for item in state.db.get_items_for_orders(&ids).await? {
        grouped.entry(item.order_id).or_default().push(item);
    }

    Ok(orders
        .into_iter()
        .map(|order| {
            let items = grouped.remove(&order.order_id).unwrap_or_default();
            OrderResponse::from_parts(order, items)
        })
        .collect())
}
