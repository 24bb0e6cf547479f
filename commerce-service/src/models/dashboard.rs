//! Read-only projections backing the dashboard endpoints.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

/// One of the caller's most recent tasks.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct RecentTask {
    pub task_id: Uuid,
    pub title: String,
    pub status: String,
    pub due_date: Option<NaiveDate>,
}

/// One of the most recent orders. `username` is only surfaced on the
/// admin view.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct RecentOrder {
    pub order_id: Uuid,
    pub username: String,
    pub total_amount: Decimal,
    pub status: String,
    pub created_utc: DateTime<Utc>,
}

/// Order revenue summed per calendar day.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct SalesPoint {
    pub day: NaiveDate,
    pub amount: Decimal,
}

/// Product count per category.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct CategoryProductCount {
    pub name: String,
    pub count: i64,
}

/// Platform-wide totals, admin view only.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct PlatformTotals {
    pub total_users: i64,
    pub total_products: i64,
    pub total_orders: i64,
    pub total_revenue: Decimal,
    pub overdue_invoices: i64,
}

/// Dashboard payload for a regular user.
#[derive(Debug, Clone)]
pub struct UserDashboard {
    pub task_count: i64,
    pub order_count: i64,
    pub recent_tasks: Vec<RecentTask>,
    pub recent_orders: Vec<RecentOrder>,
}

/// Dashboard payload for an admin: their own counts plus platform totals.
#[derive(Debug, Clone)]
pub struct AdminDashboard {
    pub task_count: i64,
    pub order_count: i64,
    pub totals: PlatformTotals,
    pub recent_orders: Vec<RecentOrder>,
    pub sales: Vec<SalesPoint>,
    pub categories: Vec<CategoryProductCount>,
}

/// One event on the activity timeline, either a task or an order.
#[derive(Debug, Clone)]
pub struct ActivityEntry {
    pub kind: ActivityKind,
    pub id: Uuid,
    pub title: String,
    pub status: String,
    pub date: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActivityKind {
    Task,
    Order,
}

impl ActivityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActivityKind::Task => "task",
            ActivityKind::Order => "order",
        }
    }
}
