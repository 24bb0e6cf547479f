use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use uuid::Uuid;

use crate::models::{
    ActivityEntry, ActivityKind, AdminDashboard, CategoryProductCount, PlatformTotals, RecentOrder,
    RecentTask, SalesPoint, UserDashboard,
};

/// The stats endpoint answers with one of two shapes depending on the
/// caller's role.
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum DashboardResponse {
    User(UserDashboardResponse),
    Admin(AdminDashboardResponse),
}

#[derive(Debug, Serialize)]
pub struct UserDashboardResponse {
    pub task_count: i64,
    pub order_count: i64,
    pub recent_tasks: Vec<RecentTaskResponse>,
    pub recent_orders: Vec<RecentOrderResponse>,
}

impl From<UserDashboard> for UserDashboardResponse {
    fn from(dashboard: UserDashboard) -> Self {
        Self {
            task_count: dashboard.task_count,
            order_count: dashboard.order_count,
            recent_tasks: dashboard
                .recent_tasks
                .into_iter()
                .map(RecentTaskResponse::from)
                .collect(),
            recent_orders: dashboard
                .recent_orders
                .into_iter()
                .map(RecentOrderResponse::from)
                .collect(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct AdminDashboardResponse {
    pub user_stats: UserStatsResponse,
    pub admin_stats: AdminStatsResponse,
    pub recent_orders: Vec<AdminRecentOrderResponse>,
    pub sales_data: Vec<SalesPointResponse>,
    pub category_data: Vec<CategoryCountResponse>,
}

impl From<AdminDashboard> for AdminDashboardResponse {
    fn from(dashboard: AdminDashboard) -> Self {
        Self {
            user_stats: UserStatsResponse {
                task_count: dashboard.task_count,
                order_count: dashboard.order_count,
            },
            admin_stats: AdminStatsResponse::from(dashboard.totals),
            recent_orders: dashboard
                .recent_orders
                .into_iter()
                .map(AdminRecentOrderResponse::from)
                .collect(),
            sales_data: dashboard
                .sales
                .into_iter()
                .map(SalesPointResponse::from)
                .collect(),
            category_data: dashboard
                .categories
                .into_iter()
                .map(CategoryCountResponse::from)
                .collect(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct UserStatsResponse {
    pub task_count: i64,
    pub order_count: i64,
}

#[derive(Debug, Serialize)]
pub struct AdminStatsResponse {
    pub total_users: i64,
    pub total_products: i64,
    pub total_orders: i64,
    pub total_revenue: Decimal,
    pub overdue_invoices: i64,
}

impl From<PlatformTotals> for AdminStatsResponse {
    fn from(totals: PlatformTotals) -> Self {
        Self {
            total_users: totals.total_users,
            total_products: totals.total_products,
            total_orders: totals.total_orders,
            total_revenue: totals.total_revenue,
            overdue_invoices: totals.overdue_invoices,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct RecentTaskResponse {
    pub id: Uuid,
    pub title: String,
    pub status: String,
    pub due_date: Option<NaiveDate>,
}

impl From<RecentTask> for RecentTaskResponse {
    fn from(task: RecentTask) -> Self {
        Self {
            id: task.task_id,
            title: task.title,
            status: task.status,
            due_date: task.due_date,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct RecentOrderResponse {
    pub id: Uuid,
    pub amount: Decimal,
    pub status: String,
    pub date: DateTime<Utc>,
}

impl From<RecentOrder> for RecentOrderResponse {
    fn from(order: RecentOrder) -> Self {
        Self {
            id: order.order_id,
            amount: order.total_amount,
            status: order.status,
            date: order.created_utc,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct AdminRecentOrderResponse {
    pub id: Uuid,
    pub customer: String,
    pub amount: Decimal,
    pub status: String,
    pub date: DateTime<Utc>,
}

impl From<RecentOrder> for AdminRecentOrderResponse {
    fn from(order: RecentOrder) -> Self {
        Self {
            id: order.order_id,
            customer: order.username,
            amount: order.total_amount,
            status: order.status,
            date: order.created_utc,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct SalesPointResponse {
    pub date: NaiveDate,
    pub amount: Decimal,
}

impl From<SalesPoint> for SalesPointResponse {
    fn from(point: SalesPoint) -> Self {
        Self {
            date: point.day,
            amount: point.amount,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct CategoryCountResponse {
    pub name: String,
    pub count: i64,
}

impl From<CategoryProductCount> for CategoryCountResponse {
    fn from(category: CategoryProductCount) -> Self {
        Self {
            name: category.name,
            count: category.count,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ActivityResponse {
    pub timeline: Vec<ActivityItemResponse>,
}

#[derive(Debug, Serialize)]
pub struct ActivityItemResponse {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub id: Uuid,
    pub title: String,
    pub status: String,
    pub date: DateTime<Utc>,
    pub description: String,
}

impl From<ActivityEntry> for ActivityItemResponse {
    fn from(entry: ActivityEntry) -> Self {
        let description = match entry.kind {
            ActivityKind::Task => format!("Task '{}' was {}", entry.title, entry.status),
            ActivityKind::Order => format!("{} was {}", entry.title, entry.status),
        };
        Self {
            kind: entry.kind.as_str(),
            id: entry.id,
            title: entry.title,
            status: entry.status,
            date: entry.date,
            description,
        }
    }
}
