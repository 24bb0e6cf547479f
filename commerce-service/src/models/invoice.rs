//! Invoice model.
//!
//! Exactly one invoice is raised per order, at placement time.

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Days between invoice creation and its due date.
pub const PAYMENT_TERMS_DAYS: i64 = 15;

/// Invoice status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvoiceStatus {
    Unpaid,
    Paid,
    Cancelled,
}

impl InvoiceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            InvoiceStatus::Unpaid => "unpaid",
            InvoiceStatus::Paid => "paid",
            InvoiceStatus::Cancelled => "cancelled",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "unpaid" => Some(InvoiceStatus::Unpaid),
            "paid" => Some(InvoiceStatus::Paid),
            "cancelled" => Some(InvoiceStatus::Cancelled),
            _ => None,
        }
    }

    pub fn valid_values() -> &'static str {
        "unpaid, paid, cancelled"
    }
}

/// Invoice row joined with the owning order's username as `customer_name`.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Invoice {
    pub invoice_id: Uuid,
    pub order_id: Uuid,
    pub invoice_number: String,
    pub customer_name: String,
    pub status: String,
    pub due_date: NaiveDate,
    pub payment_method: Option<String>,
    pub payment_date: Option<NaiveDate>,
    pub created_utc: DateTime<Utc>,
}

impl Invoice {
    /// An invoice is overdue while it is unpaid past its due date.
    pub fn is_overdue_on(&self, today: NaiveDate) -> bool {
        self.status == InvoiceStatus::Unpaid.as_str() && self.due_date < today
    }
}

/// Invoice number for an order: `INV-{order id}-{YYYYMMDD}` with the order
/// id in dash-less hex form.
pub fn invoice_number(order_id: Uuid, created: NaiveDate) -> String {
    format!("INV-{}-{}", order_id.simple(), created.format("%Y%m%d"))
}

/// Due date for an invoice created on `created`.
pub fn payment_due_date(created: NaiveDate) -> NaiveDate {
    created + Duration::days(PAYMENT_TERMS_DAYS)
}
