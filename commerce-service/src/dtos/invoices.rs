use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::Invoice;

#[derive(Debug, Deserialize)]
pub struct UpdateInvoiceStatusRequest {
    pub status: Option<String>,
    pub payment_method: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct InvoiceResponse {
    pub id: Uuid,
    pub invoice_number: String,
    pub order_id: Uuid,
    pub customer_name: String,
    pub status: String,
    pub due_date: NaiveDate,
    pub payment_method: Option<String>,
    pub payment_date: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
    pub is_overdue: bool,
}

impl From<Invoice> for InvoiceResponse {
    fn from(invoice: Invoice) -> Self {
        let is_overdue = invoice.is_overdue_on(Utc::now().date_naive());
        Self {
            id: invoice.invoice_id,
            invoice_number: invoice.invoice_number,
            order_id: invoice.order_id,
            customer_name: invoice.customer_name,
            status: invoice.status,
            due_date: invoice.due_date,
            payment_method: invoice.payment_method,
            payment_date: invoice.payment_date,
            created_at: invoice.created_utc,
            is_overdue,
        }
    }
}
