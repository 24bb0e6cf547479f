//! Invoice handlers. Visibility always flows through the owning order.

use axum::{
    Json,
    extract::{Path, State},
};
use platform_core::error::AppError;
use platform_core::middleware::identity::Identity;
use uuid::Uuid;

use crate::{
    AppState,
    dtos::invoices::{InvoiceResponse, UpdateInvoiceStatusRequest},
    models::InvoiceStatus,
    services::metrics::record_invoice_transition,
};

/// List invoices: admins see every invoice, everyone else the ones raised
/// against their own orders.
pub async fn list_invoices(
    State(state): State<AppState>,
    identity: Identity,
) -> Result<Json<Vec<InvoiceResponse>>, AppError> {
    let scope_user = if identity.is_admin() {
        None
    } else {
        Some(identity.user_id)
    };

    let invoices = state.db.list_invoices(scope_user).await?;
    Ok(Json(
        invoices.into_iter().map(InvoiceResponse::from).collect(),
    ))
}

/// Unpaid invoices past their due date.
pub async fn overdue_invoices(
    State(state): State<AppState>,
    identity: Identity,
) -> Result<Json<Vec<InvoiceResponse>>, AppError> {
    let scope_user = if identity.is_admin() {
        None
    } else {
        Some(identity.user_id)
    };

    let invoices = state.db.list_overdue_invoices(scope_user).await?;
    Ok(Json(
        invoices.into_iter().map(InvoiceResponse::from).collect(),
    ))
}

/// One invoice.
pub async fn get_invoice(
    State(state): State<AppState>,
    identity: Identity,
    Path(invoice_id): Path<Uuid>,
) -> Result<Json<InvoiceResponse>, AppError> {
    let scope_user = if identity.is_admin() {
        None
    } else {
        Some(identity.user_id)
    };

    let invoice = state
        .db
        .get_invoice(invoice_id, scope_user)
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Invoice not found")))?;

    Ok(Json(InvoiceResponse::from(invoice)))
}

/// Transition an invoice's status. Marking it paid stamps the payment date
/// and method.
pub async fn update_invoice_status(
    State(state): State<AppState>,
    identity: Identity,
    Path(invoice_id): Path<Uuid>,
    Json(payload): Json<UpdateInvoiceStatusRequest>,
) -> Result<Json<InvoiceResponse>, AppError> {
    let status = payload
        .status
        .as_deref()
        .ok_or_else(|| AppError::BadRequest(anyhow::anyhow!("Status not provided")))?;

    let new_status = InvoiceStatus::parse(status).ok_or_else(|| {
        AppError::BadRequest(anyhow::anyhow!(
            "Invalid status. Valid values are: {}",
            InvoiceStatus::valid_values()
        ))
    })?;

    let scope_user = if identity.is_admin() {
        None
    } else {
        Some(identity.user_id)
    };

    let invoice = state
        .db
        .update_invoice_status(
            invoice_id,
            scope_user,
            new_status,
            payload.payment_method.as_deref(),
        )
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Invoice not found")))?;

    record_invoice_transition(new_status.as_str());

    Ok(Json(InvoiceResponse::from(invoice)))
}
