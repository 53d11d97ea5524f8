//! Invoice handlers

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use crate::error::AppResult;
use crate::middleware::TenantUser;
use crate::services::invoice::{Invoice, IssueInvoiceInput};
use crate::services::InvoiceService;
use crate::AppState;

pub async fn issue_invoice(
    State(state): State<AppState>,
    user: TenantUser,
    Json(input): Json<IssueInvoiceInput>,
) -> AppResult<(StatusCode, Json<Invoice>)> {
    let service = InvoiceService::new(state.db, state.events);
    let invoice = service
        .issue_invoice(user.company_id, user.user_id, input)
        .await?;
    Ok((StatusCode::CREATED, Json(invoice)))
}

pub async fn list_invoices(
    State(state): State<AppState>,
    user: TenantUser,
) -> AppResult<Json<Vec<Invoice>>> {
    let service = InvoiceService::new(state.db, state.events);
    let invoices = service.list_invoices(user.company_id).await?;
    Ok(Json(invoices))
}

pub async fn get_invoice(
    State(state): State<AppState>,
    user: TenantUser,
    Path(invoice_id): Path<Uuid>,
) -> AppResult<Json<Invoice>> {
    let service = InvoiceService::new(state.db, state.events);
    let invoice = service.get_invoice(user.company_id, invoice_id).await?;
    Ok(Json(invoice))
}
