//! Payroll handlers

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use crate::error::AppResult;
use crate::middleware::TenantUser;
use crate::services::payroll::{
    CreatePayrollInput, Payroll, PayrollListing, PayrollMonthSummary, PeriodQuery, SummaryQuery,
};
use crate::services::PayrollService;
use crate::AppState;

pub async fn create_payroll(
    State(state): State<AppState>,
    user: TenantUser,
    Json(input): Json<CreatePayrollInput>,
) -> AppResult<(StatusCode, Json<Payroll>)> {
    let service = PayrollService::new(state.db);
    let payroll = service.create_payroll(user.company_id, input).await?;
    Ok((StatusCode::CREATED, Json(payroll)))
}

pub async fn list_payrolls(
    State(state): State<AppState>,
    user: TenantUser,
) -> AppResult<Json<Vec<PayrollListing>>> {
    let service = PayrollService::new(state.db);
    let payrolls = service.list_payrolls(user.company_id).await?;
    Ok(Json(payrolls))
}

pub async fn payrolls_by_month(
    State(state): State<AppState>,
    user: TenantUser,
    Query(query): Query<PeriodQuery>,
) -> AppResult<Json<Vec<PayrollListing>>> {
    let service = PayrollService::new(state.db);
    let payrolls = service.by_month(user.company_id, query).await?;
    Ok(Json(payrolls))
}

pub async fn payrolls_by_employee(
    State(state): State<AppState>,
    user: TenantUser,
    Path(employee_id): Path<Uuid>,
) -> AppResult<Json<Vec<Payroll>>> {
    let service = PayrollService::new(state.db);
    let payrolls = service.by_employee(user.company_id, employee_id).await?;
    Ok(Json(payrolls))
}

pub async fn mark_payroll_paid(
    State(state): State<AppState>,
    user: TenantUser,
    Path(payroll_id): Path<Uuid>,
) -> AppResult<Json<Payroll>> {
    let service = PayrollService::new(state.db);
    let payroll = service.mark_paid(user.company_id, payroll_id).await?;
    Ok(Json(payroll))
}

pub async fn payroll_summary(
    State(state): State<AppState>,
    user: TenantUser,
    Query(query): Query<SummaryQuery>,
) -> AppResult<Json<Vec<PayrollMonthSummary>>> {
    let service = PayrollService::new(state.db);
    let summary = service.summary(user.company_id, query).await?;
    Ok(Json(summary))
}
