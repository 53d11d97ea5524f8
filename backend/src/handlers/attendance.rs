//! Attendance handlers

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use crate::error::AppResult;
use crate::middleware::TenantUser;
use crate::services::attendance::{
    Absences, Attendance, CheckInInput, CheckOutInput, DateQuery, EmployeeMonthReport,
    MonthQuery, ReportQuery, WorkedHours,
};
use crate::services::employee::EmployeeAttendanceStatus;
use crate::services::AttendanceService;
use crate::AppState;

pub async fn check_in(
    State(state): State<AppState>,
    user: TenantUser,
    Json(input): Json<CheckInInput>,
) -> AppResult<(StatusCode, Json<Attendance>)> {
    let service = AttendanceService::new(state.db);
    let attendance = service.check_in(user.company_id, input).await?;
    Ok((StatusCode::CREATED, Json(attendance)))
}

/// Close an open attendance; an empty body checks out now
pub async fn check_out(
    State(state): State<AppState>,
    user: TenantUser,
    Path(attendance_id): Path<Uuid>,
    input: Option<Json<CheckOutInput>>,
) -> AppResult<Json<Attendance>> {
    let input = input
        .map(|Json(input)| input)
        .unwrap_or(CheckOutInput { check_out: None });
    let service = AttendanceService::new(state.db);
    let attendance = service
        .check_out(user.company_id, attendance_id, input)
        .await?;
    Ok(Json(attendance))
}

pub async fn list_attendance(
    State(state): State<AppState>,
    user: TenantUser,
) -> AppResult<Json<Vec<Attendance>>> {
    let service = AttendanceService::new(state.db);
    let records = service.list_attendance(user.company_id).await?;
    Ok(Json(records))
}

pub async fn get_attendance(
    State(state): State<AppState>,
    user: TenantUser,
    Path(attendance_id): Path<Uuid>,
) -> AppResult<Json<Attendance>> {
    let service = AttendanceService::new(state.db);
    let attendance = service
        .get_attendance(user.company_id, attendance_id)
        .await?;
    Ok(Json(attendance))
}

pub async fn delete_attendance(
    State(state): State<AppState>,
    user: TenantUser,
    Path(attendance_id): Path<Uuid>,
) -> AppResult<StatusCode> {
    let service = AttendanceService::new(state.db);
    service
        .delete_attendance(user.company_id, attendance_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn attendance_by_employee(
    State(state): State<AppState>,
    user: TenantUser,
    Path(employee_id): Path<Uuid>,
) -> AppResult<Json<Vec<Attendance>>> {
    let service = AttendanceService::new(state.db);
    let records = service.by_employee(user.company_id, employee_id).await?;
    Ok(Json(records))
}

pub async fn attendance_by_date(
    State(state): State<AppState>,
    user: TenantUser,
    Query(query): Query<DateQuery>,
) -> AppResult<Json<Vec<Attendance>>> {
    let service = AttendanceService::new(state.db);
    let records = service.by_date(user.company_id, query.date).await?;
    Ok(Json(records))
}

pub async fn active_with_status(
    State(state): State<AppState>,
    user: TenantUser,
) -> AppResult<Json<Vec<EmployeeAttendanceStatus>>> {
    let service = AttendanceService::new(state.db);
    let employees = service.active_with_status(user.company_id).await?;
    Ok(Json(employees))
}

pub async fn employee_absences(
    State(state): State<AppState>,
    user: TenantUser,
    Path(employee_id): Path<Uuid>,
    Query(query): Query<MonthQuery>,
) -> AppResult<Json<Absences>> {
    let service = AttendanceService::new(state.db);
    let absences = service
        .absences(user.company_id, employee_id, query)
        .await?;
    Ok(Json(absences))
}

pub async fn employee_worked_hours(
    State(state): State<AppState>,
    user: TenantUser,
    Path(employee_id): Path<Uuid>,
    Query(query): Query<MonthQuery>,
) -> AppResult<Json<WorkedHours>> {
    let service = AttendanceService::new(state.db);
    let hours = service
        .worked_hours(user.company_id, employee_id, query)
        .await?;
    Ok(Json(hours))
}

pub async fn attendance_report(
    State(state): State<AppState>,
    user: TenantUser,
    Query(query): Query<ReportQuery>,
) -> AppResult<Json<Vec<EmployeeMonthReport>>> {
    let service = AttendanceService::new(state.db);
    let report = service.monthly_report(user.company_id, query).await?;
    Ok(Json(report))
}
