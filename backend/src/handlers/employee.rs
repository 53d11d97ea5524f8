//! Employee handlers

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use crate::error::AppResult;
use crate::middleware::TenantUser;
use crate::services::employee::{
    CreateEmployeeInput, Employee, EmployeeAttendanceStatus, UpdateEmployeeInput,
};
use crate::services::EmployeeService;
use crate::AppState;

pub async fn create_employee(
    State(state): State<AppState>,
    user: TenantUser,
    Json(input): Json<CreateEmployeeInput>,
) -> AppResult<(StatusCode, Json<Employee>)> {
    let service = EmployeeService::new(state.db);
    let employee = service.create_employee(user.company_id, input).await?;
    Ok((StatusCode::CREATED, Json(employee)))
}

pub async fn list_employees(
    State(state): State<AppState>,
    user: TenantUser,
) -> AppResult<Json<Vec<Employee>>> {
    let service = EmployeeService::new(state.db);
    let employees = service.list_employees(user.company_id).await?;
    Ok(Json(employees))
}

pub async fn get_employee(
    State(state): State<AppState>,
    user: TenantUser,
    Path(employee_id): Path<Uuid>,
) -> AppResult<Json<Employee>> {
    let service = EmployeeService::new(state.db);
    let employee = service.get_employee(user.company_id, employee_id).await?;
    Ok(Json(employee))
}

pub async fn update_employee(
    State(state): State<AppState>,
    user: TenantUser,
    Path(employee_id): Path<Uuid>,
    Json(input): Json<UpdateEmployeeInput>,
) -> AppResult<Json<Employee>> {
    let service = EmployeeService::new(state.db);
    let employee = service
        .update_employee(user.company_id, employee_id, input)
        .await?;
    Ok(Json(employee))
}

pub async fn delete_employee(
    State(state): State<AppState>,
    user: TenantUser,
    Path(employee_id): Path<Uuid>,
) -> AppResult<StatusCode> {
    let service = EmployeeService::new(state.db);
    service.delete_employee(user.company_id, employee_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn active_employees_with_attendance(
    State(state): State<AppState>,
    user: TenantUser,
) -> AppResult<Json<Vec<EmployeeAttendanceStatus>>> {
    let service = EmployeeService::new(state.db);
    let employees = service.active_with_attendance(user.company_id).await?;
    Ok(Json(employees))
}
