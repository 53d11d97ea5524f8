//! Vacation handlers

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use crate::error::AppResult;
use crate::middleware::TenantUser;
use crate::services::vacation::{Vacation, VacationRequestInput};
use crate::services::VacationService;
use crate::AppState;

pub async fn request_vacation(
    State(state): State<AppState>,
    user: TenantUser,
    Json(input): Json<VacationRequestInput>,
) -> AppResult<(StatusCode, Json<Vacation>)> {
    let service = VacationService::new(state.db);
    let vacation = service.request_vacation(user.company_id, input).await?;
    Ok((StatusCode::CREATED, Json(vacation)))
}

pub async fn list_vacations(
    State(state): State<AppState>,
    user: TenantUser,
) -> AppResult<Json<Vec<Vacation>>> {
    let service = VacationService::new(state.db);
    let vacations = service.list_vacations(user.company_id).await?;
    Ok(Json(vacations))
}

pub async fn vacations_by_employee(
    State(state): State<AppState>,
    user: TenantUser,
    Path(employee_id): Path<Uuid>,
) -> AppResult<Json<Vec<Vacation>>> {
    let service = VacationService::new(state.db);
    let vacations = service.by_employee(user.company_id, employee_id).await?;
    Ok(Json(vacations))
}

pub async fn approve_vacation(
    State(state): State<AppState>,
    user: TenantUser,
    Path(vacation_id): Path<Uuid>,
) -> AppResult<Json<Vacation>> {
    let service = VacationService::new(state.db);
    let vacation = service
        .approve(user.company_id, user.user_id, vacation_id)
        .await?;
    Ok(Json(vacation))
}

pub async fn reject_vacation(
    State(state): State<AppState>,
    user: TenantUser,
    Path(vacation_id): Path<Uuid>,
) -> AppResult<Json<Vacation>> {
    let service = VacationService::new(state.db);
    let vacation = service
        .reject(user.company_id, user.user_id, vacation_id)
        .await?;
    Ok(Json(vacation))
}
