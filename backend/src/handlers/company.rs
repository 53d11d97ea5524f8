//! Company (tenant) handlers

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::middleware::{CurrentUser, TenantUser};
use crate::services::company::{Company, CreateCompanyInput, UpdateCompanyInput};
use crate::services::{CompanyService, UserService};
use crate::services::auth::UserProfile;
use crate::AppState;

/// Only the caller's own company is reachable by id
fn own_company(user: &TenantUser, company_id: Uuid) -> AppResult<Uuid> {
    if user.company_id == company_id {
        Ok(company_id)
    } else {
        Err(AppError::NotFound("Company".to_string()))
    }
}

pub async fn create_company(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Json(input): Json<CreateCompanyInput>,
) -> AppResult<(StatusCode, Json<Company>)> {
    let service = CompanyService::new(state.db);
    let company = service
        .create_company(&state.config.inventory, input)
        .await?;
    Ok((StatusCode::CREATED, Json(company)))
}

pub async fn list_companies(
    State(state): State<AppState>,
    current_user: CurrentUser,
) -> AppResult<Json<Vec<Company>>> {
    let service = CompanyService::new(state.db);
    let companies = service.list_companies(current_user.0.company_id).await?;
    Ok(Json(companies))
}

pub async fn get_company(
    State(state): State<AppState>,
    user: TenantUser,
    Path(company_id): Path<Uuid>,
) -> AppResult<Json<Company>> {
    let service = CompanyService::new(state.db);
    let company = service.get_company(own_company(&user, company_id)?).await?;
    Ok(Json(company))
}

pub async fn update_company(
    State(state): State<AppState>,
    user: TenantUser,
    Path(company_id): Path<Uuid>,
    Json(input): Json<UpdateCompanyInput>,
) -> AppResult<Json<Company>> {
    let service = CompanyService::new(state.db);
    let company = service
        .update_company(own_company(&user, company_id)?, input)
        .await?;
    Ok(Json(company))
}

pub async fn delete_company(
    State(state): State<AppState>,
    user: TenantUser,
    Path(company_id): Path<Uuid>,
) -> AppResult<StatusCode> {
    let service = CompanyService::new(state.db);
    service.delete_company(own_company(&user, company_id)?).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Users of the caller's company
pub async fn list_users(
    State(state): State<AppState>,
    user: TenantUser,
) -> AppResult<Json<Vec<UserProfile>>> {
    let service = UserService::new(state.db);
    let users = service.list_users(user.company_id).await?;
    Ok(Json(users))
}
