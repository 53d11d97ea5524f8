//! Customer handlers

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use crate::error::AppResult;
use crate::middleware::TenantUser;
use crate::services::customer::{CreateCustomerInput, Customer, UpdateCustomerInput};
use crate::services::CustomerService;
use crate::AppState;

pub async fn create_customer(
    State(state): State<AppState>,
    user: TenantUser,
    Json(input): Json<CreateCustomerInput>,
) -> AppResult<(StatusCode, Json<Customer>)> {
    let service = CustomerService::new(state.db);
    let customer = service.create_customer(user.company_id, input).await?;
    Ok((StatusCode::CREATED, Json(customer)))
}

pub async fn list_customers(
    State(state): State<AppState>,
    user: TenantUser,
) -> AppResult<Json<Vec<Customer>>> {
    let service = CustomerService::new(state.db);
    let customers = service.list_customers(user.company_id).await?;
    Ok(Json(customers))
}

pub async fn get_customer(
    State(state): State<AppState>,
    user: TenantUser,
    Path(customer_id): Path<Uuid>,
) -> AppResult<Json<Customer>> {
    let service = CustomerService::new(state.db);
    let customer = service.get_customer(user.company_id, customer_id).await?;
    Ok(Json(customer))
}

pub async fn update_customer(
    State(state): State<AppState>,
    user: TenantUser,
    Path(customer_id): Path<Uuid>,
    Json(input): Json<UpdateCustomerInput>,
) -> AppResult<Json<Customer>> {
    let service = CustomerService::new(state.db);
    let customer = service
        .update_customer(user.company_id, customer_id, input)
        .await?;
    Ok(Json(customer))
}

pub async fn delete_customer(
    State(state): State<AppState>,
    user: TenantUser,
    Path(customer_id): Path<Uuid>,
) -> AppResult<StatusCode> {
    let service = CustomerService::new(state.db);
    service.delete_customer(user.company_id, customer_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
