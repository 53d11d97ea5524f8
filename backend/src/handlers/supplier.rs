//! Supplier handlers

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use crate::error::AppResult;
use crate::middleware::TenantUser;
use crate::services::supplier::{CreateSupplierInput, Supplier, UpdateSupplierInput};
use crate::services::SupplierService;
use crate::AppState;

pub async fn create_supplier(
    State(state): State<AppState>,
    user: TenantUser,
    Json(input): Json<CreateSupplierInput>,
) -> AppResult<(StatusCode, Json<Supplier>)> {
    let service = SupplierService::new(state.db);
    let supplier = service.create_supplier(user.company_id, input).await?;
    Ok((StatusCode::CREATED, Json(supplier)))
}

pub async fn list_suppliers(
    State(state): State<AppState>,
    user: TenantUser,
) -> AppResult<Json<Vec<Supplier>>> {
    let service = SupplierService::new(state.db);
    let suppliers = service.list_suppliers(user.company_id).await?;
    Ok(Json(suppliers))
}

pub async fn get_supplier(
    State(state): State<AppState>,
    user: TenantUser,
    Path(supplier_id): Path<Uuid>,
) -> AppResult<Json<Supplier>> {
    let service = SupplierService::new(state.db);
    let supplier = service.get_supplier(user.company_id, supplier_id).await?;
    Ok(Json(supplier))
}

pub async fn update_supplier(
    State(state): State<AppState>,
    user: TenantUser,
    Path(supplier_id): Path<Uuid>,
    Json(input): Json<UpdateSupplierInput>,
) -> AppResult<Json<Supplier>> {
    let service = SupplierService::new(state.db);
    let supplier = service
        .update_supplier(user.company_id, supplier_id, input)
        .await?;
    Ok(Json(supplier))
}

pub async fn delete_supplier(
    State(state): State<AppState>,
    user: TenantUser,
    Path(supplier_id): Path<Uuid>,
) -> AppResult<StatusCode> {
    let service = SupplierService::new(state.db);
    service.delete_supplier(user.company_id, supplier_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
