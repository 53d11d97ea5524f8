//! Product ledger handlers

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use crate::error::AppResult;
use crate::middleware::TenantUser;
use crate::services::product::{
    CreateProductInput, Product, ProductListing, ProductStats, UpdateProductInput,
};
use crate::services::ProductService;
use crate::AppState;

fn product_service(state: AppState) -> ProductService {
    ProductService::new(state.db, state.events)
}

pub async fn create_product(
    State(state): State<AppState>,
    user: TenantUser,
    Json(input): Json<CreateProductInput>,
) -> AppResult<(StatusCode, Json<Product>)> {
    let product = product_service(state)
        .create_product(user.company_id, user.user_id, input)
        .await?;
    Ok((StatusCode::CREATED, Json(product)))
}

pub async fn list_products(
    State(state): State<AppState>,
    user: TenantUser,
) -> AppResult<Json<Vec<ProductListing>>> {
    let products = product_service(state).list_products(user.company_id).await?;
    Ok(Json(products))
}

pub async fn get_product(
    State(state): State<AppState>,
    user: TenantUser,
    Path(product_id): Path<Uuid>,
) -> AppResult<Json<Product>> {
    let product = product_service(state)
        .get_product(user.company_id, product_id)
        .await?;
    Ok(Json(product))
}

pub async fn update_product(
    State(state): State<AppState>,
    user: TenantUser,
    Path(product_id): Path<Uuid>,
    Json(input): Json<UpdateProductInput>,
) -> AppResult<Json<Product>> {
    let product = product_service(state)
        .update_product(user.company_id, user.user_id, product_id, input)
        .await?;
    Ok(Json(product))
}

pub async fn delete_product(
    State(state): State<AppState>,
    user: TenantUser,
    Path(product_id): Path<Uuid>,
) -> AppResult<StatusCode> {
    product_service(state)
        .delete_product(user.company_id, user.user_id, product_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Product count and total units on hand
pub async fn product_stats(
    State(state): State<AppState>,
    user: TenantUser,
) -> AppResult<Json<ProductStats>> {
    let stats = product_service(state).stats(user.company_id).await?;
    Ok(Json(stats))
}
