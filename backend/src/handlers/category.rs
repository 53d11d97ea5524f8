//! Category handlers

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use crate::error::AppResult;
use crate::middleware::TenantUser;
use crate::services::category::{Category, CategoryInput};
use crate::services::CategoryService;
use crate::AppState;

pub async fn create_category(
    State(state): State<AppState>,
    user: TenantUser,
    Json(input): Json<CategoryInput>,
) -> AppResult<(StatusCode, Json<Category>)> {
    let service = CategoryService::new(state.db);
    let category = service.create_category(user.company_id, input).await?;
    Ok((StatusCode::CREATED, Json(category)))
}

pub async fn list_categories(
    State(state): State<AppState>,
    user: TenantUser,
) -> AppResult<Json<Vec<Category>>> {
    let service = CategoryService::new(state.db);
    let categories = service.list_categories(user.company_id).await?;
    Ok(Json(categories))
}

pub async fn update_category(
    State(state): State<AppState>,
    user: TenantUser,
    Path(category_id): Path<Uuid>,
    Json(input): Json<CategoryInput>,
) -> AppResult<Json<Category>> {
    let service = CategoryService::new(state.db);
    let category = service
        .update_category(user.company_id, category_id, input)
        .await?;
    Ok(Json(category))
}

pub async fn delete_category(
    State(state): State<AppState>,
    user: TenantUser,
    Path(category_id): Path<Uuid>,
) -> AppResult<StatusCode> {
    let service = CategoryService::new(state.db);
    service.delete_category(user.company_id, category_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
