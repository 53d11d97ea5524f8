//! Product return handlers

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use crate::error::AppResult;
use crate::middleware::TenantUser;
use crate::services::returns::{CreateReturnInput, ProductReturn};
use crate::services::ReturnService;
use crate::AppState;

pub async fn create_return(
    State(state): State<AppState>,
    user: TenantUser,
    Json(input): Json<CreateReturnInput>,
) -> AppResult<(StatusCode, Json<ProductReturn>)> {
    let service = ReturnService::new(state.db, state.events);
    let product_return = service
        .create_return(user.company_id, user.user_id, input)
        .await?;
    Ok((StatusCode::CREATED, Json(product_return)))
}

pub async fn list_returns(
    State(state): State<AppState>,
    user: TenantUser,
) -> AppResult<Json<Vec<ProductReturn>>> {
    let service = ReturnService::new(state.db, state.events);
    let returns = service.list_returns(user.company_id).await?;
    Ok(Json(returns))
}

pub async fn get_return(
    State(state): State<AppState>,
    user: TenantUser,
    Path(return_id): Path<Uuid>,
) -> AppResult<Json<ProductReturn>> {
    let service = ReturnService::new(state.db, state.events);
    let product_return = service.get_return(user.company_id, return_id).await?;
    Ok(Json(product_return))
}

pub async fn delete_return(
    State(state): State<AppState>,
    user: TenantUser,
    Path(return_id): Path<Uuid>,
) -> AppResult<StatusCode> {
    let service = ReturnService::new(state.db, state.events);
    service
        .delete_return(user.company_id, user.user_id, return_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
