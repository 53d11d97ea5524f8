//! Movement (audit trail) handlers

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use crate::error::AppResult;
use crate::middleware::TenantUser;
use crate::services::movement::{CreateMovementInput, Movement, MovementFilter};
use crate::services::MovementService;
use crate::AppState;

pub async fn create_movement(
    State(state): State<AppState>,
    user: TenantUser,
    Json(input): Json<CreateMovementInput>,
) -> AppResult<(StatusCode, Json<Movement>)> {
    let service = MovementService::new(state.db);
    let movement = service
        .create_movement(user.company_id, Some(user.user_id), input)
        .await?;
    Ok((StatusCode::CREATED, Json(movement)))
}

pub async fn list_movements(
    State(state): State<AppState>,
    user: TenantUser,
    Query(filter): Query<MovementFilter>,
) -> AppResult<Json<Vec<Movement>>> {
    let service = MovementService::new(state.db);
    let movements = service.list_for_entity(user.company_id, filter).await?;
    Ok(Json(movements))
}

pub async fn recent_movements(
    State(state): State<AppState>,
    user: TenantUser,
) -> AppResult<Json<Vec<Movement>>> {
    let service = MovementService::new(state.db);
    let movements = service.recent_movements(user.company_id).await?;
    Ok(Json(movements))
}

pub async fn delete_movement(
    State(state): State<AppState>,
    user: TenantUser,
    Path(movement_id): Path<Uuid>,
) -> AppResult<StatusCode> {
    let service = MovementService::new(state.db);
    service.delete_movement(user.company_id, movement_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
