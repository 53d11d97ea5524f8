//! Order handlers

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use crate::error::AppResult;
use crate::handlers::sale::DateRangeQuery;
use crate::middleware::TenantUser;
use crate::services::order::{CreateOrderInput, OrderFilter, OrderWithItems, UpdateOrderInput};
use crate::services::OrderService;
use crate::AppState;

fn order_service(state: AppState) -> OrderService {
    OrderService::new(state.db, state.events)
}

pub async fn create_order(
    State(state): State<AppState>,
    user: TenantUser,
    Json(input): Json<CreateOrderInput>,
) -> AppResult<(StatusCode, Json<OrderWithItems>)> {
    let order = order_service(state)
        .create_order(user.company_id, user.user_id, input)
        .await?;
    Ok((StatusCode::CREATED, Json(order)))
}

pub async fn list_orders(
    State(state): State<AppState>,
    user: TenantUser,
    Query(filter): Query<OrderFilter>,
) -> AppResult<Json<Vec<OrderWithItems>>> {
    let orders = order_service(state)
        .list_orders(user.company_id, filter)
        .await?;
    Ok(Json(orders))
}

pub async fn recent_orders(
    State(state): State<AppState>,
    user: TenantUser,
) -> AppResult<Json<Vec<OrderWithItems>>> {
    let orders = order_service(state).recent_orders(user.company_id).await?;
    Ok(Json(orders))
}

pub async fn orders_by_date(
    State(state): State<AppState>,
    user: TenantUser,
    Query(query): Query<DateRangeQuery>,
) -> AppResult<Json<Vec<OrderWithItems>>> {
    let orders = order_service(state)
        .orders_by_date(user.company_id, query.range()?)
        .await?;
    Ok(Json(orders))
}

pub async fn get_order(
    State(state): State<AppState>,
    user: TenantUser,
    Path(order_id): Path<Uuid>,
) -> AppResult<Json<OrderWithItems>> {
    let order = order_service(state)
        .get_order(user.company_id, order_id)
        .await?;
    Ok(Json(order))
}

pub async fn update_order(
    State(state): State<AppState>,
    user: TenantUser,
    Path(order_id): Path<Uuid>,
    Json(input): Json<UpdateOrderInput>,
) -> AppResult<Json<OrderWithItems>> {
    let order = order_service(state)
        .update_order(user.company_id, user.user_id, order_id, input)
        .await?;
    Ok(Json(order))
}

pub async fn start_processing_order(
    State(state): State<AppState>,
    user: TenantUser,
    Path(order_id): Path<Uuid>,
) -> AppResult<Json<OrderWithItems>> {
    let order = order_service(state)
        .start_processing(user.company_id, user.user_id, order_id)
        .await?;
    Ok(Json(order))
}

pub async fn complete_order(
    State(state): State<AppState>,
    user: TenantUser,
    Path(order_id): Path<Uuid>,
) -> AppResult<Json<OrderWithItems>> {
    let order = order_service(state)
        .complete_order(user.company_id, user.user_id, order_id)
        .await?;
    Ok(Json(order))
}

pub async fn cancel_order(
    State(state): State<AppState>,
    user: TenantUser,
    Path(order_id): Path<Uuid>,
) -> AppResult<Json<OrderWithItems>> {
    let order = order_service(state)
        .cancel_order(user.company_id, user.user_id, order_id)
        .await?;
    Ok(Json(order))
}

pub async fn delete_order(
    State(state): State<AppState>,
    user: TenantUser,
    Path(order_id): Path<Uuid>,
) -> AppResult<StatusCode> {
    order_service(state)
        .delete_order(user.company_id, user.user_id, order_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
