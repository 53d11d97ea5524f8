//! Notification and stock-check handlers

use axum::{
    extract::{Path, State},
    Json,
};
use uuid::Uuid;

use crate::error::AppResult;
use crate::middleware::TenantUser;
use crate::services::notification::{Notification, UnreadCount};
use crate::services::stock_monitor::StockCheck;
use crate::services::{NotificationService, StockMonitor};
use crate::AppState;
use shared::ReadReceipt;

pub async fn pending_notifications(
    State(state): State<AppState>,
    user: TenantUser,
) -> AppResult<Json<Vec<Notification>>> {
    let service = NotificationService::new(state.db, state.events);
    let notifications = service.pending(user.company_id, user.user_id).await?;
    Ok(Json(notifications))
}

pub async fn unread_count(
    State(state): State<AppState>,
    user: TenantUser,
) -> AppResult<Json<UnreadCount>> {
    let service = NotificationService::new(state.db, state.events);
    let count = service.unread_count(user.company_id, user.user_id).await?;
    Ok(Json(UnreadCount { count }))
}

pub async fn mark_notification_read(
    State(state): State<AppState>,
    user: TenantUser,
    Path(notification_id): Path<Uuid>,
) -> AppResult<Json<ReadReceipt>> {
    let service = NotificationService::new(state.db, state.events);
    let receipt = service
        .mark_read(user.company_id, user.user_id, notification_id)
        .await?;
    Ok(Json(receipt))
}

pub async fn mark_all_notifications_read(
    State(state): State<AppState>,
    user: TenantUser,
) -> AppResult<Json<ReadReceipt>> {
    let service = NotificationService::new(state.db, state.events);
    let receipt = service.mark_all_read(user.company_id, user.user_id).await?;
    Ok(Json(receipt))
}

/// Run the low-stock check for one product right away
pub async fn check_stock(
    State(state): State<AppState>,
    user: TenantUser,
    Path(product_id): Path<Uuid>,
) -> AppResult<Json<StockCheck>> {
    let monitor = StockMonitor::new(state.db, state.events);
    let check = monitor
        .check_product(user.company_id, product_id, Some(user.user_id))
        .await?;
    Ok(Json(check))
}
