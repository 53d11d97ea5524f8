//! Dashboard handler

use axum::{
    extract::{Query, State},
    Json,
};

use crate::error::AppResult;
use crate::middleware::TenantUser;
use crate::services::dashboard::{DashboardQuery, DashboardStats};
use crate::services::DashboardService;
use crate::AppState;

pub async fn dashboard_stats(
    State(state): State<AppState>,
    user: TenantUser,
    Query(query): Query<DashboardQuery>,
) -> AppResult<Json<DashboardStats>> {
    let service = DashboardService::new(state.db);
    let stats = service.stats(user.company_id, query).await?;
    Ok(Json(stats))
}
