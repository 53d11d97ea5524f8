//! Company settings handlers

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};

use crate::error::AppResult;
use crate::middleware::TenantUser;
use crate::services::setting::{CreateSettingInput, Setting, UpdateSettingInput};
use crate::services::SettingService;
use crate::AppState;

pub async fn list_settings(
    State(state): State<AppState>,
    user: TenantUser,
) -> AppResult<Json<Vec<Setting>>> {
    let service = SettingService::new(state.db);
    let settings = service.list_settings(user.company_id).await?;
    Ok(Json(settings))
}

pub async fn get_setting(
    State(state): State<AppState>,
    user: TenantUser,
    Path(key): Path<String>,
) -> AppResult<Json<Setting>> {
    let service = SettingService::new(state.db);
    let setting = service.get_setting(user.company_id, &key).await?;
    Ok(Json(setting))
}

pub async fn create_setting(
    State(state): State<AppState>,
    user: TenantUser,
    Json(input): Json<CreateSettingInput>,
) -> AppResult<(StatusCode, Json<Setting>)> {
    let service = SettingService::new(state.db);
    let setting = service.create_setting(user.company_id, input).await?;
    Ok((StatusCode::CREATED, Json(setting)))
}

pub async fn update_setting(
    State(state): State<AppState>,
    user: TenantUser,
    Path(key): Path<String>,
    Json(input): Json<UpdateSettingInput>,
) -> AppResult<Json<Setting>> {
    let service = SettingService::new(state.db);
    let setting = service.update_setting(user.company_id, &key, input).await?;
    Ok(Json(setting))
}
