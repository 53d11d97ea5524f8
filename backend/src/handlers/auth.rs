//! Authentication handlers

use axum::{extract::State, http::StatusCode, Json};
use serde::{Deserialize, Serialize};

use crate::error::AppResult;
use crate::middleware::CurrentUser;
use crate::services::auth::{
    AssignCompanyInput, AuthTokens, ChangePasswordInput, LoginInput, LoginResponse, RegisterInput,
    UpdateProfileInput, UserProfile,
};
use crate::services::AuthService;
use crate::AppState;

#[derive(Deserialize)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

#[derive(Serialize)]
pub struct MessageResponse {
    pub message: &'static str,
}

fn auth_service(state: &AppState) -> AuthService {
    AuthService::new(
        state.db.clone(),
        state.keys.clone(),
        state.config.jwt.refresh_token_expiry,
    )
}

/// Register endpoint handler
pub async fn register(
    State(state): State<AppState>,
    Json(body): Json<RegisterInput>,
) -> AppResult<(StatusCode, Json<UserProfile>)> {
    let user = auth_service(&state).register(body).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

/// Login endpoint handler
pub async fn login(
    State(state): State<AppState>,
    Json(body): Json<LoginInput>,
) -> AppResult<Json<LoginResponse>> {
    let session = auth_service(&state).login(body).await?;
    Ok(Json(session))
}

/// Refresh token endpoint handler
pub async fn refresh(
    State(state): State<AppState>,
    Json(body): Json<RefreshRequest>,
) -> AppResult<Json<AuthTokens>> {
    let tokens = auth_service(&state)
        .refresh_token(&body.refresh_token)
        .await?;
    Ok(Json(tokens))
}

pub async fn get_profile(
    State(state): State<AppState>,
    current_user: CurrentUser,
) -> AppResult<Json<UserProfile>> {
    let profile = auth_service(&state).profile(current_user.0.user_id).await?;
    Ok(Json(profile))
}

pub async fn update_profile(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(body): Json<UpdateProfileInput>,
) -> AppResult<Json<UserProfile>> {
    let profile = auth_service(&state)
        .update_profile(current_user.0.user_id, body)
        .await?;
    Ok(Json(profile))
}

pub async fn change_password(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(body): Json<ChangePasswordInput>,
) -> AppResult<Json<MessageResponse>> {
    auth_service(&state)
        .change_password(current_user.0.user_id, body)
        .await?;
    Ok(Json(MessageResponse {
        message: "Password changed",
    }))
}

/// Attach the caller to a company; the response carries tokens for it
pub async fn assign_company(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(body): Json<AssignCompanyInput>,
) -> AppResult<Json<LoginResponse>> {
    let session = auth_service(&state)
        .assign_company(current_user.0.user_id, body)
        .await?;
    Ok(Json(session))
}
