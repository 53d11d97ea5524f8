//! Error handling for the POS back office
//!
//! Every failure leaves the API as `{"error": {"code", "message", "field"?}}`.
//! Storage-engine details are logged but never sent to the caller.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use shared::DomainError;

/// Application error types
#[derive(Error, Debug)]
pub enum AppError {
    // Authentication errors
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Token expired")]
    TokenExpired,

    #[error("Invalid token")]
    InvalidToken,

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Token carries no company")]
    MissingTenant,

    // Validation errors
    #[error("Validation error: {message}")]
    Validation { field: String, message: String },

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Conflict: {message}")]
    Conflict { resource: String, message: String },

    #[error("Resource not found: {0}")]
    NotFound(String),

    // Business logic errors
    #[error("Invalid state transition: {0}")]
    InvalidStateTransition(String),

    #[error("Insufficient stock for {product}: requested {requested}, available {available}")]
    InsufficientStock {
        product: String,
        requested: i32,
        available: i32,
    },

    // Database errors
    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),

    // Internal errors
    #[error("Internal server error: {0}")]
    Internal(String),

    #[error("Internal server error")]
    InternalError(#[from] anyhow::Error),
}

impl AppError {
    pub fn validation(field: &str, message: impl Into<String>) -> Self {
        AppError::Validation {
            field: field.to_string(),
            message: message.into(),
        }
    }

    pub fn conflict(resource: &str, message: impl Into<String>) -> Self {
        AppError::Conflict {
            resource: resource.to_string(),
            message: message.into(),
        }
    }

    /// Turn a unique-constraint violation into a `Conflict`, pass anything else through
    pub fn on_unique_violation(err: sqlx::Error, resource: &str, message: &str) -> Self {
        match &err {
            sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
                AppError::conflict(resource, message)
            }
            _ => AppError::DatabaseError(err),
        }
    }
}

impl From<DomainError> for AppError {
    fn from(err: DomainError) -> Self {
        match err {
            DomainError::InvalidTransition { .. } => {
                AppError::InvalidStateTransition(err.to_string())
            }
            DomainError::InsufficientStock {
                requested,
                available,
            } => AppError::InsufficientStock {
                product: "product".to_string(),
                requested,
                available,
            },
            DomainError::ReturnExceedsSale { .. } => AppError::validation("quantity", err.to_string()),
            DomainError::InvalidInput(msg) => AppError::ValidationError(msg),
        }
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let field_errors = errors.field_errors();
        match field_errors.iter().next() {
            Some((field, errs)) => {
                let message = errs
                    .first()
                    .and_then(|e| e.message.as_ref().map(|m| m.to_string()))
                    .unwrap_or_else(|| format!("Invalid value for {}", field));
                AppError::validation(field, message)
            }
            None => AppError::ValidationError(errors.to_string()),
        }
    }
}

/// Error response structure
#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: ErrorDetail,
}

#[derive(Serialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
}

impl ErrorDetail {
    pub fn new(code: &str, message: impl Into<String>) -> Self {
        Self {
            code: code.to_string(),
            message: message.into(),
            field: None,
        }
    }
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::InvalidCredentials
            | AppError::TokenExpired
            | AppError::InvalidToken
            | AppError::Unauthorized(_)
            | AppError::MissingTenant => StatusCode::UNAUTHORIZED,
            AppError::Validation { .. }
            | AppError::ValidationError(_)
            | AppError::InsufficientStock { .. } => StatusCode::BAD_REQUEST,
            AppError::Conflict { .. } => StatusCode::CONFLICT,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::InvalidStateTransition(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::DatabaseError(_) | AppError::Internal(_) | AppError::InternalError(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn detail(&self) -> ErrorDetail {
        match self {
            AppError::InvalidCredentials => {
                ErrorDetail::new("INVALID_CREDENTIALS", "Invalid email or password")
            }
            AppError::TokenExpired => ErrorDetail::new("TOKEN_EXPIRED", "Token has expired"),
            AppError::InvalidToken => ErrorDetail::new("INVALID_TOKEN", "Invalid token"),
            AppError::Unauthorized(msg) => ErrorDetail::new("UNAUTHORIZED", msg.clone()),
            AppError::MissingTenant => ErrorDetail::new(
                "MISSING_TENANT",
                "The token is not associated with a company",
            ),
            AppError::Validation { field, message } => ErrorDetail {
                code: "VALIDATION_ERROR".to_string(),
                message: message.clone(),
                field: Some(field.clone()),
            },
            AppError::ValidationError(msg) => ErrorDetail::new("VALIDATION_ERROR", msg.clone()),
            AppError::Conflict { resource, message } => ErrorDetail {
                code: "CONFLICT".to_string(),
                message: message.clone(),
                field: Some(resource.clone()),
            },
            AppError::NotFound(resource) => {
                ErrorDetail::new("NOT_FOUND", format!("{} not found", resource))
            }
            AppError::InvalidStateTransition(msg) => {
                ErrorDetail::new("INVALID_STATE_TRANSITION", msg.clone())
            }
            AppError::InsufficientStock { .. } => {
                ErrorDetail::new("INSUFFICIENT_STOCK", self.to_string())
            }
            AppError::DatabaseError(_) | AppError::Internal(_) | AppError::InternalError(_) => {
                ErrorDetail::new("INTERNAL_ERROR", "An internal server error occurred")
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let detail = self.detail();

        if status.is_server_error() {
            tracing::error!(error = ?self, "Request failed");
        } else {
            tracing::debug!(error = %self, "Request rejected");
        }

        (status, Json(ErrorResponse { error: detail })).into_response()
    }
}

/// Result type alias for handlers
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;
    use shared::OrderStatus;

    #[test]
    fn test_status_codes_follow_taxonomy() {
        assert_eq!(AppError::NotFound("Product".into()).status_code(), StatusCode::NOT_FOUND);
        assert_eq!(AppError::ValidationError("x".into()).status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(AppError::conflict("invoice", "dup").status_code(), StatusCode::CONFLICT);
        assert_eq!(AppError::MissingTenant.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            AppError::Internal("boom".into()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_internal_errors_hide_details() {
        let detail = AppError::Internal("relation \"products\" does not exist".into()).detail();
        assert_eq!(detail.code, "INTERNAL_ERROR");
        assert!(!detail.message.contains("products"));
    }

    #[test]
    fn test_domain_errors_map() {
        let err: AppError = DomainError::InsufficientStock { requested: 2, available: 1 }.into();
        assert!(matches!(err, AppError::InsufficientStock { requested: 2, available: 1, .. }));

        let err: AppError = OrderStatus::Pending
            .transition(OrderStatus::Completed)
            .unwrap_err()
            .into();
        assert_eq!(err.status_code(), StatusCode::UNPROCESSABLE_ENTITY);

        let err: AppError = DomainError::ReturnExceedsSale { requested: 3, returnable: 1 }.into();
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
    }
}
