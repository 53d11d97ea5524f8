//! Authentication middleware
//!
//! Bearer-token validation and the extractors that hand the caller's
//! identity and company to handlers. Every tenant-owned route takes a
//! [`TenantUser`], so queries are always scoped by the token's company.

use axum::{
    extract::{FromRequestParts, Request},
    http::request::Parts,
    middleware::Next,
    response::{IntoResponse, Response},
};
use axum_extra::headers::{authorization::Bearer, Authorization, HeaderMapExt};
use chrono::{Duration, Utc};
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, DecodingKey, EncodingKey, Header, Validation,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use crate::config::JwtConfig;
use crate::error::AppError;

/// JWT claims structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// User ID
    pub sub: Uuid,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company_id: Option<Uuid>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub employee_id: Option<Uuid>,
    pub exp: i64,
    pub iat: i64,
}

/// Signing and verification keys for access tokens
pub struct TokenKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    access_token_expiry: i64,
}

impl TokenKeys {
    pub fn new(config: &JwtConfig) -> Self {
        Self {
            encoding: EncodingKey::from_secret(config.secret.as_bytes()),
            decoding: DecodingKey::from_secret(config.secret.as_bytes()),
            access_token_expiry: config.access_token_expiry,
        }
    }

    pub fn access_token_expiry(&self) -> i64 {
        self.access_token_expiry
    }

    /// Sign an access token for a user
    pub fn issue(
        &self,
        user_id: Uuid,
        company_id: Option<Uuid>,
        employee_id: Option<Uuid>,
    ) -> Result<String, AppError> {
        let now = Utc::now();
        let claims = Claims {
            sub: user_id,
            company_id,
            employee_id,
            exp: (now + Duration::seconds(self.access_token_expiry)).timestamp(),
            iat: now.timestamp(),
        };

        encode(&Header::default(), &claims, &self.encoding)
            .map_err(|e| AppError::Internal(format!("Token generation failed: {}", e)))
    }

    /// Decode and validate an access token
    pub fn verify(&self, token: &str) -> Result<Claims, AppError> {
        decode::<Claims>(token, &self.decoding, &Validation::default())
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => AppError::TokenExpired,
                _ => AppError::InvalidToken,
            })
    }
}

/// Authenticated caller extracted from the access token
#[derive(Clone, Debug)]
pub struct AuthUser {
    pub user_id: Uuid,
    pub company_id: Option<Uuid>,
    pub employee_id: Option<Uuid>,
}

impl From<Claims> for AuthUser {
    fn from(claims: Claims) -> Self {
        Self {
            user_id: claims.sub,
            company_id: claims.company_id,
            employee_id: claims.employee_id,
        }
    }
}

/// Validates the bearer token and stores the [`AuthUser`] in request extensions.
///
/// The [`TokenKeys`] are read from request extensions; `create_app` installs them.
pub async fn auth_middleware(mut request: Request, next: Next) -> Response {
    let Some(keys) = request.extensions().get::<Arc<TokenKeys>>().cloned() else {
        return AppError::Internal("Token keys are not configured".to_string()).into_response();
    };

    let Some(bearer) = request.headers().typed_get::<Authorization<Bearer>>() else {
        return AppError::Unauthorized("Missing or invalid Authorization header".to_string())
            .into_response();
    };

    let claims = match keys.verify(bearer.token()) {
        Ok(claims) => claims,
        Err(err) => return err.into_response(),
    };

    request.extensions_mut().insert(AuthUser::from(claims));

    next.run(request).await
}

/// Extractor for the authenticated user, with or without a company
#[derive(Clone, Debug)]
pub struct CurrentUser(pub AuthUser);

#[axum::async_trait]
impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthUser>()
            .cloned()
            .map(CurrentUser)
            .ok_or_else(|| AppError::Unauthorized("Authentication required".to_string()))
    }
}

/// Extractor for an authenticated user bound to a company
#[derive(Clone, Copy, Debug)]
pub struct TenantUser {
    pub user_id: Uuid,
    pub company_id: Uuid,
    pub employee_id: Option<Uuid>,
}

impl TryFrom<AuthUser> for TenantUser {
    type Error = AppError;

    fn try_from(user: AuthUser) -> Result<Self, Self::Error> {
        let company_id = user.company_id.ok_or(AppError::MissingTenant)?;
        Ok(Self {
            user_id: user.user_id,
            company_id,
            employee_id: user.employee_id,
        })
    }
}

#[axum::async_trait]
impl<S> FromRequestParts<S> for TenantUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let CurrentUser(user) = CurrentUser::from_request_parts(parts, state).await?;
        TenantUser::try_from(user)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keys(expiry: i64) -> TokenKeys {
        TokenKeys::new(&JwtConfig {
            secret: "test-secret".to_string(),
            access_token_expiry: expiry,
            refresh_token_expiry: 3600,
        })
    }

    #[test]
    fn test_token_round_trip_carries_tenant() {
        let keys = keys(3600);
        let user = Uuid::new_v4();
        let company = Uuid::new_v4();
        let token = keys.issue(user, Some(company), None).unwrap();

        let claims = keys.verify(&token).unwrap();
        assert_eq!(claims.sub, user);
        assert_eq!(claims.company_id, Some(company));
        assert_eq!(claims.employee_id, None);
    }

    #[test]
    fn test_expired_token_is_rejected() {
        let keys = keys(-3600);
        let token = keys.issue(Uuid::new_v4(), None, None).unwrap();
        assert!(matches!(keys.verify(&token), Err(AppError::TokenExpired)));
    }

    #[test]
    fn test_foreign_signature_is_rejected() {
        let token = keys(3600).issue(Uuid::new_v4(), None, None).unwrap();
        let other = TokenKeys::new(&JwtConfig {
            secret: "another-secret".to_string(),
            access_token_expiry: 3600,
            refresh_token_expiry: 3600,
        });
        assert!(matches!(other.verify(&token), Err(AppError::InvalidToken)));
    }

    #[test]
    fn test_tenant_user_requires_company() {
        let without = AuthUser { user_id: Uuid::new_v4(), company_id: None, employee_id: None };
        assert!(matches!(TenantUser::try_from(without), Err(AppError::MissingTenant)));

        let company = Uuid::new_v4();
        let with = AuthUser { user_id: Uuid::new_v4(), company_id: Some(company), employee_id: None };
        assert_eq!(TenantUser::try_from(with).unwrap().company_id, company);
    }
}
