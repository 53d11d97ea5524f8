//! Authentication service: accounts, login and token management

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use bcrypt::{hash, verify, DEFAULT_COST};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;
use validator::Validate;

use crate::error::{AppError, AppResult};
use crate::middleware::TokenKeys;
use shared::{validate_password, validate_strong_password, UserRole};

const USER_COLUMNS: &str =
    "id, company_id, email, name, role, is_active, last_login_at, created_at, updated_at";

/// Authentication service
#[derive(Clone)]
pub struct AuthService {
    db: PgPool,
    keys: std::sync::Arc<TokenKeys>,
    refresh_token_expiry: i64,
}

/// Public view of a user account
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct UserProfile {
    pub id: Uuid,
    pub company_id: Option<Uuid>,
    pub email: String,
    pub name: String,
    pub role: UserRole,
    pub is_active: bool,
    pub last_login_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, FromRow)]
struct Credentials {
    id: Uuid,
    company_id: Option<Uuid>,
    password_hash: String,
    is_active: bool,
}

#[derive(Debug, Deserialize, Validate)]
pub struct RegisterInput {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,
    pub password: String,
    #[validate(length(min = 1, message = "Name is required"))]
    pub name: String,
    pub role: Option<UserRole>,
    pub company_id: Option<Uuid>,
}

#[derive(Debug, Deserialize)]
pub struct LoginInput {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateProfileInput {
    #[validate(length(min = 1, message = "Name cannot be empty"))]
    pub name: Option<String>,
    #[validate(email(message = "Invalid email format"))]
    pub email: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ChangePasswordInput {
    pub old_password: String,
    pub new_password: String,
    pub confirm_password: String,
}

#[derive(Debug, Deserialize)]
pub struct AssignCompanyInput {
    pub company_id: Uuid,
}

/// Authentication tokens
#[derive(Debug, Serialize)]
pub struct AuthTokens {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: String,
    pub expires_in: i64,
}

/// Successful login: tokens plus the account, with its linked employee
#[derive(Debug, Serialize)]
pub struct LoginResponse {
    #[serde(flatten)]
    pub tokens: AuthTokens,
    pub user: SessionUser,
}

#[derive(Debug, Serialize)]
pub struct SessionUser {
    #[serde(flatten)]
    pub profile: UserProfile,
    pub employee_id: Option<Uuid>,
}

/// Hash a refresh token for storage
fn hash_token(token: &str) -> String {
    URL_SAFE_NO_PAD.encode(Sha256::digest(token.as_bytes()))
}

fn check_password_change(input: &ChangePasswordInput) -> AppResult<()> {
    validate_strong_password(&input.new_password)
        .map_err(|m| AppError::validation("new_password", m))?;
    if input.new_password != input.confirm_password {
        return Err(AppError::validation(
            "confirm_password",
            "Password confirmation does not match",
        ));
    }
    Ok(())
}

impl AuthService {
    pub fn new(db: PgPool, keys: std::sync::Arc<TokenKeys>, refresh_token_expiry: i64) -> Self {
        Self {
            db,
            keys,
            refresh_token_expiry,
        }
    }

    /// Create a user account
    pub async fn register(&self, input: RegisterInput) -> AppResult<UserProfile> {
        input.validate()?;
        validate_password(&input.password).map_err(|m| AppError::validation("password", m))?;

        if let Some(company_id) = input.company_id {
            self.ensure_company(company_id).await?;
        }

        let password_hash = hash(&input.password, DEFAULT_COST)
            .map_err(|e| AppError::Internal(format!("Password hashing failed: {}", e)))?;

        let user = sqlx::query_as::<_, UserProfile>(&format!(
            r#"
            INSERT INTO users (company_id, email, password_hash, name, role)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {}
            "#,
            USER_COLUMNS
        ))
        .bind(input.company_id)
        .bind(input.email.trim().to_lowercase())
        .bind(&password_hash)
        .bind(&input.name)
        .bind(input.role.unwrap_or_default())
        .fetch_one(&self.db)
        .await
        .map_err(|e| AppError::on_unique_violation(e, "user", "Email is already registered"))?;

        tracing::info!(user_id = %user.id, "User registered");
        Ok(user)
    }

    /// Authenticate with email and password
    pub async fn login(&self, input: LoginInput) -> AppResult<LoginResponse> {
        let credentials = sqlx::query_as::<_, Credentials>(
            "SELECT id, company_id, password_hash, is_active FROM users WHERE email = $1",
        )
        .bind(input.email.trim().to_lowercase())
        .fetch_optional(&self.db)
        .await?
        .ok_or(AppError::InvalidCredentials)?;

        if !credentials.is_active {
            return Err(AppError::Unauthorized("Account is disabled".to_string()));
        }

        let valid = verify(&input.password, &credentials.password_hash)
            .map_err(|e| AppError::Internal(format!("Password verification failed: {}", e)))?;
        if !valid {
            return Err(AppError::InvalidCredentials);
        }

        sqlx::query("UPDATE users SET last_login_at = NOW() WHERE id = $1")
            .bind(credentials.id)
            .execute(&self.db)
            .await?;

        let employee_id = self.linked_employee(credentials.id).await?;
        let tokens = self
            .generate_tokens(credentials.id, credentials.company_id, employee_id)
            .await?;
        let profile = self.profile(credentials.id).await?;

        tracing::info!(user_id = %credentials.id, "User logged in");

        Ok(LoginResponse {
            tokens,
            user: SessionUser {
                profile,
                employee_id,
            },
        })
    }

    /// Swap a refresh token for a new token pair. The old one is revoked.
    pub async fn refresh_token(&self, refresh_token: &str) -> AppResult<AuthTokens> {
        let token_hash = hash_token(refresh_token);

        let (user_id, company_id) = sqlx::query_as::<_, (Uuid, Option<Uuid>)>(
            r#"
            UPDATE refresh_tokens rt
            SET revoked_at = NOW()
            FROM users u
            WHERE rt.token_hash = $1
              AND u.id = rt.user_id
              AND rt.expires_at > NOW()
              AND rt.revoked_at IS NULL
              AND u.is_active
            RETURNING u.id, u.company_id
            "#,
        )
        .bind(&token_hash)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::Unauthorized("Invalid or expired refresh token".to_string()))?;

        let employee_id = self.linked_employee(user_id).await?;
        self.generate_tokens(user_id, company_id, employee_id).await
    }

    pub async fn profile(&self, user_id: Uuid) -> AppResult<UserProfile> {
        sqlx::query_as::<_, UserProfile>(&format!(
            "SELECT {} FROM users WHERE id = $1",
            USER_COLUMNS
        ))
        .bind(user_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("User".to_string()))
    }

    pub async fn update_profile(
        &self,
        user_id: Uuid,
        input: UpdateProfileInput,
    ) -> AppResult<UserProfile> {
        input.validate()?;
        let email = input.email.map(|e| e.trim().to_lowercase());

        sqlx::query_as::<_, UserProfile>(&format!(
            r#"
            UPDATE users
            SET name = COALESCE($1, name),
                email = COALESCE($2, email),
                updated_at = NOW()
            WHERE id = $3
            RETURNING {}
            "#,
            USER_COLUMNS
        ))
        .bind(&input.name)
        .bind(&email)
        .bind(user_id)
        .fetch_optional(&self.db)
        .await
        .map_err(|e| AppError::on_unique_violation(e, "user", "Email is already in use"))?
        .ok_or_else(|| AppError::NotFound("User".to_string()))
    }

    pub async fn change_password(&self, user_id: Uuid, input: ChangePasswordInput) -> AppResult<()> {
        check_password_change(&input)?;

        let current_hash =
            sqlx::query_scalar::<_, String>("SELECT password_hash FROM users WHERE id = $1")
                .bind(user_id)
                .fetch_optional(&self.db)
                .await?
                .ok_or_else(|| AppError::NotFound("User".to_string()))?;

        let valid = verify(&input.old_password, &current_hash)
            .map_err(|e| AppError::Internal(format!("Password verification failed: {}", e)))?;
        if !valid {
            return Err(AppError::validation("old_password", "Current password is incorrect"));
        }

        let new_hash = hash(&input.new_password, DEFAULT_COST)
            .map_err(|e| AppError::Internal(format!("Password hashing failed: {}", e)))?;

        sqlx::query("UPDATE users SET password_hash = $1, updated_at = NOW() WHERE id = $2")
            .bind(&new_hash)
            .bind(user_id)
            .execute(&self.db)
            .await?;

        // Outstanding sessions end with the old password
        sqlx::query("UPDATE refresh_tokens SET revoked_at = NOW() WHERE user_id = $1 AND revoked_at IS NULL")
            .bind(user_id)
            .execute(&self.db)
            .await?;

        tracing::info!(%user_id, "Password changed");
        Ok(())
    }

    /// Attach the user to a company and hand out tokens carrying it
    pub async fn assign_company(
        &self,
        user_id: Uuid,
        input: AssignCompanyInput,
    ) -> AppResult<LoginResponse> {
        self.ensure_company(input.company_id).await?;

        let profile = sqlx::query_as::<_, UserProfile>(&format!(
            "UPDATE users SET company_id = $1, updated_at = NOW() WHERE id = $2 RETURNING {}",
            USER_COLUMNS
        ))
        .bind(input.company_id)
        .bind(user_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("User".to_string()))?;

        let employee_id = self.linked_employee(user_id).await?;
        let tokens = self
            .generate_tokens(user_id, profile.company_id, employee_id)
            .await?;

        Ok(LoginResponse {
            tokens,
            user: SessionUser {
                profile,
                employee_id,
            },
        })
    }

    async fn ensure_company(&self, company_id: Uuid) -> AppResult<()> {
        let exists =
            sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM companies WHERE id = $1)")
                .bind(company_id)
                .fetch_one(&self.db)
                .await?;
        if !exists {
            return Err(AppError::NotFound("Company".to_string()));
        }
        Ok(())
    }

    async fn linked_employee(&self, user_id: Uuid) -> AppResult<Option<Uuid>> {
        let employee_id =
            sqlx::query_scalar::<_, Uuid>("SELECT id FROM employees WHERE user_id = $1")
                .bind(user_id)
                .fetch_optional(&self.db)
                .await?;
        Ok(employee_id)
    }

    async fn generate_tokens(
        &self,
        user_id: Uuid,
        company_id: Option<Uuid>,
        employee_id: Option<Uuid>,
    ) -> AppResult<AuthTokens> {
        let access_token = self.keys.issue(user_id, company_id, employee_id)?;
        let refresh_token = Uuid::new_v4().to_string();

        let expires_at = Utc::now() + Duration::seconds(self.refresh_token_expiry);
        sqlx::query(
            "INSERT INTO refresh_tokens (user_id, token_hash, expires_at) VALUES ($1, $2, $3)",
        )
        .bind(user_id)
        .bind(hash_token(&refresh_token))
        .bind(expires_at)
        .execute(&self.db)
        .await?;

        Ok(AuthTokens {
            access_token,
            refresh_token,
            token_type: "Bearer".to_string(),
            expires_in: self.keys.access_token_expiry(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn change(new: &str, confirm: &str) -> ChangePasswordInput {
        ChangePasswordInput {
            old_password: "old-secret".to_string(),
            new_password: new.to_string(),
            confirm_password: confirm.to_string(),
        }
    }

    #[test]
    fn test_token_hash_is_stable_and_opaque() {
        let token = "4c3a7f0e-1d2b-4e5f-8a9b-0c1d2e3f4a5b";
        assert_eq!(hash_token(token), hash_token(token));
        assert_ne!(hash_token(token), token);
        assert_ne!(hash_token(token), hash_token("other"));
        // 32 bytes, base64 without padding
        assert_eq!(hash_token(token).len(), 43);
    }

    #[test]
    fn test_password_change_rules() {
        assert!(check_password_change(&change("Secret1", "Secret1")).is_ok());
        assert!(check_password_change(&change("secret1", "secret1")).is_err());
        assert!(check_password_change(&change("Secret1", "Secret2")).is_err());
        assert!(check_password_change(&change("Se1", "Se1")).is_err());
    }

    #[test]
    fn test_register_input_validation() {
        let input = RegisterInput {
            email: "not-an-email".to_string(),
            password: "secret".to_string(),
            name: "Ana".to_string(),
            role: None,
            company_id: None,
        };
        assert!(input.validate().is_err());
    }
}
