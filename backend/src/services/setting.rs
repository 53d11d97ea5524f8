//! Company key/value settings

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;
use validator::Validate;

use crate::error::{AppError, AppResult};

#[derive(Clone)]
pub struct SettingService {
    db: PgPool,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Setting {
    pub id: Uuid,
    pub company_id: Uuid,
    pub key: String,
    pub value: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateSettingInput {
    #[validate(length(min = 1, max = 100, message = "Key is required"))]
    pub key: String,
    pub value: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdateSettingInput {
    pub value: String,
}

impl SettingService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    pub async fn list_settings(&self, company_id: Uuid) -> AppResult<Vec<Setting>> {
        let settings = sqlx::query_as::<_, Setting>(
            "SELECT id, company_id, key, value, created_at, updated_at FROM settings WHERE company_id = $1 ORDER BY key",
        )
        .bind(company_id)
        .fetch_all(&self.db)
        .await?;

        Ok(settings)
    }

    pub async fn get_setting(&self, company_id: Uuid, key: &str) -> AppResult<Setting> {
        sqlx::query_as::<_, Setting>(
            "SELECT id, company_id, key, value, created_at, updated_at FROM settings WHERE company_id = $1 AND key = $2",
        )
        .bind(company_id)
        .bind(key)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Setting {}", key)))
    }

    pub async fn create_setting(
        &self,
        company_id: Uuid,
        input: CreateSettingInput,
    ) -> AppResult<Setting> {
        input.validate()?;

        sqlx::query_as::<_, Setting>(
            r#"
            INSERT INTO settings (company_id, key, value)
            VALUES ($1, $2, $3)
            RETURNING id, company_id, key, value, created_at, updated_at
            "#,
        )
        .bind(company_id)
        .bind(&input.key)
        .bind(&input.value)
        .fetch_one(&self.db)
        .await
        .map_err(|e| AppError::on_unique_violation(e, "setting", "Setting key already exists"))
    }

    pub async fn update_setting(
        &self,
        company_id: Uuid,
        key: &str,
        input: UpdateSettingInput,
    ) -> AppResult<Setting> {
        sqlx::query_as::<_, Setting>(
            r#"
            UPDATE settings
            SET value = $1, updated_at = NOW()
            WHERE company_id = $2 AND key = $3
            RETURNING id, company_id, key, value, created_at, updated_at
            "#,
        )
        .bind(&input.value)
        .bind(company_id)
        .bind(key)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Setting {}", key)))
    }
}
