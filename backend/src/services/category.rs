//! Product categories

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;
use validator::Validate;

use crate::error::{AppError, AppResult};

#[derive(Clone)]
pub struct CategoryService {
    db: PgPool,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Category {
    pub id: Uuid,
    pub company_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CategoryInput {
    #[validate(length(min = 1, max = 255, message = "Name is required"))]
    pub name: String,
    pub description: Option<String>,
}

impl CategoryService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    pub async fn create_category(&self, company_id: Uuid, input: CategoryInput) -> AppResult<Category> {
        input.validate()?;

        let category = sqlx::query_as::<_, Category>(
            r#"
            INSERT INTO categories (company_id, name, description)
            VALUES ($1, $2, $3)
            RETURNING id, company_id, name, description, created_at, updated_at
            "#,
        )
        .bind(company_id)
        .bind(&input.name)
        .bind(&input.description)
        .fetch_one(&self.db)
        .await?;

        Ok(category)
    }

    /// Newest first
    pub async fn list_categories(&self, company_id: Uuid) -> AppResult<Vec<Category>> {
        let categories = sqlx::query_as::<_, Category>(
            r#"
            SELECT id, company_id, name, description, created_at, updated_at
            FROM categories
            WHERE company_id = $1
            ORDER BY created_at DESC
            "#,
        )
        .bind(company_id)
        .fetch_all(&self.db)
        .await?;

        Ok(categories)
    }

    pub async fn update_category(
        &self,
        company_id: Uuid,
        category_id: Uuid,
        input: CategoryInput,
    ) -> AppResult<Category> {
        input.validate()?;

        sqlx::query_as::<_, Category>(
            r#"
            UPDATE categories
            SET name = $1, description = $2, updated_at = NOW()
            WHERE id = $3 AND company_id = $4
            RETURNING id, company_id, name, description, created_at, updated_at
            "#,
        )
        .bind(&input.name)
        .bind(&input.description)
        .bind(category_id)
        .bind(company_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Category".to_string()))
    }

    pub async fn delete_category(&self, company_id: Uuid, category_id: Uuid) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM categories WHERE id = $1 AND company_id = $2")
            .bind(category_id)
            .bind(company_id)
            .execute(&self.db)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Category".to_string()));
        }
        Ok(())
    }
}
