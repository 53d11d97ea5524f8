//! Users of a company

use sqlx::PgPool;
use uuid::Uuid;

use crate::error::AppResult;
use crate::services::auth::UserProfile;

#[derive(Clone)]
pub struct UserService {
    db: PgPool,
}

impl UserService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Accounts attached to the company, without credentials
    pub async fn list_users(&self, company_id: Uuid) -> AppResult<Vec<UserProfile>> {
        let users = sqlx::query_as::<_, UserProfile>(
            r#"
            SELECT id, company_id, email, name, role, is_active, last_login_at, created_at, updated_at
            FROM users
            WHERE company_id = $1
            ORDER BY name
            "#,
        )
        .bind(company_id)
        .fetch_all(&self.db)
        .await?;

        Ok(users)
    }
}
