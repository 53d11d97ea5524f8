//! In-app notifications and their read state

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::events::{DomainEvent, EventBus};
use shared::ReadReceipt;

const NOTIFICATION_COLUMNS: &str =
    "id, company_id, user_id, product_id, kind, title, message, is_read, read_at, created_at";

/// Notification service
#[derive(Clone)]
pub struct NotificationService {
    db: PgPool,
    events: EventBus,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Notification {
    pub id: Uuid,
    pub company_id: Uuid,
    /// `None` addresses everyone in the company
    pub user_id: Option<Uuid>,
    pub product_id: Option<Uuid>,
    pub kind: String,
    pub title: String,
    pub message: String,
    pub is_read: bool,
    pub read_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct UnreadCount {
    pub count: i64,
}

impl NotificationService {
    pub fn new(db: PgPool, events: EventBus) -> Self {
        Self { db, events }
    }

    /// Unread notifications addressed to the user, newest first
    pub async fn pending(&self, company_id: Uuid, user_id: Uuid) -> AppResult<Vec<Notification>> {
        let notifications = sqlx::query_as::<_, Notification>(&format!(
            r#"
            SELECT {} FROM notifications
            WHERE company_id = $1 AND (user_id = $2 OR user_id IS NULL) AND NOT is_read
            ORDER BY created_at DESC
            "#,
            NOTIFICATION_COLUMNS
        ))
        .bind(company_id)
        .bind(user_id)
        .fetch_all(&self.db)
        .await?;

        Ok(notifications)
    }

    pub async fn unread_count(&self, company_id: Uuid, user_id: Uuid) -> AppResult<i64> {
        let count = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*) FROM notifications
            WHERE company_id = $1 AND (user_id = $2 OR user_id IS NULL) AND NOT is_read
            "#,
        )
        .bind(company_id)
        .bind(user_id)
        .fetch_one(&self.db)
        .await?;

        Ok(count)
    }

    /// Mark one notification read and report the remaining unread count
    pub async fn mark_read(
        &self,
        company_id: Uuid,
        user_id: Uuid,
        notification_id: Uuid,
    ) -> AppResult<ReadReceipt> {
        let result = sqlx::query(
            r#"
            UPDATE notifications
            SET is_read = TRUE, read_at = COALESCE(read_at, NOW())
            WHERE id = $1 AND company_id = $2 AND (user_id = $3 OR user_id IS NULL)
            "#,
        )
        .bind(notification_id)
        .bind(company_id)
        .bind(user_id)
        .execute(&self.db)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Notification".to_string()));
        }

        let unread_count = self.publish_unread_count(company_id, user_id).await?;
        Ok(ReadReceipt {
            success: true,
            unread_count,
        })
    }

    pub async fn mark_all_read(&self, company_id: Uuid, user_id: Uuid) -> AppResult<ReadReceipt> {
        let result = sqlx::query(
            r#"
            UPDATE notifications
            SET is_read = TRUE, read_at = NOW()
            WHERE company_id = $1 AND (user_id = $2 OR user_id IS NULL) AND NOT is_read
            "#,
        )
        .bind(company_id)
        .bind(user_id)
        .execute(&self.db)
        .await?;

        tracing::debug!(%user_id, marked = result.rows_affected(), "Notifications marked read");

        let unread_count = self.publish_unread_count(company_id, user_id).await?;
        Ok(ReadReceipt {
            success: true,
            unread_count,
        })
    }

    async fn publish_unread_count(&self, company_id: Uuid, user_id: Uuid) -> AppResult<i64> {
        let unread_count = self.unread_count(company_id, user_id).await?;
        self.events.publish(DomainEvent::UnreadCountChanged {
            company_id,
            user_id,
            unread_count,
        });
        Ok(unread_count)
    }
}
