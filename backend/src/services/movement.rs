//! Audit trail of stock and document changes

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;
use uuid::Uuid;
use validator::Validate;

use crate::error::{AppError, AppResult};
use crate::events::{DomainEvent, EventBus};

const MOVEMENT_COLUMNS: &str =
    "id, company_id, user_id, movement_type, entity_type, entity_id, description, details, created_at";

#[derive(Clone)]
pub struct MovementService {
    db: PgPool,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Movement {
    pub id: Uuid,
    pub company_id: Uuid,
    pub user_id: Option<Uuid>,
    #[serde(rename = "type")]
    pub movement_type: String,
    pub entity_type: String,
    pub entity_id: Uuid,
    pub description: String,
    pub details: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateMovementInput {
    #[serde(rename = "type")]
    #[validate(length(min = 1, max = 50, message = "Type is required"))]
    pub movement_type: String,
    #[validate(length(min = 1, max = 50, message = "Entity type is required"))]
    pub entity_type: String,
    pub entity_id: Uuid,
    #[validate(length(min = 1, message = "Description is required"))]
    pub description: String,
    pub details: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
pub struct MovementFilter {
    pub entity_type: String,
    pub entity_id: Uuid,
}

impl MovementService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    pub async fn create_movement(
        &self,
        company_id: Uuid,
        user_id: Option<Uuid>,
        input: CreateMovementInput,
    ) -> AppResult<Movement> {
        input.validate()?;

        let movement = sqlx::query_as::<_, Movement>(&format!(
            r#"
            INSERT INTO movements (company_id, user_id, movement_type, entity_type, entity_id, description, details)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {}
            "#,
            MOVEMENT_COLUMNS
        ))
        .bind(company_id)
        .bind(user_id)
        .bind(&input.movement_type)
        .bind(&input.entity_type)
        .bind(input.entity_id)
        .bind(&input.description)
        .bind(&input.details)
        .fetch_one(&self.db)
        .await?;

        Ok(movement)
    }

    /// Append the audit entry an event maps to, if any
    pub async fn record_event(&self, event: &DomainEvent) -> AppResult<Option<Movement>> {
        let Some(entry) = event.movement() else {
            return Ok(None);
        };

        let input = CreateMovementInput {
            movement_type: entry.movement_type.as_str().to_string(),
            entity_type: entry.movement_type.entity_type().to_string(),
            entity_id: entry.entity_id,
            description: entry.description,
            details: Some(entry.details),
        };
        let movement = self
            .create_movement(event.company_id(), event.actor_id(), input)
            .await?;
        Ok(Some(movement))
    }

    /// History of one entity, newest first
    pub async fn list_for_entity(
        &self,
        company_id: Uuid,
        filter: MovementFilter,
    ) -> AppResult<Vec<Movement>> {
        let movements = sqlx::query_as::<_, Movement>(&format!(
            r#"
            SELECT {} FROM movements
            WHERE company_id = $1 AND entity_type = $2 AND entity_id = $3
            ORDER BY created_at DESC
            "#,
            MOVEMENT_COLUMNS
        ))
        .bind(company_id)
        .bind(&filter.entity_type)
        .bind(filter.entity_id)
        .fetch_all(&self.db)
        .await?;

        Ok(movements)
    }

    pub async fn recent_movements(&self, company_id: Uuid) -> AppResult<Vec<Movement>> {
        let movements = sqlx::query_as::<_, Movement>(&format!(
            "SELECT {} FROM movements WHERE company_id = $1 ORDER BY created_at DESC LIMIT 20",
            MOVEMENT_COLUMNS
        ))
        .bind(company_id)
        .fetch_all(&self.db)
        .await?;

        Ok(movements)
    }

    pub async fn delete_movement(&self, company_id: Uuid, movement_id: Uuid) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM movements WHERE id = $1 AND company_id = $2")
            .bind(movement_id)
            .bind(company_id)
            .execute(&self.db)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Movement".to_string()));
        }

        Ok(())
    }
}

/// Spawn the audit recorder. Every domain event with a movement mapping is
/// appended to the trail; failures are logged and never reach the request
/// that caused the event.
pub fn spawn_movement_recorder(db: PgPool, bus: &EventBus) -> JoinHandle<()> {
    let mut events = bus.subscribe();
    let service = MovementService::new(db);

    tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(event) => {
                    if let Err(e) = service.record_event(&event).await {
                        tracing::error!(error = %e, company_id = %event.company_id(), "Failed to record movement");
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "Movement recorder lagged, events dropped");
                    continue;
                }
                Err(RecvError::Closed) => break,
            }
        }
        tracing::debug!("Movement recorder stopped");
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manual_movement_uses_type_key() {
        let input: CreateMovementInput = serde_json::from_value(serde_json::json!({
            "type": "ADJUSTMENT",
            "entity_type": "Product",
            "entity_id": Uuid::new_v4(),
            "description": "Shelf count correction"
        }))
        .unwrap();
        assert_eq!(input.movement_type, "ADJUSTMENT");
        assert!(input.validate().is_ok());
    }

    #[test]
    fn test_manual_movement_requires_description() {
        let input = CreateMovementInput {
            movement_type: "ADJUSTMENT".to_string(),
            entity_type: "Product".to_string(),
            entity_id: Uuid::new_v4(),
            description: String::new(),
            details: None,
        };
        assert!(input.validate().is_err());
    }
}
