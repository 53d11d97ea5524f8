//! Low-stock monitoring
//!
//! Runs after stock-affecting transactions commit. A product at or below its
//! company's threshold gets one unread `low_stock` notification; the partial
//! unique index on `notifications` keeps concurrent checks from creating a
//! second one.

use serde::Serialize;
use sqlx::{FromRow, PgPool};
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::events::{DomainEvent, EventBus};
use shared::{is_low_stock, low_stock_message, low_stock_title, NotificationKind};

#[derive(Clone)]
pub struct StockMonitor {
    db: PgPool,
    events: EventBus,
}

/// Result of checking one product
#[derive(Debug, Clone, Serialize)]
pub struct StockCheck {
    pub product_id: Uuid,
    pub quantity: i32,
    pub threshold: i32,
    pub is_low: bool,
    pub notification_created: bool,
    pub notification_id: Option<Uuid>,
}

#[derive(Debug, FromRow)]
struct StockLevel {
    name: String,
    quantity: i32,
    low_stock_threshold: i32,
}

#[derive(Debug, FromRow)]
struct CreatedNotification {
    id: Uuid,
    title: String,
    message: String,
}

impl StockMonitor {
    pub fn new(db: PgPool, events: EventBus) -> Self {
        Self { db, events }
    }

    /// Check one product of the company and raise a notification if it is low.
    ///
    /// `recipient` is the user whose action triggered the check.
    pub async fn check_product(
        &self,
        company_id: Uuid,
        product_id: Uuid,
        recipient: Option<Uuid>,
    ) -> AppResult<StockCheck> {
        let level = sqlx::query_as::<_, StockLevel>(
            r#"
            SELECT p.name, p.quantity, c.low_stock_threshold
            FROM products p
            JOIN companies c ON c.id = p.company_id
            WHERE p.id = $1 AND p.company_id = $2
            "#,
        )
        .bind(product_id)
        .bind(company_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Product".to_string()))?;

        let is_low = is_low_stock(level.quantity, level.low_stock_threshold);
        let mut check = StockCheck {
            product_id,
            quantity: level.quantity,
            threshold: level.low_stock_threshold,
            is_low,
            notification_created: false,
            notification_id: None,
        };
        if !is_low {
            return Ok(check);
        }

        let created = sqlx::query_as::<_, CreatedNotification>(
            r#"
            INSERT INTO notifications (company_id, user_id, product_id, kind, title, message)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (company_id, product_id) WHERE kind = 'low_stock' AND NOT is_read
            DO NOTHING
            RETURNING id, title, message
            "#,
        )
        .bind(company_id)
        .bind(recipient)
        .bind(product_id)
        .bind(NotificationKind::LowStock.as_str())
        .bind(low_stock_title(&level.name))
        .bind(low_stock_message(&level.name, level.quantity))
        .fetch_optional(&self.db)
        .await?;

        if let Some(notification) = created {
            tracing::info!(%product_id, quantity = level.quantity, "Low stock notification raised");
            check.notification_created = true;
            check.notification_id = Some(notification.id);
            self.events.publish(DomainEvent::NotificationCreated {
                company_id,
                user_id: recipient,
                notification_id: notification.id,
                title: notification.title,
                message: notification.message,
            });
        }

        Ok(check)
    }

    async fn handle_event(&self, event: &DomainEvent) {
        let company_id = event.company_id();
        for product_id in event.stock_checks() {
            match self.check_product(company_id, product_id, event.actor_id()).await {
                Ok(_) => {}
                // Deleted between the transaction and the check
                Err(AppError::NotFound(_)) => {}
                Err(e) => {
                    tracing::error!(error = %e, %product_id, "Low stock check failed");
                }
            }
        }
    }
}

/// Spawn the stock monitor subscriber
pub fn spawn_stock_monitor(db: PgPool, bus: &EventBus) -> JoinHandle<()> {
    let mut events = bus.subscribe();
    let monitor = StockMonitor::new(db, bus.clone());

    tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(event) => monitor.handle_event(&event).await,
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "Stock monitor lagged, events dropped");
                    continue;
                }
                Err(RecvError::Closed) => break,
            }
        }
        tracing::debug!("Stock monitor stopped");
    })
}
