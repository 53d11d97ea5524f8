//! Returns put sold units back on the shelf

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;
use validator::Validate;

use crate::error::{AppError, AppResult};
use crate::events::{DomainEvent, EventBus, StockLine};
use crate::services::product::{put_back_stock, take_stock};
use shared::ensure_returnable;

const RETURN_COLUMNS: &str = "id, company_id, sale_id, product_id, quantity, reason, returned_by, \
     car_plate, processed_by, created_at";

#[derive(Clone)]
pub struct ReturnService {
    db: PgPool,
    events: EventBus,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct ProductReturn {
    pub id: Uuid,
    pub company_id: Uuid,
    pub sale_id: Uuid,
    pub product_id: Uuid,
    pub quantity: i32,
    pub reason: Option<String>,
    pub returned_by: String,
    pub car_plate: Option<String>,
    pub processed_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateReturnInput {
    pub sale_id: Uuid,
    pub product_id: Uuid,
    #[validate(range(min = 1, message = "Quantity must be at least 1"))]
    pub quantity: i32,
    pub reason: Option<String>,
    #[validate(length(min = 1, message = "Returned by is required"))]
    pub returned_by: String,
    pub car_plate: Option<String>,
}

/// What the sale line looked like, for the returned product
#[derive(Debug, FromRow)]
struct SoldLine {
    product_name: String,
    unit_price: rust_decimal::Decimal,
    sold: i64,
}

impl ReturnService {
    pub fn new(db: PgPool, events: EventBus) -> Self {
        Self { db, events }
    }

    /// Record a return against a sale line
    pub async fn create_return(
        &self,
        company_id: Uuid,
        user_id: Uuid,
        input: CreateReturnInput,
    ) -> AppResult<ProductReturn> {
        input.validate()?;

        let mut tx = self.db.begin().await?;

        // Serializes concurrent returns against the same sale
        let sale_exists = sqlx::query_scalar::<_, Uuid>(
            "SELECT id FROM sales WHERE id = $1 AND company_id = $2 FOR UPDATE",
        )
        .bind(input.sale_id)
        .bind(company_id)
        .fetch_optional(&mut *tx)
        .await?;
        if sale_exists.is_none() {
            return Err(AppError::NotFound("Sale".to_string()));
        }

        let sold_line = sqlx::query_as::<_, SoldLine>(
            r#"
            SELECT MIN(product_name) AS product_name,
                   MIN(unit_price) AS unit_price,
                   SUM(quantity)::BIGINT AS sold
            FROM sale_items
            WHERE sale_id = $1 AND product_id = $2
            HAVING COUNT(*) > 0
            "#,
        )
        .bind(input.sale_id)
        .bind(input.product_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::validation("product_id", "Product is not part of this sale"))?;

        let already_returned = sqlx::query_scalar::<_, i64>(
            "SELECT COALESCE(SUM(quantity), 0)::BIGINT FROM returns WHERE sale_id = $1 AND product_id = $2",
        )
        .bind(input.sale_id)
        .bind(input.product_id)
        .fetch_one(&mut *tx)
        .await?;

        ensure_returnable(
            input.quantity,
            clamp_count(sold_line.sold),
            clamp_count(already_returned),
        )?;

        let record = sqlx::query_as::<_, ProductReturn>(&format!(
            r#"
            INSERT INTO returns (
                company_id, sale_id, product_id, quantity, reason, returned_by, car_plate, processed_by
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING {}
            "#,
            RETURN_COLUMNS
        ))
        .bind(company_id)
        .bind(input.sale_id)
        .bind(input.product_id)
        .bind(input.quantity)
        .bind(&input.reason)
        .bind(&input.returned_by)
        .bind(&input.car_plate)
        .bind(user_id)
        .fetch_one(&mut *tx)
        .await?;

        put_back_stock(&mut *tx, company_id, input.product_id, input.quantity).await?;

        tx.commit().await?;

        tracing::info!(return_id = %record.id, sale_id = %record.sale_id, quantity = record.quantity, "Return recorded");

        self.events.publish(DomainEvent::ReturnRecorded {
            company_id,
            actor_id: user_id,
            return_id: record.id,
            sale_id: record.sale_id,
            line: StockLine {
                product_id: record.product_id,
                name: sold_line.product_name,
                quantity: record.quantity,
                unit_price: sold_line.unit_price,
            },
        });

        Ok(record)
    }

    pub async fn list_returns(&self, company_id: Uuid) -> AppResult<Vec<ProductReturn>> {
        let returns = sqlx::query_as::<_, ProductReturn>(&format!(
            "SELECT {} FROM returns WHERE company_id = $1 ORDER BY created_at DESC",
            RETURN_COLUMNS
        ))
        .bind(company_id)
        .fetch_all(&self.db)
        .await?;

        Ok(returns)
    }

    pub async fn get_return(&self, company_id: Uuid, return_id: Uuid) -> AppResult<ProductReturn> {
        sqlx::query_as::<_, ProductReturn>(&format!(
            "SELECT {} FROM returns WHERE id = $1 AND company_id = $2",
            RETURN_COLUMNS
        ))
        .bind(return_id)
        .bind(company_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Return".to_string()))
    }

    /// Undo a return. The units must still be on the shelf.
    pub async fn delete_return(
        &self,
        company_id: Uuid,
        user_id: Uuid,
        return_id: Uuid,
    ) -> AppResult<()> {
        let mut tx = self.db.begin().await?;

        let record = sqlx::query_as::<_, ProductReturn>(&format!(
            "DELETE FROM returns WHERE id = $1 AND company_id = $2 RETURNING {}",
            RETURN_COLUMNS
        ))
        .bind(return_id)
        .bind(company_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::NotFound("Return".to_string()))?;

        take_stock(&mut *tx, company_id, record.product_id, record.quantity).await?;

        let (name, unit_price) = sqlx::query_as::<_, (String, rust_decimal::Decimal)>(
            "SELECT name, selling_price FROM products WHERE id = $1",
        )
        .bind(record.product_id)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        tracing::info!(%return_id, "Return reversed");

        self.events.publish(DomainEvent::ReturnReversed {
            company_id,
            actor_id: user_id,
            return_id,
            sale_id: record.sale_id,
            line: StockLine {
                product_id: record.product_id,
                name,
                quantity: record.quantity,
                unit_price,
            },
        });

        Ok(())
    }
}

fn clamp_count(value: i64) -> i32 {
    i32::try_from(value).unwrap_or(i32::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_return_input_requires_positive_quantity() {
        let input = CreateReturnInput {
            sale_id: Uuid::new_v4(),
            product_id: Uuid::new_v4(),
            quantity: 0,
            reason: None,
            returned_by: "Carlos".to_string(),
            car_plate: None,
        };
        assert!(input.validate().is_err());
    }

    #[test]
    fn test_return_input_requires_returned_by() {
        let input = CreateReturnInput {
            sale_id: Uuid::new_v4(),
            product_id: Uuid::new_v4(),
            quantity: 1,
            reason: None,
            returned_by: String::new(),
            car_plate: Some("AAA-123-MC".to_string()),
        };
        assert!(input.validate().is_err());
    }

    #[test]
    fn test_clamp_count() {
        assert_eq!(clamp_count(5), 5);
        assert_eq!(clamp_count(i64::MAX), i32::MAX);
    }
}
