//! Orders: stock is reserved when the order is placed and released when it
//! is cancelled or a pending order is deleted

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgConnection, PgPool};
use uuid::Uuid;
use validator::Validate;

use crate::error::{AppError, AppResult};
use crate::events::{DomainEvent, EventBus, StockLine};
use crate::services::product::{lock_products, price_lines, put_back_stock, take_stock};
use shared::{compose_totals, normalize_lines, DateRange, LineRequest, OrderStatus, PricedLine};

const ORDER_COLUMNS: &str = "id, company_id, employee_id, created_by, client_name, payment_method, \
     notes, status, subtotal, tax, total, created_at, updated_at";

const ORDER_ITEM_COLUMNS: &str =
    "id, order_id, product_id, product_name, quantity, unit_price, purchase_price, tax_rate";

#[derive(Clone)]
pub struct OrderService {
    db: PgPool,
    events: EventBus,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Order {
    pub id: Uuid,
    pub company_id: Uuid,
    pub employee_id: Uuid,
    pub created_by: Option<Uuid>,
    pub client_name: Option<String>,
    pub payment_method: Option<String>,
    pub notes: Option<String>,
    pub status: OrderStatus,
    pub subtotal: Decimal,
    pub tax: Decimal,
    pub total: Decimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct OrderItem {
    pub id: Uuid,
    pub order_id: Uuid,
    pub product_id: Option<Uuid>,
    pub product_name: String,
    pub quantity: i32,
    pub unit_price: Decimal,
    pub purchase_price: Decimal,
    pub tax_rate: Decimal,
}

impl OrderItem {
    /// The line as priced when the order was placed
    pub fn priced(&self) -> PricedLine {
        PricedLine {
            quantity: self.quantity,
            unit_price: self.unit_price,
            purchase_price: self.purchase_price,
            tax_rate: self.tax_rate,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct OrderWithItems {
    #[serde(flatten)]
    pub order: Order,
    pub items: Vec<OrderItem>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateOrderInput {
    pub employee_id: Uuid,
    #[validate(length(min = 1, message = "At least one item is required"))]
    pub items: Vec<LineRequest>,
    pub notes: Option<String>,
    pub client_name: Option<String>,
    pub payment_method: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateOrderInput {
    pub status: Option<OrderStatus>,
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct OrderFilter {
    pub status: Option<OrderStatus>,
}

/// Stock lines of the items that still point at a product
fn stock_lines(items: &[OrderItem]) -> Vec<StockLine> {
    items
        .iter()
        .filter_map(|item| {
            item.product_id.map(|product_id| StockLine {
                product_id,
                name: item.product_name.clone(),
                quantity: item.quantity,
                unit_price: item.unit_price,
            })
        })
        .collect()
}

/// Put every line of an order back on the shelf.
///
/// Lines whose product has since been deleted are skipped.
async fn release_stock(
    conn: &mut PgConnection,
    company_id: Uuid,
    items: &[OrderItem],
) -> AppResult<Vec<StockLine>> {
    let lines = stock_lines(items);
    for line in &lines {
        match put_back_stock(&mut *conn, company_id, line.product_id, line.quantity).await {
            Ok(()) => {}
            Err(AppError::NotFound(_)) => {
                tracing::warn!(product_id = %line.product_id, "Product gone, stock not restored");
            }
            Err(e) => return Err(e),
        }
    }
    Ok(lines)
}

pub(crate) async fn fetch_order_items(
    conn: &mut PgConnection,
    order_id: Uuid,
) -> AppResult<Vec<OrderItem>> {
    let items = sqlx::query_as::<_, OrderItem>(&format!(
        "SELECT {} FROM order_items WHERE order_id = $1 ORDER BY product_name",
        ORDER_ITEM_COLUMNS
    ))
    .bind(order_id)
    .fetch_all(&mut *conn)
    .await?;
    Ok(items)
}

/// Lock an order row of the tenant for the rest of the transaction
pub(crate) async fn lock_order(
    conn: &mut PgConnection,
    company_id: Uuid,
    order_id: Uuid,
) -> AppResult<Order> {
    sqlx::query_as::<_, Order>(&format!(
        "SELECT {} FROM orders WHERE id = $1 AND company_id = $2 FOR UPDATE",
        ORDER_COLUMNS
    ))
    .bind(order_id)
    .bind(company_id)
    .fetch_optional(&mut *conn)
    .await?
    .ok_or_else(|| AppError::NotFound("Order".to_string()))
}

impl OrderService {
    pub fn new(db: PgPool, events: EventBus) -> Self {
        Self { db, events }
    }

    /// Place an order, taking its stock off the shelf
    pub async fn create_order(
        &self,
        company_id: Uuid,
        user_id: Uuid,
        input: CreateOrderInput,
    ) -> AppResult<OrderWithItems> {
        input.validate()?;
        let lines = normalize_lines(&input.items)?;
        let product_ids: Vec<Uuid> = lines.iter().map(|l| l.product_id).collect();

        let mut tx = self.db.begin().await?;

        let employee_exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM employees WHERE id = $1 AND company_id = $2)",
        )
        .bind(input.employee_id)
        .bind(company_id)
        .fetch_one(&mut *tx)
        .await?;
        if !employee_exists {
            return Err(AppError::NotFound("Employee".to_string()));
        }

        let products = lock_products(&mut *tx, company_id, &product_ids).await?;
        let priced = price_lines(&lines, &products)?;
        let totals = compose_totals(&priced.iter().map(|(l, _)| *l).collect::<Vec<_>>());

        let order = sqlx::query_as::<_, Order>(&format!(
            r#"
            INSERT INTO orders (
                company_id, employee_id, created_by, client_name, payment_method, notes,
                status, subtotal, tax, total
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING {}
            "#,
            ORDER_COLUMNS
        ))
        .bind(company_id)
        .bind(input.employee_id)
        .bind(user_id)
        .bind(&input.client_name)
        .bind(&input.payment_method)
        .bind(&input.notes)
        .bind(OrderStatus::Pending)
        .bind(totals.subtotal)
        .bind(totals.tax)
        .bind(totals.total)
        .fetch_one(&mut *tx)
        .await?;

        let mut items = Vec::with_capacity(priced.len());
        for (line, product) in &priced {
            let item = sqlx::query_as::<_, OrderItem>(&format!(
                r#"
                INSERT INTO order_items (
                    order_id, product_id, product_name, quantity, unit_price, purchase_price, tax_rate
                )
                VALUES ($1, $2, $3, $4, $5, $6, $7)
                RETURNING {}
                "#,
                ORDER_ITEM_COLUMNS
            ))
            .bind(order.id)
            .bind(product.id)
            .bind(&product.name)
            .bind(line.quantity)
            .bind(line.unit_price)
            .bind(line.purchase_price)
            .bind(line.tax_rate)
            .fetch_one(&mut *tx)
            .await?;
            items.push(item);

            take_stock(&mut *tx, company_id, product.id, line.quantity).await?;
        }

        tx.commit().await?;

        tracing::info!(order_id = %order.id, %company_id, total = %order.total, "Order created");

        self.events.publish(DomainEvent::OrderCreated {
            company_id,
            actor_id: user_id,
            order_id: order.id,
            status: order.status,
            total: order.total,
            lines: stock_lines(&items),
        });

        Ok(OrderWithItems { order, items })
    }

    /// Orders of the company, newest first, optionally by status
    pub async fn list_orders(
        &self,
        company_id: Uuid,
        filter: OrderFilter,
    ) -> AppResult<Vec<OrderWithItems>> {
        let orders = sqlx::query_as::<_, Order>(&format!(
            r#"
            SELECT {} FROM orders
            WHERE company_id = $1 AND ($2::order_status IS NULL OR status = $2)
            ORDER BY created_at DESC
            "#,
            ORDER_COLUMNS
        ))
        .bind(company_id)
        .bind(filter.status)
        .fetch_all(&self.db)
        .await?;

        self.attach_items(orders).await
    }

    pub async fn recent_orders(&self, company_id: Uuid) -> AppResult<Vec<OrderWithItems>> {
        let orders = sqlx::query_as::<_, Order>(&format!(
            "SELECT {} FROM orders WHERE company_id = $1 ORDER BY created_at DESC LIMIT 5",
            ORDER_COLUMNS
        ))
        .bind(company_id)
        .fetch_all(&self.db)
        .await?;

        self.attach_items(orders).await
    }

    pub async fn orders_by_date(
        &self,
        company_id: Uuid,
        range: DateRange,
    ) -> AppResult<Vec<OrderWithItems>> {
        let (from, until) = range.instant_bounds();
        let orders = sqlx::query_as::<_, Order>(&format!(
            r#"
            SELECT {} FROM orders
            WHERE company_id = $1 AND created_at >= $2 AND created_at < $3
            ORDER BY created_at DESC
            "#,
            ORDER_COLUMNS
        ))
        .bind(company_id)
        .bind(from)
        .bind(until)
        .fetch_all(&self.db)
        .await?;

        self.attach_items(orders).await
    }

    pub async fn get_order(&self, company_id: Uuid, order_id: Uuid) -> AppResult<OrderWithItems> {
        let order = sqlx::query_as::<_, Order>(&format!(
            "SELECT {} FROM orders WHERE id = $1 AND company_id = $2",
            ORDER_COLUMNS
        ))
        .bind(order_id)
        .bind(company_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Order".to_string()))?;

        let mut conn = self.db.acquire().await?;
        let items = fetch_order_items(&mut *conn, order.id).await?;
        Ok(OrderWithItems { order, items })
    }

    /// Update notes and/or move the order through its lifecycle
    pub async fn update_order(
        &self,
        company_id: Uuid,
        user_id: Uuid,
        order_id: Uuid,
        input: UpdateOrderInput,
    ) -> AppResult<OrderWithItems> {
        let mut tx = self.db.begin().await?;
        let current = lock_order(&mut *tx, company_id, order_id).await?;
        let items = fetch_order_items(&mut *tx, order_id).await?;

        let target = input
            .status
            .map(|status| current.status.transition(status))
            .transpose()?;
        let restocked = match target {
            Some(OrderStatus::Cancelled) => release_stock(&mut *tx, company_id, &items).await?,
            _ => Vec::new(),
        };

        let order = sqlx::query_as::<_, Order>(&format!(
            r#"
            UPDATE orders
            SET status = COALESCE($1, status),
                notes = COALESCE($2, notes),
                updated_at = NOW()
            WHERE id = $3 AND company_id = $4
            RETURNING {}
            "#,
            ORDER_COLUMNS
        ))
        .bind(target)
        .bind(&input.notes)
        .bind(order_id)
        .bind(company_id)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        if target.is_some() {
            tracing::info!(%order_id, from = %current.status, to = %order.status, "Order status changed");
        }

        self.events.publish(DomainEvent::OrderUpdated {
            company_id,
            actor_id: user_id,
            order_id,
            status: order.status,
            restocked,
        });

        Ok(OrderWithItems { order, items })
    }

    pub async fn start_processing(
        &self,
        company_id: Uuid,
        user_id: Uuid,
        order_id: Uuid,
    ) -> AppResult<OrderWithItems> {
        self.move_to(company_id, user_id, order_id, OrderStatus::InProgress)
            .await
    }

    pub async fn complete_order(
        &self,
        company_id: Uuid,
        user_id: Uuid,
        order_id: Uuid,
    ) -> AppResult<OrderWithItems> {
        self.move_to(company_id, user_id, order_id, OrderStatus::Completed)
            .await
    }

    /// Cancel the order and put its stock back
    pub async fn cancel_order(
        &self,
        company_id: Uuid,
        user_id: Uuid,
        order_id: Uuid,
    ) -> AppResult<OrderWithItems> {
        self.move_to(company_id, user_id, order_id, OrderStatus::Cancelled)
            .await
    }

    /// Delete a pending or cancelled order. Pending orders release their stock.
    pub async fn delete_order(
        &self,
        company_id: Uuid,
        user_id: Uuid,
        order_id: Uuid,
    ) -> AppResult<()> {
        let mut tx = self.db.begin().await?;
        let order = lock_order(&mut *tx, company_id, order_id).await?;

        if !order.status.is_deletable() {
            return Err(AppError::InvalidStateTransition(format!(
                "Orders in status {} cannot be deleted",
                order.status
            )));
        }

        let items = fetch_order_items(&mut *tx, order_id).await?;
        let restocked = if order.status.holds_stock() {
            release_stock(&mut *tx, company_id, &items).await?
        } else {
            Vec::new()
        };

        sqlx::query("DELETE FROM orders WHERE id = $1 AND company_id = $2")
            .bind(order_id)
            .bind(company_id)
            .execute(&mut *tx)
            .await
            .map_err(|e| match &e {
                sqlx::Error::Database(db_err) if db_err.is_foreign_key_violation() => {
                    AppError::conflict("order", "Invoiced orders cannot be deleted")
                }
                _ => AppError::DatabaseError(e),
            })?;

        tx.commit().await?;

        tracing::info!(%order_id, %company_id, "Order deleted");

        if !restocked.is_empty() {
            self.events.publish(DomainEvent::OrderUpdated {
                company_id,
                actor_id: user_id,
                order_id,
                status: OrderStatus::Cancelled,
                restocked,
            });
        }

        Ok(())
    }

    async fn move_to(
        &self,
        company_id: Uuid,
        user_id: Uuid,
        order_id: Uuid,
        target: OrderStatus,
    ) -> AppResult<OrderWithItems> {
        self.update_order(
            company_id,
            user_id,
            order_id,
            UpdateOrderInput {
                status: Some(target),
                notes: None,
            },
        )
        .await
    }

    async fn attach_items(&self, orders: Vec<Order>) -> AppResult<Vec<OrderWithItems>> {
        if orders.is_empty() {
            return Ok(Vec::new());
        }
        let ids: Vec<Uuid> = orders.iter().map(|o| o.id).collect();

        let items = sqlx::query_as::<_, OrderItem>(&format!(
            "SELECT {} FROM order_items WHERE order_id = ANY($1)",
            ORDER_ITEM_COLUMNS
        ))
        .bind(&ids)
        .fetch_all(&self.db)
        .await?;

        let mut by_order: HashMap<Uuid, Vec<OrderItem>> = HashMap::new();
        for item in items {
            by_order.entry(item.order_id).or_default().push(item);
        }

        Ok(orders
            .into_iter()
            .map(|order| {
                let items = by_order.remove(&order.id).unwrap_or_default();
                OrderWithItems { order, items }
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(product_id: Option<Uuid>, quantity: i32) -> OrderItem {
        OrderItem {
            id: Uuid::new_v4(),
            order_id: Uuid::new_v4(),
            product_id,
            product_name: "Óleo 1L".to_string(),
            quantity,
            unit_price: Decimal::new(12000, 2),
            purchase_price: Decimal::new(9000, 2),
            tax_rate: Decimal::new(16, 0),
        }
    }

    #[test]
    fn test_stock_lines_skip_deleted_products() {
        let items = vec![item(Some(Uuid::new_v4()), 3), item(None, 2)];
        let lines = stock_lines(&items);
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].quantity, 3);
    }

    #[test]
    fn test_priced_line_keeps_snapshot() {
        let priced = item(Some(Uuid::new_v4()), 2).priced();
        assert_eq!(priced.subtotal(), Decimal::new(24000, 2));
        assert_eq!(priced.tax(), Decimal::new(3840, 2));

        let orphaned = item(None, 1).priced();
        assert_eq!(orphaned.subtotal(), Decimal::new(12000, 2));
    }

    #[test]
    fn test_update_input_accepts_screaming_status() {
        let input: UpdateOrderInput =
            serde_json::from_str(r#"{"status":"IN_PROGRESS"}"#).unwrap();
        assert_eq!(input.status, Some(OrderStatus::InProgress));
        assert!(input.notes.is_none());
    }
}
