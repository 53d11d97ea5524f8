//! Invoice issuance for completed orders

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::events::{DomainEvent, EventBus};
use crate::services::order::{fetch_order_items, lock_order, OrderItem};
use crate::services::sale::{insert_sale, ledger_totals, LedgerLine};

const INVOICE_COLUMNS: &str =
    "id, company_id, order_id, issued_by, subtotal, tax, total, notes, created_at";

#[derive(Clone)]
pub struct InvoiceService {
    db: PgPool,
    events: EventBus,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Invoice {
    pub id: Uuid,
    pub company_id: Uuid,
    pub order_id: Uuid,
    pub issued_by: Option<Uuid>,
    pub subtotal: Decimal,
    pub tax: Decimal,
    pub total: Decimal,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct IssueInvoiceInput {
    pub order_id: Uuid,
    pub notes: Option<String>,
}

impl InvoiceService {
    pub fn new(db: PgPool, events: EventBus) -> Self {
        Self { db, events }
    }

    /// Issue the single invoice of a completed order.
    ///
    /// Totals come from the order's line snapshots. The revenue is booked
    /// as a sale linked to the invoice; stock already left with the order.
    pub async fn issue_invoice(
        &self,
        company_id: Uuid,
        user_id: Uuid,
        input: IssueInvoiceInput,
    ) -> AppResult<Invoice> {
        let mut tx = self.db.begin().await?;

        let order = lock_order(&mut *tx, company_id, input.order_id).await?;
        if !order.status.is_invoiceable() {
            return Err(AppError::ValidationError(format!(
                "Only completed orders can be invoiced, order is {}",
                order.status
            )));
        }

        let already_issued = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM invoices WHERE order_id = $1)",
        )
        .bind(order.id)
        .fetch_one(&mut *tx)
        .await?;
        if already_issued {
            return Err(AppError::conflict("invoice", "Order has already been invoiced"));
        }

        let items = fetch_order_items(&mut *tx, order.id).await?;
        let lines = invoice_lines(&items);
        let totals = ledger_totals(&lines);

        let invoice = sqlx::query_as::<_, Invoice>(&format!(
            r#"
            INSERT INTO invoices (company_id, order_id, issued_by, subtotal, tax, total, notes)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {}
            "#,
            INVOICE_COLUMNS
        ))
        .bind(company_id)
        .bind(order.id)
        .bind(user_id)
        .bind(totals.subtotal)
        .bind(totals.tax)
        .bind(totals.total)
        .bind(&input.notes)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| AppError::on_unique_violation(e, "invoice", "Order has already been invoiced"))?;

        insert_sale(
            &mut *tx,
            company_id,
            user_id,
            Some(invoice.id),
            order.client_name.as_deref(),
            (None, None),
            &lines,
        )
        .await?;

        tx.commit().await?;

        tracing::info!(invoice_id = %invoice.id, order_id = %order.id, total = %invoice.total, "Invoice issued");

        self.events.publish(DomainEvent::InvoiceIssued {
            company_id,
            actor_id: user_id,
            invoice_id: invoice.id,
            order_id: order.id,
            total: invoice.total,
        });

        Ok(invoice)
    }

    pub async fn list_invoices(&self, company_id: Uuid) -> AppResult<Vec<Invoice>> {
        let invoices = sqlx::query_as::<_, Invoice>(&format!(
            "SELECT {} FROM invoices WHERE company_id = $1 ORDER BY created_at DESC",
            INVOICE_COLUMNS
        ))
        .bind(company_id)
        .fetch_all(&self.db)
        .await?;

        Ok(invoices)
    }

    pub async fn get_invoice(&self, company_id: Uuid, invoice_id: Uuid) -> AppResult<Invoice> {
        sqlx::query_as::<_, Invoice>(&format!(
            "SELECT {} FROM invoices WHERE id = $1 AND company_id = $2",
            INVOICE_COLUMNS
        ))
        .bind(invoice_id)
        .bind(company_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Invoice".to_string()))
    }
}

/// Every order line, including those whose product was deleted since
fn invoice_lines(items: &[OrderItem]) -> Vec<LedgerLine> {
    items
        .iter()
        .map(|item| LedgerLine {
            product_id: item.product_id,
            product_name: item.product_name.clone(),
            price: item.priced(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn order_item(product_id: Option<Uuid>, quantity: i32, unit_price: i64) -> OrderItem {
        OrderItem {
            id: Uuid::new_v4(),
            order_id: Uuid::new_v4(),
            product_id,
            product_name: "Arroz 5kg".to_string(),
            quantity,
            unit_price: Decimal::from(unit_price),
            purchase_price: Decimal::from(unit_price / 2),
            tax_rate: Decimal::from(16),
        }
    }

    #[test]
    fn test_invoice_keeps_lines_of_deleted_products() {
        let items = vec![
            order_item(Some(Uuid::new_v4()), 2, 100),
            order_item(None, 1, 50),
        ];

        let lines = invoice_lines(&items);
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[1].product_id, None);

        let totals = ledger_totals(&lines);
        assert_eq!(totals.subtotal, Decimal::from(250));
        assert_eq!(totals.tax, Decimal::from(40));
        assert_eq!(totals.total, Decimal::from(290));
    }
}
