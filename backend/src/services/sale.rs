//! Sales: the point-of-sale transaction and its reports

use std::collections::HashMap;

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgConnection, PgPool};
use uuid::Uuid;
use validator::Validate;

use crate::error::{AppError, AppResult};
use crate::events::{DomainEvent, EventBus, StockLine};
use crate::services::product::{lock_products, price_lines, take_stock};
use shared::calendar::{trailing_months, YearMonth};
use shared::{
    compose_totals, normalize_lines, start_of_day, DateRange, LineRequest, PricedLine,
    TransactionTotals,
};

const SALE_COLUMNS: &str = "id, company_id, user_id, invoice_id, client_name, amount_paid, \
     change_due, subtotal, tax, total, profit, created_at";

#[derive(Clone)]
pub struct SaleService {
    db: PgPool,
    events: EventBus,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Sale {
    pub id: Uuid,
    pub company_id: Uuid,
    pub user_id: Option<Uuid>,
    /// Set when the sale records the revenue of an invoiced order
    pub invoice_id: Option<Uuid>,
    pub client_name: Option<String>,
    pub amount_paid: Option<Decimal>,
    pub change_due: Option<Decimal>,
    pub subtotal: Decimal,
    pub tax: Decimal,
    pub total: Decimal,
    pub profit: Decimal,
    pub created_at: DateTime<Utc>,
}

/// Line item with the prices captured at the time of sale
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct SaleItem {
    pub id: Uuid,
    pub sale_id: Uuid,
    pub product_id: Option<Uuid>,
    pub product_name: String,
    pub quantity: i32,
    pub unit_price: Decimal,
    pub purchase_price: Decimal,
    pub tax_rate: Decimal,
}

#[derive(Debug, Clone, Serialize)]
pub struct SaleWithItems {
    #[serde(flatten)]
    pub sale: Sale,
    pub items: Vec<SaleItem>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateSaleInput {
    #[validate(length(min = 1, message = "At least one item is required"))]
    pub items: Vec<LineRequest>,
    pub client_name: Option<String>,
    pub amount_paid: Option<Decimal>,
    pub change: Option<Decimal>,
}

/// Sales total and profit for one month
#[derive(Debug, Clone, Serialize)]
pub struct MonthlySales {
    /// `MM/YYYY`
    pub month: String,
    pub total: Decimal,
    pub profit: Decimal,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct TopProduct {
    pub product_id: Option<Uuid>,
    pub product_name: String,
    pub quantity_sold: i64,
    pub revenue: Decimal,
}

#[derive(Debug, Clone, Serialize)]
pub struct SalesReport {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub total: Decimal,
    pub profit: Decimal,
    pub sales: Vec<SaleWithItems>,
}

/// A line as written to the ledger. The product may have been deleted since
/// it was priced; the snapshot still carries the line's value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct LedgerLine {
    pub product_id: Option<Uuid>,
    pub product_name: String,
    pub price: PricedLine,
}

/// Header totals of a set of ledger lines
pub(crate) fn ledger_totals(lines: &[LedgerLine]) -> TransactionTotals {
    compose_totals(&lines.iter().map(|l| l.price).collect::<Vec<_>>())
}

#[derive(Debug, FromRow)]
struct MonthTotalsRow {
    month_start: DateTime<Utc>,
    total: Decimal,
    profit: Decimal,
}

/// Insert a sale header and its line items inside an open transaction
pub(crate) async fn insert_sale(
    conn: &mut PgConnection,
    company_id: Uuid,
    user_id: Uuid,
    invoice_id: Option<Uuid>,
    client_name: Option<&str>,
    payment: (Option<Decimal>, Option<Decimal>),
    lines: &[LedgerLine],
) -> AppResult<SaleWithItems> {
    let totals = ledger_totals(lines);
    let (amount_paid, change_due) = payment;

    let sale = sqlx::query_as::<_, Sale>(&format!(
        r#"
        INSERT INTO sales (
            company_id, user_id, invoice_id, client_name, amount_paid, change_due,
            subtotal, tax, total, profit
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
        RETURNING {}
        "#,
        SALE_COLUMNS
    ))
    .bind(company_id)
    .bind(user_id)
    .bind(invoice_id)
    .bind(client_name)
    .bind(amount_paid)
    .bind(change_due)
    .bind(totals.subtotal)
    .bind(totals.tax)
    .bind(totals.total)
    .bind(totals.profit)
    .fetch_one(&mut *conn)
    .await?;

    let mut items = Vec::with_capacity(lines.len());
    for line in lines {
        let item = sqlx::query_as::<_, SaleItem>(
            r#"
            INSERT INTO sale_items (
                sale_id, product_id, product_name, quantity, unit_price, purchase_price, tax_rate
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id, sale_id, product_id, product_name, quantity, unit_price,
                      purchase_price, tax_rate
            "#,
        )
        .bind(sale.id)
        .bind(line.product_id)
        .bind(&line.product_name)
        .bind(line.price.quantity)
        .bind(line.price.unit_price)
        .bind(line.price.purchase_price)
        .bind(line.price.tax_rate)
        .fetch_one(&mut *conn)
        .await?;
        items.push(item);
    }

    Ok(SaleWithItems { sale, items })
}

impl SaleService {
    pub fn new(db: PgPool, events: EventBus) -> Self {
        Self { db, events }
    }

    /// Record a sale.
    ///
    /// Products are locked, priced and decremented in one database
    /// transaction; either every line is sold or nothing changes.
    pub async fn record_sale(
        &self,
        company_id: Uuid,
        user_id: Uuid,
        input: CreateSaleInput,
    ) -> AppResult<SaleWithItems> {
        input.validate()?;
        let lines = normalize_lines(&input.items)?;
        let product_ids: Vec<Uuid> = lines.iter().map(|l| l.product_id).collect();

        let mut tx = self.db.begin().await?;

        let products = lock_products(&mut *tx, company_id, &product_ids).await?;
        let priced = price_lines(&lines, &products)?;
        let ledger: Vec<LedgerLine> = priced
            .iter()
            .map(|(price, product)| LedgerLine {
                product_id: Some(product.id),
                product_name: product.name.clone(),
                price: *price,
            })
            .collect();

        let total = ledger_totals(&ledger).total;
        let change_due = match (input.amount_paid, input.change) {
            (_, Some(change)) => Some(change),
            (Some(paid), None) => Some(paid - total),
            (None, None) => None,
        };

        let recorded = insert_sale(
            &mut *tx,
            company_id,
            user_id,
            None,
            input.client_name.as_deref(),
            (input.amount_paid, change_due),
            &ledger,
        )
        .await?;

        for (price, product) in &priced {
            take_stock(&mut *tx, company_id, product.id, price.quantity).await?;
        }

        tx.commit().await?;

        tracing::info!(
            sale_id = %recorded.sale.id,
            %company_id,
            total = %recorded.sale.total,
            "Sale recorded"
        );

        self.events.publish(DomainEvent::SaleRecorded {
            company_id,
            actor_id: user_id,
            sale_id: recorded.sale.id,
            total: recorded.sale.total,
            lines: stock_lines(&recorded.items),
        });

        Ok(recorded)
    }

    pub async fn list_sales(&self, company_id: Uuid) -> AppResult<Vec<SaleWithItems>> {
        let sales = sqlx::query_as::<_, Sale>(&format!(
            "SELECT {} FROM sales WHERE company_id = $1 ORDER BY created_at DESC",
            SALE_COLUMNS
        ))
        .bind(company_id)
        .fetch_all(&self.db)
        .await?;

        self.attach_items(sales).await
    }

    pub async fn get_sale(&self, company_id: Uuid, sale_id: Uuid) -> AppResult<SaleWithItems> {
        let sale = sqlx::query_as::<_, Sale>(&format!(
            "SELECT {} FROM sales WHERE id = $1 AND company_id = $2",
            SALE_COLUMNS
        ))
        .bind(sale_id)
        .bind(company_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Sale".to_string()))?;

        let mut with_items = self.attach_items(vec![sale]).await?;
        with_items
            .pop()
            .ok_or_else(|| AppError::NotFound("Sale".to_string()))
    }

    /// The five latest sales
    pub async fn recent_sales(&self, company_id: Uuid) -> AppResult<Vec<SaleWithItems>> {
        let sales = sqlx::query_as::<_, Sale>(&format!(
            "SELECT {} FROM sales WHERE company_id = $1 ORDER BY created_at DESC LIMIT 5",
            SALE_COLUMNS
        ))
        .bind(company_id)
        .fetch_all(&self.db)
        .await?;

        self.attach_items(sales).await
    }

    /// Totals for each of the last twelve months, oldest first, zero-filled
    pub async fn monthly_stats(&self, company_id: Uuid) -> AppResult<Vec<MonthlySales>> {
        let months = trailing_months(YearMonth::of(Utc::now().date_naive()), 12);
        let since = months
            .first()
            .map(|m| start_of_day(m.first_day()))
            .unwrap_or_else(Utc::now);

        let rows = sqlx::query_as::<_, MonthTotalsRow>(
            r#"
            SELECT date_trunc('month', created_at) AS month_start,
                   COALESCE(SUM(total), 0) AS total,
                   COALESCE(SUM(profit), 0) AS profit
            FROM sales
            WHERE company_id = $1 AND created_at >= $2
            GROUP BY month_start
            "#,
        )
        .bind(company_id)
        .bind(since)
        .fetch_all(&self.db)
        .await?;

        let by_month: HashMap<YearMonth, &MonthTotalsRow> = rows
            .iter()
            .map(|row| (YearMonth::of(row.month_start.date_naive()), row))
            .collect();

        Ok(months
            .into_iter()
            .map(|month| {
                let (total, profit) = by_month
                    .get(&month)
                    .map(|row| (row.total, row.profit))
                    .unwrap_or((Decimal::ZERO, Decimal::ZERO));
                MonthlySales {
                    month: format!("{:02}/{}", month.month, month.year),
                    total,
                    profit,
                }
            })
            .collect())
    }

    /// Best sellers of the current month by quantity
    pub async fn top_products(&self, company_id: Uuid) -> AppResult<Vec<TopProduct>> {
        let today = Utc::now().date_naive();
        let month_start = start_of_day(YearMonth::new(today.year(), today.month())?.first_day());

        let products = sqlx::query_as::<_, TopProduct>(
            r#"
            SELECT si.product_id, si.product_name,
                   SUM(si.quantity)::BIGINT AS quantity_sold,
                   SUM(si.unit_price * si.quantity) AS revenue
            FROM sale_items si
            JOIN sales s ON s.id = si.sale_id
            WHERE s.company_id = $1 AND s.created_at >= $2
            GROUP BY si.product_id, si.product_name
            ORDER BY quantity_sold DESC
            LIMIT 10
            "#,
        )
        .bind(company_id)
        .bind(month_start)
        .fetch_all(&self.db)
        .await?;

        Ok(products)
    }

    /// Sales between two dates (inclusive) with their summed total
    pub async fn report(&self, company_id: Uuid, range: DateRange) -> AppResult<SalesReport> {
        let (from, until) = range.instant_bounds();
        let sales = sqlx::query_as::<_, Sale>(&format!(
            r#"
            SELECT {} FROM sales
            WHERE company_id = $1 AND created_at >= $2 AND created_at < $3
            ORDER BY created_at DESC
            "#,
            SALE_COLUMNS
        ))
        .bind(company_id)
        .bind(from)
        .bind(until)
        .fetch_all(&self.db)
        .await?;

        let total = sales.iter().map(|s| s.total).sum();
        let profit = sales.iter().map(|s| s.profit).sum();
        let sales = self.attach_items(sales).await?;

        Ok(SalesReport {
            start_date: range.start_date,
            end_date: range.end_date,
            total,
            profit,
            sales,
        })
    }

    /// The date-range report as CSV, one row per sale line
    pub async fn export_report_csv(&self, company_id: Uuid, range: DateRange) -> AppResult<String> {
        let report = self.report(company_id, range).await?;
        render_report_csv(&report)
    }

    /// Search by client name, product name or sale id
    pub async fn search_sales(&self, company_id: Uuid, query: &str) -> AppResult<Vec<SaleWithItems>> {
        let query = query.trim();
        if query.is_empty() {
            return Err(AppError::validation("q", "Search term is required"));
        }
        let pattern = format!("%{}%", query.replace('%', "\\%").replace('_', "\\_"));

        let sales = sqlx::query_as::<_, Sale>(&format!(
            r#"
            SELECT {} FROM sales s
            WHERE s.company_id = $1
              AND (
                s.client_name ILIKE $2
                OR s.id::text = $3
                OR EXISTS (
                    SELECT 1 FROM sale_items si
                    WHERE si.sale_id = s.id AND si.product_name ILIKE $2
                )
              )
            ORDER BY s.created_at DESC
            "#,
            SALE_COLUMNS
        ))
        .bind(company_id)
        .bind(&pattern)
        .bind(query)
        .fetch_all(&self.db)
        .await?;

        self.attach_items(sales).await
    }

    async fn attach_items(&self, sales: Vec<Sale>) -> AppResult<Vec<SaleWithItems>> {
        if sales.is_empty() {
            return Ok(Vec::new());
        }
        let ids: Vec<Uuid> = sales.iter().map(|s| s.id).collect();

        let items = sqlx::query_as::<_, SaleItem>(
            r#"
            SELECT id, sale_id, product_id, product_name, quantity, unit_price,
                   purchase_price, tax_rate
            FROM sale_items
            WHERE sale_id = ANY($1)
            "#,
        )
        .bind(&ids)
        .fetch_all(&self.db)
        .await?;

        let mut by_sale: HashMap<Uuid, Vec<SaleItem>> = HashMap::new();
        for item in items {
            by_sale.entry(item.sale_id).or_default().push(item);
        }

        Ok(sales
            .into_iter()
            .map(|sale| {
                let items = by_sale.remove(&sale.id).unwrap_or_default();
                SaleWithItems { sale, items }
            })
            .collect())
    }
}

pub(crate) fn stock_lines(items: &[SaleItem]) -> Vec<StockLine> {
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

fn render_report_csv(report: &SalesReport) -> AppResult<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);

    wtr.write_record([
        "sale_id",
        "date",
        "client",
        "product",
        "quantity",
        "unit_price",
        "tax_rate",
        "sale_total",
    ])
    .map_err(|e| AppError::Internal(format!("CSV write error: {}", e)))?;

    for entry in &report.sales {
        let sale = &entry.sale;
        for item in &entry.items {
            wtr.write_record([
                sale.id.to_string(),
                sale.created_at.to_rfc3339(),
                sale.client_name.clone().unwrap_or_default(),
                item.product_name.clone(),
                item.quantity.to_string(),
                item.unit_price.to_string(),
                item.tax_rate.to_string(),
                sale.total.to_string(),
            ])
            .map_err(|e| AppError::Internal(format!("CSV write error: {}", e)))?;
        }
    }

    let data = wtr
        .into_inner()
        .map_err(|e| AppError::Internal(format!("CSV finalize error: {}", e)))?;
    String::from_utf8(data).map_err(|e| AppError::Internal(format!("CSV encoding error: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_report() -> SalesReport {
        let sale_id = Uuid::new_v4();
        let sale = Sale {
            id: sale_id,
            company_id: Uuid::new_v4(),
            user_id: None,
            invoice_id: None,
            client_name: Some("Ana, Lda".to_string()),
            amount_paid: None,
            change_due: None,
            subtotal: Decimal::new(25000, 2),
            tax: Decimal::new(4000, 2),
            total: Decimal::new(29000, 2),
            profit: Decimal::new(10000, 2),
            created_at: Utc::now(),
        };
        let item = SaleItem {
            id: Uuid::new_v4(),
            sale_id,
            product_id: Some(Uuid::new_v4()),
            product_name: "Arroz 5kg".to_string(),
            quantity: 2,
            unit_price: Decimal::new(10000, 2),
            purchase_price: Decimal::new(6000, 2),
            tax_rate: Decimal::new(16, 0),
        };
        let today = Utc::now().date_naive();
        SalesReport {
            start_date: today,
            end_date: today,
            total: sale.total,
            profit: sale.profit,
            sales: vec![SaleWithItems { sale, items: vec![item] }],
        }
    }

    #[test]
    fn test_csv_has_header_and_one_row_per_line() {
        let csv = render_report_csv(&sample_report()).unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("sale_id,date,client"));
        // Commas in client names are quoted
        assert!(lines[1].contains("\"Ana, Lda\""));
        assert!(lines[1].contains("Arroz 5kg"));
    }

    #[test]
    fn test_stock_lines_skip_deleted_products() {
        let mut report = sample_report();
        let mut orphan = report.sales[0].items[0].clone();
        orphan.product_id = None;
        report.sales[0].items.push(orphan);
        assert_eq!(stock_lines(&report.sales[0].items).len(), 1);
    }
}
