//! Dashboard headline figures

use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::AppResult;
use crate::services::company::inventory_policy;
use shared::reporting::{
    determine_trend, format_change, percentage_change, DashboardPeriod, Trend,
};
use shared::start_of_day;

#[derive(Clone)]
pub struct DashboardService {
    db: PgPool,
}

#[derive(Debug, Deserialize)]
pub struct DashboardQuery {
    pub year: Option<i32>,
    pub month: Option<u32>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DashboardStats {
    pub total_products: i64,
    pub total_profit: Decimal,
    pub period_sales: Decimal,
    pub sales_trend: Trend,
    /// Signed percentage, e.g. `+12.50%`
    pub sales_change: String,
    pub low_stock_items: i64,
    pub growth_rate: String,
    pub growth_trend: Trend,
    pub growth_change: String,
}

/// Sales and profit summed over a period
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct PeriodTotals {
    sales: Decimal,
    profit: Decimal,
}

impl DashboardService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    pub async fn stats(&self, company_id: Uuid, query: DashboardQuery) -> AppResult<DashboardStats> {
        let today = Utc::now().date_naive();
        let period = DashboardPeriod::from_filter(query.year, query.month)?;
        let policy = inventory_policy(&self.db, company_id).await?;

        let (total_products, low_stock_items) = sqlx::query_as::<_, (i64, i64)>(
            r#"
            SELECT COUNT(*), COUNT(*) FILTER (WHERE quantity <= $2)
            FROM products
            WHERE company_id = $1
            "#,
        )
        .bind(company_id)
        .bind(policy.low_stock_threshold)
        .fetch_one(&self.db)
        .await?;

        let current = self.totals(company_id, period.bounds()).await?;
        let previous = self
            .totals(company_id, period.previous(today).bounds())
            .await?;

        let anchor = period.growth_anchor(today);
        let growth_current = if anchor == period {
            current
        } else {
            self.totals(company_id, anchor.bounds()).await?
        };
        let growth_previous = self
            .totals(company_id, anchor.previous(today).bounds())
            .await?;

        Ok(build_stats(
            total_products,
            low_stock_items,
            current,
            previous,
            growth_current.sales,
            growth_previous.sales,
        ))
    }

    async fn totals(
        &self,
        company_id: Uuid,
        bounds: Option<(NaiveDate, NaiveDate)>,
    ) -> AppResult<PeriodTotals> {
        let (from, until) = match bounds {
            Some((start, end)) => (
                Some(start_of_day(start)),
                end.succ_opt().map(start_of_day),
            ),
            None => (None, None),
        };

        let (sales, profit) = sqlx::query_as::<_, (Decimal, Decimal)>(
            r#"
            SELECT COALESCE(SUM(total), 0), COALESCE(SUM(profit), 0)
            FROM sales
            WHERE company_id = $1
              AND ($2::timestamptz IS NULL OR created_at >= $2)
              AND ($3::timestamptz IS NULL OR created_at < $3)
            "#,
        )
        .bind(company_id)
        .bind(from)
        .bind(until)
        .fetch_one(&self.db)
        .await?;

        Ok(PeriodTotals { sales, profit })
    }
}

fn build_stats(
    total_products: i64,
    low_stock_items: i64,
    current: PeriodTotals,
    previous: PeriodTotals,
    growth_current: Decimal,
    growth_previous: Decimal,
) -> DashboardStats {
    let sales_change = percentage_change(current.sales, previous.sales);
    let growth = percentage_change(growth_current, growth_previous);
    let growth_trend = if growth >= Decimal::ZERO {
        Trend::Up
    } else {
        Trend::Down
    };

    DashboardStats {
        total_products,
        total_profit: current.profit,
        period_sales: current.sales,
        sales_trend: determine_trend(current.sales, previous.sales),
        sales_change: format_change(sales_change),
        low_stock_items,
        growth_rate: format!("{:.2}%", growth),
        growth_trend,
        growth_change: format!("{:.2}%", growth.abs()),
    }
}
