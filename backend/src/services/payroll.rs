//! Payroll entries and the per-period payroll summary

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;
use validator::Validate;

use crate::error::{AppError, AppResult};
use crate::services::{AttendanceService, EmployeeService};
use shared::calendar::{trailing_months, YearMonth};
use shared::reporting::{summarize_month, ReportPeriod};
use shared::{net_salary, validate_payroll_amounts, validate_payroll_year, PayrollStatus};

const PAYROLL_COLUMNS: &str = "id, company_id, employee_id, month, year, base_salary, bonuses, \
     deductions, net_salary, status, payment_date, created_at";

#[derive(Clone)]
pub struct PayrollService {
    db: PgPool,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Payroll {
    pub id: Uuid,
    pub company_id: Uuid,
    pub employee_id: Uuid,
    pub month: i32,
    pub year: i32,
    pub base_salary: Decimal,
    pub bonuses: Decimal,
    pub deductions: Decimal,
    pub net_salary: Decimal,
    pub status: PayrollStatus,
    pub payment_date: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// Payroll entry with the employee's name
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct PayrollListing {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub payroll: Payroll,
    pub employee_name: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreatePayrollInput {
    pub employee_id: Uuid,
    #[validate(range(min = 1, max = 12, message = "Month must be between 1 and 12"))]
    pub month: i32,
    pub year: i32,
    pub base_salary: Decimal,
    #[serde(default)]
    pub bonuses: Decimal,
    #[serde(default)]
    pub deductions: Decimal,
}

#[derive(Debug, Deserialize)]
pub struct PeriodQuery {
    pub month: i32,
    pub year: i32,
}

#[derive(Debug, Deserialize)]
pub struct SummaryQuery {
    pub period: Option<String>,
}

/// Payroll totals for one month
#[derive(Debug, Clone, Serialize)]
pub struct PayrollMonthSummary {
    /// `YYYY-MM`
    pub month: String,
    pub total_net_salary: Decimal,
    pub total_employees: i64,
    pub total_absences: i32,
    pub total_hours: Decimal,
}

const LISTING_SELECT: &str = r#"
    SELECT p.id, p.company_id, p.employee_id, p.month, p.year, p.base_salary, p.bonuses,
           p.deductions, p.net_salary, p.status, p.payment_date, p.created_at,
           e.full_name AS employee_name
    FROM payrolls p
    JOIN employees e ON e.id = p.employee_id
"#;

impl PayrollService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    pub async fn create_payroll(
        &self,
        company_id: Uuid,
        input: CreatePayrollInput,
    ) -> AppResult<Payroll> {
        input.validate()?;
        validate_payroll_year(input.year).map_err(|m| AppError::validation("year", m))?;
        validate_payroll_amounts(input.base_salary, input.bonuses, input.deductions)?;

        EmployeeService::new(self.db.clone())
            .get_employee(company_id, input.employee_id)
            .await?;

        let net = net_salary(input.base_salary, input.bonuses, input.deductions);

        let payroll = sqlx::query_as::<_, Payroll>(&format!(
            r#"
            INSERT INTO payrolls (
                company_id, employee_id, month, year, base_salary, bonuses, deductions, net_salary, status
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING {}
            "#,
            PAYROLL_COLUMNS
        ))
        .bind(company_id)
        .bind(input.employee_id)
        .bind(input.month)
        .bind(input.year)
        .bind(input.base_salary)
        .bind(input.bonuses)
        .bind(input.deductions)
        .bind(net)
        .bind(PayrollStatus::Pending)
        .fetch_one(&self.db)
        .await
        .map_err(|e| {
            AppError::on_unique_violation(
                e,
                "payroll",
                "Payroll already exists for this employee and period",
            )
        })?;

        tracing::info!(payroll_id = %payroll.id, employee_id = %payroll.employee_id, "Payroll created");
        Ok(payroll)
    }

    pub async fn list_payrolls(&self, company_id: Uuid) -> AppResult<Vec<PayrollListing>> {
        let rows = sqlx::query_as::<_, PayrollListing>(&format!(
            "{} WHERE p.company_id = $1 ORDER BY p.year DESC, p.month DESC, e.full_name",
            LISTING_SELECT
        ))
        .bind(company_id)
        .fetch_all(&self.db)
        .await?;

        Ok(rows)
    }

    pub async fn by_month(&self, company_id: Uuid, query: PeriodQuery) -> AppResult<Vec<PayrollListing>> {
        let rows = sqlx::query_as::<_, PayrollListing>(&format!(
            "{} WHERE p.company_id = $1 AND p.month = $2 AND p.year = $3 ORDER BY e.full_name",
            LISTING_SELECT
        ))
        .bind(company_id)
        .bind(query.month)
        .bind(query.year)
        .fetch_all(&self.db)
        .await?;

        Ok(rows)
    }

    pub async fn by_employee(&self, company_id: Uuid, employee_id: Uuid) -> AppResult<Vec<Payroll>> {
        let rows = sqlx::query_as::<_, Payroll>(&format!(
            r#"
            SELECT {} FROM payrolls
            WHERE company_id = $1 AND employee_id = $2
            ORDER BY year DESC, month DESC
            "#,
            PAYROLL_COLUMNS
        ))
        .bind(company_id)
        .bind(employee_id)
        .fetch_all(&self.db)
        .await?;

        Ok(rows)
    }

    /// Mark a payroll paid. Paying twice is rejected.
    pub async fn mark_paid(&self, company_id: Uuid, payroll_id: Uuid) -> AppResult<Payroll> {
        let updated = sqlx::query_as::<_, Payroll>(&format!(
            r#"
            UPDATE payrolls
            SET status = $1, payment_date = NOW()
            WHERE id = $2 AND company_id = $3 AND status <> $1
            RETURNING {}
            "#,
            PAYROLL_COLUMNS
        ))
        .bind(PayrollStatus::Paid)
        .bind(payroll_id)
        .bind(company_id)
        .fetch_optional(&self.db)
        .await?;

        if let Some(payroll) = updated {
            return Ok(payroll);
        }

        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM payrolls WHERE id = $1 AND company_id = $2)",
        )
        .bind(payroll_id)
        .bind(company_id)
        .fetch_one(&self.db)
        .await?;

        if exists {
            Err(AppError::ValidationError("Payroll has already been paid".to_string()))
        } else {
            Err(AppError::NotFound("Payroll".to_string()))
        }
    }

    /// Net salary, headcount, absences and hours per payroll month over the period
    pub async fn summary(
        &self,
        company_id: Uuid,
        query: SummaryQuery,
    ) -> AppResult<Vec<PayrollMonthSummary>> {
        let period = ReportPeriod::parse_or_default(query.period.as_deref());
        let months = trailing_months(YearMonth::of(Utc::now().date_naive()), period.months());
        let Some(first) = months.first().copied() else {
            return Ok(Vec::new());
        };

        let payrolls = sqlx::query_as::<_, Payroll>(&format!(
            r#"
            SELECT {} FROM payrolls
            WHERE company_id = $1 AND (year, month) >= ($2, $3)
            "#,
            PAYROLL_COLUMNS
        ))
        .bind(company_id)
        .bind(first.year)
        .bind(first.month as i32)
        .fetch_all(&self.db)
        .await?;

        let mut by_month: HashMap<(i32, i32), Vec<&Payroll>> = HashMap::new();
        for payroll in &payrolls {
            by_month
                .entry((payroll.year, payroll.month))
                .or_default()
                .push(payroll);
        }

        let attendance = AttendanceService::new(self.db.clone());
        let mut summary = Vec::with_capacity(months.len());
        for month in months {
            let entries = by_month
                .get(&(month.year, month.month as i32))
                .map(Vec::as_slice)
                .unwrap_or(&[]);

            let mut total_absences = 0;
            let mut total_hours = Decimal::ZERO;
            if !entries.is_empty() {
                let spans = attendance.company_month_spans(company_id, month).await?;
                for entry in entries {
                    let figures = summarize_month(
                        month,
                        spans.get(&entry.employee_id).map(Vec::as_slice).unwrap_or(&[]),
                    );
                    total_absences += figures.total_days_absent;
                    total_hours += figures.total_hours;
                }
            }

            summary.push(PayrollMonthSummary {
                month: month.label(),
                total_net_salary: entries.iter().map(|p| p.net_salary).sum(),
                total_employees: entries.len() as i64,
                total_absences,
                total_hours: total_hours.round_dp(2),
            });
        }

        Ok(summary)
    }
}
