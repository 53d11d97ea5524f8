//! Vacation requests and approvals

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use shared::{check_vacation_request, RequestStatus};

const VACATION_COLUMNS: &str = "id, company_id, employee_id, start_date, end_date, days, reason, \
     notes, status, decided_by, decided_at, created_at";

#[derive(Clone)]
pub struct VacationService {
    db: PgPool,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Vacation {
    pub id: Uuid,
    pub company_id: Uuid,
    pub employee_id: Uuid,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub days: i32,
    pub reason: Option<String>,
    pub notes: Option<String>,
    pub status: RequestStatus,
    pub decided_by: Option<Uuid>,
    pub decided_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct VacationRequestInput {
    pub employee_id: Uuid,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub reason: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, FromRow)]
struct VacationBalance {
    start_date: Option<NaiveDate>,
    vacation_days_left: i32,
}

impl VacationService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// File a request after checking service time and balance
    pub async fn request_vacation(
        &self,
        company_id: Uuid,
        input: VacationRequestInput,
    ) -> AppResult<Vacation> {
        let balance = sqlx::query_as::<_, VacationBalance>(
            "SELECT start_date, vacation_days_left FROM employees WHERE id = $1 AND company_id = $2",
        )
        .bind(input.employee_id)
        .bind(company_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Employee".to_string()))?;

        let days = check_vacation_request(
            balance.start_date,
            balance.vacation_days_left,
            input.start_date,
            input.end_date,
            Utc::now().date_naive(),
        )?;

        let vacation = sqlx::query_as::<_, Vacation>(&format!(
            r#"
            INSERT INTO vacations (company_id, employee_id, start_date, end_date, days, reason, notes, status)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING {}
            "#,
            VACATION_COLUMNS
        ))
        .bind(company_id)
        .bind(input.employee_id)
        .bind(input.start_date)
        .bind(input.end_date)
        .bind(days)
        .bind(&input.reason)
        .bind(&input.notes)
        .bind(RequestStatus::Pending)
        .fetch_one(&self.db)
        .await?;

        tracing::info!(vacation_id = %vacation.id, days, "Vacation requested");
        Ok(vacation)
    }

    pub async fn by_employee(&self, company_id: Uuid, employee_id: Uuid) -> AppResult<Vec<Vacation>> {
        let rows = sqlx::query_as::<_, Vacation>(&format!(
            "SELECT {} FROM vacations WHERE company_id = $1 AND employee_id = $2 ORDER BY start_date DESC",
            VACATION_COLUMNS
        ))
        .bind(company_id)
        .bind(employee_id)
        .fetch_all(&self.db)
        .await?;

        Ok(rows)
    }

    pub async fn list_vacations(&self, company_id: Uuid) -> AppResult<Vec<Vacation>> {
        let rows = sqlx::query_as::<_, Vacation>(&format!(
            "SELECT {} FROM vacations WHERE company_id = $1 ORDER BY created_at DESC",
            VACATION_COLUMNS
        ))
        .bind(company_id)
        .fetch_all(&self.db)
        .await?;

        Ok(rows)
    }

    /// Approve a pending request and take the days off the employee's balance
    pub async fn approve(
        &self,
        company_id: Uuid,
        user_id: Uuid,
        vacation_id: Uuid,
    ) -> AppResult<Vacation> {
        let mut tx = self.db.begin().await?;

        let vacation = self.lock_pending(&mut tx, company_id, vacation_id).await?;

        let updated = sqlx::query(
            r#"
            UPDATE employees
            SET vacation_days_left = vacation_days_left - $1, updated_at = NOW()
            WHERE id = $2 AND company_id = $3 AND vacation_days_left >= $1
            "#,
        )
        .bind(vacation.days)
        .bind(vacation.employee_id)
        .bind(company_id)
        .execute(&mut *tx)
        .await?;
        if updated.rows_affected() == 0 {
            return Err(AppError::ValidationError(
                "Employee does not have enough vacation days left".to_string(),
            ));
        }

        let approved = self
            .decide(&mut tx, vacation_id, RequestStatus::Approved, user_id)
            .await?;
        tx.commit().await?;

        tracing::info!(%vacation_id, days = approved.days, "Vacation approved");
        Ok(approved)
    }

    pub async fn reject(
        &self,
        company_id: Uuid,
        user_id: Uuid,
        vacation_id: Uuid,
    ) -> AppResult<Vacation> {
        let mut tx = self.db.begin().await?;
        self.lock_pending(&mut tx, company_id, vacation_id).await?;
        let rejected = self
            .decide(&mut tx, vacation_id, RequestStatus::Rejected, user_id)
            .await?;
        tx.commit().await?;

        tracing::info!(%vacation_id, "Vacation rejected");
        Ok(rejected)
    }

    async fn lock_pending(
        &self,
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        company_id: Uuid,
        vacation_id: Uuid,
    ) -> AppResult<Vacation> {
        let vacation = sqlx::query_as::<_, Vacation>(&format!(
            "SELECT {} FROM vacations WHERE id = $1 AND company_id = $2 FOR UPDATE",
            VACATION_COLUMNS
        ))
        .bind(vacation_id)
        .bind(company_id)
        .fetch_optional(&mut **tx)
        .await?
        .ok_or_else(|| AppError::NotFound("Vacation".to_string()))?;

        if vacation.status != RequestStatus::Pending {
            return Err(AppError::InvalidStateTransition(
                "Only pending vacation requests can be decided".to_string(),
            ));
        }
        Ok(vacation)
    }

    async fn decide(
        &self,
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        vacation_id: Uuid,
        status: RequestStatus,
        user_id: Uuid,
    ) -> AppResult<Vacation> {
        let vacation = sqlx::query_as::<_, Vacation>(&format!(
            r#"
            UPDATE vacations
            SET status = $1, decided_by = $2, decided_at = NOW()
            WHERE id = $3
            RETURNING {}
            "#,
            VACATION_COLUMNS
        ))
        .bind(status)
        .bind(user_id)
        .bind(vacation_id)
        .fetch_one(&mut **tx)
        .await?;

        Ok(vacation)
    }
}
