//! Attendance: check-in/check-out and monthly rollups

use std::collections::HashMap;

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::services::employee::EmployeeAttendanceStatus;
use crate::services::EmployeeService;
use shared::calendar::YearMonth;
use shared::reporting::{absent_days, summarize_month, total_hours, AttendanceSpan};

const ATTENDANCE_COLUMNS: &str = "id, company_id, employee_id, work_date, check_in, check_out, created_at";

#[derive(Clone)]
pub struct AttendanceService {
    db: PgPool,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Attendance {
    pub id: Uuid,
    pub company_id: Uuid,
    pub employee_id: Uuid,
    pub work_date: NaiveDate,
    pub check_in: DateTime<Utc>,
    pub check_out: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl Attendance {
    fn span(&self) -> AttendanceSpan {
        AttendanceSpan {
            check_in: self.check_in,
            check_out: self.check_out,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct CheckInInput {
    pub employee_id: Uuid,
}

#[derive(Debug, Deserialize)]
pub struct CheckOutInput {
    pub check_out: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
pub struct MonthQuery {
    pub year: i32,
    pub month: u32,
}

#[derive(Debug, Deserialize)]
pub struct DateQuery {
    pub date: NaiveDate,
}

#[derive(Debug, Deserialize)]
pub struct ReportQuery {
    /// `YYYY-MM`
    pub month: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct Absences {
    pub absences: Vec<NaiveDate>,
    pub total: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct WorkedHours {
    pub total: Decimal,
}

/// One row of the monthly attendance report
#[derive(Debug, Clone, Serialize)]
pub struct EmployeeMonthReport {
    pub employee_id: Uuid,
    pub name: String,
    pub salary: Option<Decimal>,
    pub total_days_present: i32,
    pub total_days_absent: i32,
    pub total_hours: Decimal,
}

#[derive(Debug, FromRow)]
struct ReportEmployee {
    id: Uuid,
    full_name: String,
    salary: Option<Decimal>,
}

impl AttendanceService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Check an employee in. One check-in per employee per day.
    pub async fn check_in(&self, company_id: Uuid, input: CheckInInput) -> AppResult<Attendance> {
        // Tenant check
        EmployeeService::new(self.db.clone())
            .get_employee(company_id, input.employee_id)
            .await?;

        let now = Utc::now();
        let attendance = sqlx::query_as::<_, Attendance>(&format!(
            r#"
            INSERT INTO attendances (company_id, employee_id, work_date, check_in)
            VALUES ($1, $2, $3, $4)
            RETURNING {}
            "#,
            ATTENDANCE_COLUMNS
        ))
        .bind(company_id)
        .bind(input.employee_id)
        .bind(now.date_naive())
        .bind(now)
        .fetch_one(&self.db)
        .await
        .map_err(|e| {
            AppError::on_unique_violation(e, "attendance", "Employee already checked in today")
        })?;

        tracing::info!(employee_id = %input.employee_id, "Checked in");
        Ok(attendance)
    }

    /// Record the check-out, now unless a time is given
    pub async fn check_out(
        &self,
        company_id: Uuid,
        attendance_id: Uuid,
        input: CheckOutInput,
    ) -> AppResult<Attendance> {
        let current = self.get_attendance(company_id, attendance_id).await?;
        let check_out = input.check_out.unwrap_or_else(Utc::now);
        if check_out <= current.check_in {
            return Err(AppError::validation(
                "check_out",
                "Check-out must be after check-in",
            ));
        }

        sqlx::query_as::<_, Attendance>(&format!(
            "UPDATE attendances SET check_out = $1 WHERE id = $2 AND company_id = $3 RETURNING {}",
            ATTENDANCE_COLUMNS
        ))
        .bind(check_out)
        .bind(attendance_id)
        .bind(company_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Attendance".to_string()))
    }

    pub async fn list_attendance(&self, company_id: Uuid) -> AppResult<Vec<Attendance>> {
        let rows = sqlx::query_as::<_, Attendance>(&format!(
            "SELECT {} FROM attendances WHERE company_id = $1 ORDER BY check_in DESC",
            ATTENDANCE_COLUMNS
        ))
        .bind(company_id)
        .fetch_all(&self.db)
        .await?;

        Ok(rows)
    }

    pub async fn get_attendance(&self, company_id: Uuid, attendance_id: Uuid) -> AppResult<Attendance> {
        sqlx::query_as::<_, Attendance>(&format!(
            "SELECT {} FROM attendances WHERE id = $1 AND company_id = $2",
            ATTENDANCE_COLUMNS
        ))
        .bind(attendance_id)
        .bind(company_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Attendance".to_string()))
    }

    pub async fn delete_attendance(&self, company_id: Uuid, attendance_id: Uuid) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM attendances WHERE id = $1 AND company_id = $2")
            .bind(attendance_id)
            .bind(company_id)
            .execute(&self.db)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Attendance".to_string()));
        }
        Ok(())
    }

    pub async fn by_employee(&self, company_id: Uuid, employee_id: Uuid) -> AppResult<Vec<Attendance>> {
        let rows = sqlx::query_as::<_, Attendance>(&format!(
            "SELECT {} FROM attendances WHERE company_id = $1 AND employee_id = $2 ORDER BY check_in DESC",
            ATTENDANCE_COLUMNS
        ))
        .bind(company_id)
        .bind(employee_id)
        .fetch_all(&self.db)
        .await?;

        Ok(rows)
    }

    pub async fn by_date(&self, company_id: Uuid, date: NaiveDate) -> AppResult<Vec<Attendance>> {
        let rows = sqlx::query_as::<_, Attendance>(&format!(
            "SELECT {} FROM attendances WHERE company_id = $1 AND work_date = $2 ORDER BY check_in",
            ATTENDANCE_COLUMNS
        ))
        .bind(company_id)
        .bind(date)
        .fetch_all(&self.db)
        .await?;

        Ok(rows)
    }

    pub async fn active_with_status(
        &self,
        company_id: Uuid,
    ) -> AppResult<Vec<EmployeeAttendanceStatus>> {
        EmployeeService::new(self.db.clone())
            .active_with_attendance(company_id)
            .await
    }

    /// Working days of the month the employee never checked in
    pub async fn absences(
        &self,
        company_id: Uuid,
        employee_id: Uuid,
        query: MonthQuery,
    ) -> AppResult<Absences> {
        let month = YearMonth::new(query.year, query.month)?;
        let spans = self.month_spans(company_id, employee_id, month).await?;
        let absences = absent_days(month, &spans);
        Ok(Absences {
            total: absences.len(),
            absences,
        })
    }

    pub async fn worked_hours(
        &self,
        company_id: Uuid,
        employee_id: Uuid,
        query: MonthQuery,
    ) -> AppResult<WorkedHours> {
        let month = YearMonth::new(query.year, query.month)?;
        let spans = self.month_spans(company_id, employee_id, month).await?;
        Ok(WorkedHours {
            total: total_hours(&spans),
        })
    }

    /// Presence, absence and hours for every active employee
    pub async fn monthly_report(
        &self,
        company_id: Uuid,
        query: ReportQuery,
    ) -> AppResult<Vec<EmployeeMonthReport>> {
        let month = YearMonth::parse(&query.month)?;

        let employees = sqlx::query_as::<_, ReportEmployee>(
            "SELECT id, full_name, salary FROM employees WHERE company_id = $1 AND is_active ORDER BY full_name",
        )
        .bind(company_id)
        .fetch_all(&self.db)
        .await?;

        let spans = self.company_month_spans(company_id, month).await?;

        Ok(employees
            .into_iter()
            .map(|employee| {
                let summary = summarize_month(
                    month,
                    spans.get(&employee.id).map(Vec::as_slice).unwrap_or(&[]),
                );
                EmployeeMonthReport {
                    employee_id: employee.id,
                    name: employee.full_name,
                    salary: employee.salary,
                    total_days_present: summary.total_days_present,
                    total_days_absent: summary.total_days_absent,
                    total_hours: summary.total_hours,
                }
            })
            .collect())
    }

    async fn month_spans(
        &self,
        company_id: Uuid,
        employee_id: Uuid,
        month: YearMonth,
    ) -> AppResult<Vec<AttendanceSpan>> {
        let rows = sqlx::query_as::<_, Attendance>(&format!(
            r#"
            SELECT {} FROM attendances
            WHERE company_id = $1 AND employee_id = $2 AND work_date BETWEEN $3 AND $4
            "#,
            ATTENDANCE_COLUMNS
        ))
        .bind(company_id)
        .bind(employee_id)
        .bind(month.first_day())
        .bind(month.last_day())
        .fetch_all(&self.db)
        .await?;

        Ok(rows.iter().map(Attendance::span).collect())
    }

    /// Every attendance span of the month, by employee
    pub(crate) async fn company_month_spans(
        &self,
        company_id: Uuid,
        month: YearMonth,
    ) -> AppResult<HashMap<Uuid, Vec<AttendanceSpan>>> {
        let rows = sqlx::query_as::<_, Attendance>(&format!(
            r#"
            SELECT {} FROM attendances
            WHERE company_id = $1 AND work_date BETWEEN $2 AND $3
            "#,
            ATTENDANCE_COLUMNS
        ))
        .bind(company_id)
        .bind(month.first_day())
        .bind(month.last_day())
        .fetch_all(&self.db)
        .await?;

        let mut by_employee: HashMap<Uuid, Vec<AttendanceSpan>> = HashMap::new();
        for row in &rows {
            by_employee.entry(row.employee_id).or_default().push(row.span());
        }
        Ok(by_employee)
    }
}
