//! Employees

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;
use validator::Validate;

use crate::error::{AppError, AppResult};
use shared::{Department, DEFAULT_VACATION_DAYS};

const EMPLOYEE_COLUMNS: &str = "id, company_id, user_id, full_name, position, email, phone, address, \
     salary, is_active, department, start_date, vacation_days_left, created_at, updated_at";

#[derive(Clone)]
pub struct EmployeeService {
    db: PgPool,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Employee {
    pub id: Uuid,
    pub company_id: Uuid,
    pub user_id: Option<Uuid>,
    pub full_name: String,
    pub position: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub salary: Option<Decimal>,
    pub is_active: bool,
    pub department: Department,
    pub start_date: Option<NaiveDate>,
    pub vacation_days_left: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Active employee with their latest attendance
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct EmployeeAttendanceStatus {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub employee: Employee,
    /// Checked in and not yet checked out
    pub has_open_attendance: bool,
    pub last_attendance_id: Option<Uuid>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateEmployeeInput {
    #[validate(length(min = 1, message = "Full name is required"))]
    pub full_name: String,
    pub position: Option<String>,
    #[validate(email(message = "Invalid email format"))]
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub salary: Option<Decimal>,
    pub is_active: Option<bool>,
    pub department: Option<Department>,
    pub start_date: Option<NaiveDate>,
    #[validate(range(min = 0, message = "Vacation days cannot be negative"))]
    pub vacation_days_left: Option<i32>,
    pub user_id: Option<Uuid>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateEmployeeInput {
    #[validate(length(min = 1, message = "Full name cannot be empty"))]
    pub full_name: Option<String>,
    pub position: Option<String>,
    #[validate(email(message = "Invalid email format"))]
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub salary: Option<Decimal>,
    pub is_active: Option<bool>,
    pub department: Option<Department>,
    pub start_date: Option<NaiveDate>,
    #[validate(range(min = 0, message = "Vacation days cannot be negative"))]
    pub vacation_days_left: Option<i32>,
}

fn check_salary(salary: Option<Decimal>) -> AppResult<()> {
    match salary {
        Some(s) if s < Decimal::ZERO => Err(AppError::validation("salary", "Salary cannot be negative")),
        _ => Ok(()),
    }
}

impl EmployeeService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    pub async fn create_employee(
        &self,
        company_id: Uuid,
        input: CreateEmployeeInput,
    ) -> AppResult<Employee> {
        input.validate()?;
        check_salary(input.salary)?;

        let employee = sqlx::query_as::<_, Employee>(&format!(
            r#"
            INSERT INTO employees (
                company_id, user_id, full_name, position, email, phone, address, salary,
                is_active, department, start_date, vacation_days_left
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            RETURNING {}
            "#,
            EMPLOYEE_COLUMNS
        ))
        .bind(company_id)
        .bind(input.user_id)
        .bind(&input.full_name)
        .bind(&input.position)
        .bind(&input.email)
        .bind(&input.phone)
        .bind(&input.address)
        .bind(input.salary)
        .bind(input.is_active.unwrap_or(true))
        .bind(input.department.unwrap_or(Department::Other))
        .bind(input.start_date)
        .bind(input.vacation_days_left.unwrap_or(DEFAULT_VACATION_DAYS))
        .fetch_one(&self.db)
        .await
        .map_err(|e| AppError::on_unique_violation(e, "employee", "User is already linked to an employee"))?;

        tracing::info!(employee_id = %employee.id, %company_id, "Employee created");
        Ok(employee)
    }

    pub async fn list_employees(&self, company_id: Uuid) -> AppResult<Vec<Employee>> {
        let employees = sqlx::query_as::<_, Employee>(&format!(
            "SELECT {} FROM employees WHERE company_id = $1 ORDER BY full_name",
            EMPLOYEE_COLUMNS
        ))
        .bind(company_id)
        .fetch_all(&self.db)
        .await?;

        Ok(employees)
    }

    pub async fn get_employee(&self, company_id: Uuid, employee_id: Uuid) -> AppResult<Employee> {
        sqlx::query_as::<_, Employee>(&format!(
            "SELECT {} FROM employees WHERE id = $1 AND company_id = $2",
            EMPLOYEE_COLUMNS
        ))
        .bind(employee_id)
        .bind(company_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Employee".to_string()))
    }

    pub async fn update_employee(
        &self,
        company_id: Uuid,
        employee_id: Uuid,
        input: UpdateEmployeeInput,
    ) -> AppResult<Employee> {
        input.validate()?;
        check_salary(input.salary)?;

        sqlx::query_as::<_, Employee>(&format!(
            r#"
            UPDATE employees
            SET full_name = COALESCE($1, full_name),
                position = COALESCE($2, position),
                email = COALESCE($3, email),
                phone = COALESCE($4, phone),
                address = COALESCE($5, address),
                salary = COALESCE($6, salary),
                is_active = COALESCE($7, is_active),
                department = COALESCE($8, department),
                start_date = COALESCE($9, start_date),
                vacation_days_left = COALESCE($10, vacation_days_left),
                updated_at = NOW()
            WHERE id = $11 AND company_id = $12
            RETURNING {}
            "#,
            EMPLOYEE_COLUMNS
        ))
        .bind(&input.full_name)
        .bind(&input.position)
        .bind(&input.email)
        .bind(&input.phone)
        .bind(&input.address)
        .bind(input.salary)
        .bind(input.is_active)
        .bind(input.department)
        .bind(input.start_date)
        .bind(input.vacation_days_left)
        .bind(employee_id)
        .bind(company_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Employee".to_string()))
    }

    pub async fn delete_employee(&self, company_id: Uuid, employee_id: Uuid) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM employees WHERE id = $1 AND company_id = $2")
            .bind(employee_id)
            .bind(company_id)
            .execute(&self.db)
            .await
            .map_err(|e| match &e {
                sqlx::Error::Database(db_err) if db_err.is_foreign_key_violation() => {
                    AppError::conflict("employee", "Employee has orders on record and cannot be deleted")
                }
                _ => AppError::DatabaseError(e),
            })?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Employee".to_string()));
        }
        Ok(())
    }

    /// Active employees with whether they are currently checked in
    pub async fn active_with_attendance(
        &self,
        company_id: Uuid,
    ) -> AppResult<Vec<EmployeeAttendanceStatus>> {
        let rows = sqlx::query_as::<_, EmployeeAttendanceStatus>(
            r#"
            SELECT e.id, e.company_id, e.user_id, e.full_name, e.position, e.email, e.phone,
                   e.address, e.salary, e.is_active, e.department, e.start_date,
                   e.vacation_days_left, e.created_at, e.updated_at,
                   (a.id IS NOT NULL AND a.check_out IS NULL) AS has_open_attendance,
                   a.id AS last_attendance_id
            FROM employees e
            LEFT JOIN LATERAL (
                SELECT id, check_out FROM attendances
                WHERE employee_id = e.id
                ORDER BY check_in DESC
                LIMIT 1
            ) a ON TRUE
            WHERE e.company_id = $1 AND e.is_active
            ORDER BY e.full_name
            "#,
        )
        .bind(company_id)
        .fetch_all(&self.db)
        .await?;

        Ok(rows)
    }
}
