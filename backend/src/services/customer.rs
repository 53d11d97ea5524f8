//! Customers

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;
use validator::Validate;

use crate::error::{AppError, AppResult};
use shared::validate_nuit;

const CUSTOMER_COLUMNS: &str =
    "id, company_id, name, email, phone, address, nuit, is_active, created_at, updated_at";

#[derive(Clone)]
pub struct CustomerService {
    db: PgPool,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Customer {
    pub id: Uuid,
    pub company_id: Uuid,
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub nuit: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateCustomerInput {
    #[validate(length(min = 1, message = "Name is required"))]
    pub name: String,
    #[validate(email(message = "Invalid email format"))]
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub nuit: Option<String>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateCustomerInput {
    #[validate(length(min = 1, message = "Name cannot be empty"))]
    pub name: Option<String>,
    #[validate(email(message = "Invalid email format"))]
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub nuit: Option<String>,
    pub is_active: Option<bool>,
}

fn check_nuit(nuit: Option<&str>) -> AppResult<()> {
    match nuit {
        Some(nuit) => validate_nuit(nuit).map_err(|m| AppError::validation("nuit", m)),
        None => Ok(()),
    }
}

impl CustomerService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    pub async fn create_customer(
        &self,
        company_id: Uuid,
        input: CreateCustomerInput,
    ) -> AppResult<Customer> {
        input.validate()?;
        check_nuit(input.nuit.as_deref())?;

        let customer = sqlx::query_as::<_, Customer>(&format!(
            r#"
            INSERT INTO customers (company_id, name, email, phone, address, nuit, is_active)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {}
            "#,
            CUSTOMER_COLUMNS
        ))
        .bind(company_id)
        .bind(&input.name)
        .bind(&input.email)
        .bind(&input.phone)
        .bind(&input.address)
        .bind(&input.nuit)
        .bind(input.is_active.unwrap_or(true))
        .fetch_one(&self.db)
        .await?;

        Ok(customer)
    }

    pub async fn list_customers(&self, company_id: Uuid) -> AppResult<Vec<Customer>> {
        let customers = sqlx::query_as::<_, Customer>(&format!(
            "SELECT {} FROM customers WHERE company_id = $1 ORDER BY name",
            CUSTOMER_COLUMNS
        ))
        .bind(company_id)
        .fetch_all(&self.db)
        .await?;

        Ok(customers)
    }

    pub async fn get_customer(&self, company_id: Uuid, customer_id: Uuid) -> AppResult<Customer> {
        sqlx::query_as::<_, Customer>(&format!(
            "SELECT {} FROM customers WHERE id = $1 AND company_id = $2",
            CUSTOMER_COLUMNS
        ))
        .bind(customer_id)
        .bind(company_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Customer".to_string()))
    }

    pub async fn update_customer(
        &self,
        company_id: Uuid,
        customer_id: Uuid,
        input: UpdateCustomerInput,
    ) -> AppResult<Customer> {
        input.validate()?;
        check_nuit(input.nuit.as_deref())?;

        sqlx::query_as::<_, Customer>(&format!(
            r#"
            UPDATE customers
            SET name = COALESCE($1, name),
                email = COALESCE($2, email),
                phone = COALESCE($3, phone),
                address = COALESCE($4, address),
                nuit = COALESCE($5, nuit),
                is_active = COALESCE($6, is_active),
                updated_at = NOW()
            WHERE id = $7 AND company_id = $8
            RETURNING {}
            "#,
            CUSTOMER_COLUMNS
        ))
        .bind(&input.name)
        .bind(&input.email)
        .bind(&input.phone)
        .bind(&input.address)
        .bind(&input.nuit)
        .bind(input.is_active)
        .bind(customer_id)
        .bind(company_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Customer".to_string()))
    }

    pub async fn delete_customer(&self, company_id: Uuid, customer_id: Uuid) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM customers WHERE id = $1 AND company_id = $2")
            .bind(customer_id)
            .bind(company_id)
            .execute(&self.db)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Customer".to_string()));
        }
        Ok(())
    }
}
