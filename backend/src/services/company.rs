//! Company (tenant) management

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;
use validator::Validate;

use crate::config::InventoryConfig;
use crate::error::{AppError, AppResult};
use shared::{validate_nuit, validate_tax_rate};

const COMPANY_COLUMNS: &str = "id, name, nuit, phone, email, address, logo_url, is_active, \
     low_stock_threshold, default_tax_rate, created_at, updated_at";

#[derive(Clone)]
pub struct CompanyService {
    db: PgPool,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Company {
    pub id: Uuid,
    pub name: String,
    pub nuit: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
    pub logo_url: Option<String>,
    pub is_active: bool,
    pub low_stock_threshold: i32,
    pub default_tax_rate: Decimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Stock policy a company applies to its products
#[derive(Debug, Clone, Copy, FromRow)]
pub struct InventoryPolicy {
    pub low_stock_threshold: i32,
    pub default_tax_rate: Decimal,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateCompanyInput {
    #[validate(length(min = 1, message = "Name is required"))]
    pub name: String,
    pub nuit: Option<String>,
    pub phone: Option<String>,
    #[validate(email(message = "Invalid email format"))]
    pub email: Option<String>,
    pub address: Option<String>,
    pub logo_url: Option<String>,
    pub is_active: Option<bool>,
    #[validate(range(min = 0, message = "Threshold cannot be negative"))]
    pub low_stock_threshold: Option<i32>,
    pub default_tax_rate: Option<Decimal>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateCompanyInput {
    #[validate(length(min = 1, message = "Name cannot be empty"))]
    pub name: Option<String>,
    pub nuit: Option<String>,
    pub phone: Option<String>,
    #[validate(email(message = "Invalid email format"))]
    pub email: Option<String>,
    pub address: Option<String>,
    pub logo_url: Option<String>,
    pub is_active: Option<bool>,
    #[validate(range(min = 0, message = "Threshold cannot be negative"))]
    pub low_stock_threshold: Option<i32>,
    pub default_tax_rate: Option<Decimal>,
}

/// Load a company's stock policy
pub async fn inventory_policy(db: &PgPool, company_id: Uuid) -> AppResult<InventoryPolicy> {
    sqlx::query_as::<_, InventoryPolicy>(
        "SELECT low_stock_threshold, default_tax_rate FROM companies WHERE id = $1",
    )
    .bind(company_id)
    .fetch_optional(db)
    .await?
    .ok_or_else(|| AppError::NotFound("Company".to_string()))
}

fn check_fiscal_fields(nuit: Option<&str>, tax_rate: Option<Decimal>) -> AppResult<()> {
    if let Some(nuit) = nuit {
        validate_nuit(nuit).map_err(|m| AppError::validation("nuit", m))?;
    }
    if let Some(rate) = tax_rate {
        validate_tax_rate(rate).map_err(|m| AppError::validation("default_tax_rate", m))?;
    }
    Ok(())
}

impl CompanyService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    pub async fn create_company(
        &self,
        defaults: &InventoryConfig,
        input: CreateCompanyInput,
    ) -> AppResult<Company> {
        input.validate()?;
        check_fiscal_fields(input.nuit.as_deref(), input.default_tax_rate)?;

        let company = sqlx::query_as::<_, Company>(&format!(
            r#"
            INSERT INTO companies (
                name, nuit, phone, email, address, logo_url, is_active,
                low_stock_threshold, default_tax_rate
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING {}
            "#,
            COMPANY_COLUMNS
        ))
        .bind(&input.name)
        .bind(&input.nuit)
        .bind(&input.phone)
        .bind(&input.email)
        .bind(&input.address)
        .bind(&input.logo_url)
        .bind(input.is_active.unwrap_or(true))
        .bind(input.low_stock_threshold.unwrap_or(defaults.low_stock_threshold))
        .bind(input.default_tax_rate.unwrap_or(defaults.default_tax_rate))
        .fetch_one(&self.db)
        .await?;

        tracing::info!(company_id = %company.id, "Company created");
        Ok(company)
    }

    /// Companies visible to a caller: only their own
    pub async fn list_companies(&self, company_id: Option<Uuid>) -> AppResult<Vec<Company>> {
        let Some(company_id) = company_id else {
            return Ok(Vec::new());
        };

        let companies = sqlx::query_as::<_, Company>(&format!(
            "SELECT {} FROM companies WHERE id = $1",
            COMPANY_COLUMNS
        ))
        .bind(company_id)
        .fetch_all(&self.db)
        .await?;

        Ok(companies)
    }

    pub async fn get_company(&self, company_id: Uuid) -> AppResult<Company> {
        sqlx::query_as::<_, Company>(&format!(
            "SELECT {} FROM companies WHERE id = $1",
            COMPANY_COLUMNS
        ))
        .bind(company_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Company".to_string()))
    }

    pub async fn update_company(
        &self,
        company_id: Uuid,
        input: UpdateCompanyInput,
    ) -> AppResult<Company> {
        input.validate()?;
        check_fiscal_fields(input.nuit.as_deref(), input.default_tax_rate)?;

        sqlx::query_as::<_, Company>(&format!(
            r#"
            UPDATE companies
            SET name = COALESCE($1, name),
                nuit = COALESCE($2, nuit),
                phone = COALESCE($3, phone),
                email = COALESCE($4, email),
                address = COALESCE($5, address),
                logo_url = COALESCE($6, logo_url),
                is_active = COALESCE($7, is_active),
                low_stock_threshold = COALESCE($8, low_stock_threshold),
                default_tax_rate = COALESCE($9, default_tax_rate),
                updated_at = NOW()
            WHERE id = $10
            RETURNING {}
            "#,
            COMPANY_COLUMNS
        ))
        .bind(&input.name)
        .bind(&input.nuit)
        .bind(&input.phone)
        .bind(&input.email)
        .bind(&input.address)
        .bind(&input.logo_url)
        .bind(input.is_active)
        .bind(input.low_stock_threshold)
        .bind(input.default_tax_rate)
        .bind(company_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Company".to_string()))
    }

    pub async fn delete_company(&self, company_id: Uuid) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM companies WHERE id = $1")
            .bind(company_id)
            .execute(&self.db)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Company".to_string()));
        }

        Ok(())
    }
}
