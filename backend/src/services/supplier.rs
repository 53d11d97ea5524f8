//! Suppliers

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;
use validator::Validate;

use crate::error::{AppError, AppResult};
use shared::validate_nuit;

const SUPPLIER_COLUMNS: &str = "id, company_id, name, is_active, legal_business_name, trading_name, \
     nuit, address, address_number, neighborhood, city, state, country, postal_code, \
     contact_person, contact_position, phone, mobile, email, website, bank_name, \
     bank_account_number, bank_branch, created_at, updated_at";

#[derive(Clone)]
pub struct SupplierService {
    db: PgPool,
}

/// Registration, address, contact and bank data
#[derive(Debug, Clone, Default, Serialize, Deserialize, FromRow, Validate)]
pub struct SupplierDetails {
    pub legal_business_name: Option<String>,
    pub trading_name: Option<String>,
    pub nuit: Option<String>,
    pub address: Option<String>,
    pub address_number: Option<String>,
    pub neighborhood: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub country: Option<String>,
    pub postal_code: Option<String>,
    pub contact_person: Option<String>,
    pub contact_position: Option<String>,
    pub phone: Option<String>,
    pub mobile: Option<String>,
    #[validate(email(message = "Invalid email format"))]
    pub email: Option<String>,
    pub website: Option<String>,
    pub bank_name: Option<String>,
    pub bank_account_number: Option<String>,
    pub bank_branch: Option<String>,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Supplier {
    pub id: Uuid,
    pub company_id: Uuid,
    pub name: String,
    pub is_active: bool,
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub details: SupplierDetails,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateSupplierInput {
    #[validate(length(min = 1, message = "Name is required"))]
    pub name: String,
    pub is_active: Option<bool>,
    #[serde(flatten)]
    #[validate]
    pub details: SupplierDetails,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateSupplierInput {
    #[validate(length(min = 1, message = "Name cannot be empty"))]
    pub name: Option<String>,
    pub is_active: Option<bool>,
    #[serde(flatten)]
    #[validate]
    pub details: SupplierDetails,
}

fn check_nuit(details: &SupplierDetails) -> AppResult<()> {
    match details.nuit.as_deref() {
        Some(nuit) => validate_nuit(nuit).map_err(|m| AppError::validation("nuit", m)),
        None => Ok(()),
    }
}

impl SupplierService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    pub async fn create_supplier(
        &self,
        company_id: Uuid,
        input: CreateSupplierInput,
    ) -> AppResult<Supplier> {
        input.validate()?;
        check_nuit(&input.details)?;
        let d = &input.details;

        let supplier = sqlx::query_as::<_, Supplier>(&format!(
            r#"
            INSERT INTO suppliers (
                company_id, name, is_active, legal_business_name, trading_name, nuit, address,
                address_number, neighborhood, city, state, country, postal_code, contact_person,
                contact_position, phone, mobile, email, website, bank_name, bank_account_number,
                bank_branch
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16,
                    $17, $18, $19, $20, $21, $22)
            RETURNING {}
            "#,
            SUPPLIER_COLUMNS
        ))
        .bind(company_id)
        .bind(&input.name)
        .bind(input.is_active.unwrap_or(true))
        .bind(&d.legal_business_name)
        .bind(&d.trading_name)
        .bind(&d.nuit)
        .bind(&d.address)
        .bind(&d.address_number)
        .bind(&d.neighborhood)
        .bind(&d.city)
        .bind(&d.state)
        .bind(&d.country)
        .bind(&d.postal_code)
        .bind(&d.contact_person)
        .bind(&d.contact_position)
        .bind(&d.phone)
        .bind(&d.mobile)
        .bind(&d.email)
        .bind(&d.website)
        .bind(&d.bank_name)
        .bind(&d.bank_account_number)
        .bind(&d.bank_branch)
        .fetch_one(&self.db)
        .await?;

        tracing::info!(supplier_id = %supplier.id, %company_id, "Supplier created");
        Ok(supplier)
    }

    /// The company's suppliers; an empty list when there are none
    pub async fn list_suppliers(&self, company_id: Uuid) -> AppResult<Vec<Supplier>> {
        let suppliers = sqlx::query_as::<_, Supplier>(&format!(
            "SELECT {} FROM suppliers WHERE company_id = $1 ORDER BY name",
            SUPPLIER_COLUMNS
        ))
        .bind(company_id)
        .fetch_all(&self.db)
        .await?;

        Ok(suppliers)
    }

    pub async fn get_supplier(&self, company_id: Uuid, supplier_id: Uuid) -> AppResult<Supplier> {
        sqlx::query_as::<_, Supplier>(&format!(
            "SELECT {} FROM suppliers WHERE id = $1 AND company_id = $2",
            SUPPLIER_COLUMNS
        ))
        .bind(supplier_id)
        .bind(company_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Supplier".to_string()))
    }

    pub async fn update_supplier(
        &self,
        company_id: Uuid,
        supplier_id: Uuid,
        input: UpdateSupplierInput,
    ) -> AppResult<Supplier> {
        input.validate()?;
        check_nuit(&input.details)?;
        let d = &input.details;

        sqlx::query_as::<_, Supplier>(&format!(
            r#"
            UPDATE suppliers
            SET name = COALESCE($1, name),
                is_active = COALESCE($2, is_active),
                legal_business_name = COALESCE($3, legal_business_name),
                trading_name = COALESCE($4, trading_name),
                nuit = COALESCE($5, nuit),
                address = COALESCE($6, address),
                address_number = COALESCE($7, address_number),
                neighborhood = COALESCE($8, neighborhood),
                city = COALESCE($9, city),
                state = COALESCE($10, state),
                country = COALESCE($11, country),
                postal_code = COALESCE($12, postal_code),
                contact_person = COALESCE($13, contact_person),
                contact_position = COALESCE($14, contact_position),
                phone = COALESCE($15, phone),
                mobile = COALESCE($16, mobile),
                email = COALESCE($17, email),
                website = COALESCE($18, website),
                bank_name = COALESCE($19, bank_name),
                bank_account_number = COALESCE($20, bank_account_number),
                bank_branch = COALESCE($21, bank_branch),
                updated_at = NOW()
            WHERE id = $22 AND company_id = $23
            RETURNING {}
            "#,
            SUPPLIER_COLUMNS
        ))
        .bind(&input.name)
        .bind(input.is_active)
        .bind(&d.legal_business_name)
        .bind(&d.trading_name)
        .bind(&d.nuit)
        .bind(&d.address)
        .bind(&d.address_number)
        .bind(&d.neighborhood)
        .bind(&d.city)
        .bind(&d.state)
        .bind(&d.country)
        .bind(&d.postal_code)
        .bind(&d.contact_person)
        .bind(&d.contact_position)
        .bind(&d.phone)
        .bind(&d.mobile)
        .bind(&d.email)
        .bind(&d.website)
        .bind(&d.bank_name)
        .bind(&d.bank_account_number)
        .bind(&d.bank_branch)
        .bind(supplier_id)
        .bind(company_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Supplier".to_string()))
    }

    pub async fn delete_supplier(&self, company_id: Uuid, supplier_id: Uuid) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM suppliers WHERE id = $1 AND company_id = $2")
            .bind(supplier_id)
            .bind(company_id)
            .execute(&self.db)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Supplier".to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_input_reads_flat_json() {
        let input: CreateSupplierInput = serde_json::from_value(serde_json::json!({
            "name": "Distribuidora Maputo",
            "nuit": "400123456",
            "city": "Maputo",
            "bank_name": "BCI"
        }))
        .unwrap();
        assert_eq!(input.details.city.as_deref(), Some("Maputo"));
        assert!(check_nuit(&input.details).is_ok());
    }

    #[test]
    fn test_short_nuit_is_rejected() {
        let details = SupplierDetails {
            nuit: Some("12345".to_string()),
            ..Default::default()
        };
        assert!(check_nuit(&details).is_err());
    }

    #[test]
    fn test_nested_email_is_validated() {
        let input = CreateSupplierInput {
            name: "Fornecedor".to_string(),
            is_active: None,
            details: SupplierDetails {
                email: Some("not-an-email".to_string()),
                ..Default::default()
            },
        };
        assert!(input.validate().is_err());
    }
}
