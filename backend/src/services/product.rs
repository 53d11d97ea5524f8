//! Product ledger: catalog CRUD and the stock mutation helpers every
//! transaction goes through

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgConnection, PgPool};
use uuid::Uuid;
use validator::Validate;

use crate::error::{AppError, AppResult};
use crate::events::{DomainEvent, EventBus, ProductChange, StockLine};
use crate::services::company::inventory_policy;
use shared::{
    ensure_available, validate_price, validate_tax_rate, LineRequest, PricedLine, ProductPricing,
};

const PRODUCT_COLUMNS: &str = "id, company_id, category_id, supplier_id, name, barcode, reference, \
     description, expiry_date, quantity, purchase_price, selling_price, tax_rate, profit, \
     created_at, updated_at";

/// Product service
#[derive(Clone)]
pub struct ProductService {
    db: PgPool,
    events: EventBus,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Product {
    pub id: Uuid,
    pub company_id: Uuid,
    pub category_id: Option<Uuid>,
    pub supplier_id: Option<Uuid>,
    pub name: String,
    pub barcode: Option<String>,
    pub reference: Option<String>,
    pub description: Option<String>,
    pub expiry_date: Option<NaiveDate>,
    pub quantity: i32,
    /// Tax-inclusive purchase cost
    pub purchase_price: Decimal,
    pub selling_price: Decimal,
    pub tax_rate: Decimal,
    pub profit: Decimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Product {
    pub fn stock_line(&self, quantity: i32) -> StockLine {
        StockLine {
            product_id: self.id,
            name: self.name.clone(),
            quantity,
            unit_price: self.selling_price,
        }
    }
}

/// Product with its category and supplier names
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct ProductListing {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub product: Product,
    pub category_name: Option<String>,
    pub supplier_name: Option<String>,
}

#[derive(Debug, FromRow)]
struct UpsertedProduct {
    #[sqlx(flatten)]
    product: Product,
    inserted: bool,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateProductInput {
    #[validate(length(min = 1, message = "Name is required"))]
    pub name: String,
    pub barcode: Option<String>,
    pub reference: Option<String>,
    pub description: Option<String>,
    pub expiry_date: Option<NaiveDate>,
    #[validate(range(min = 0, message = "Quantity cannot be negative"))]
    pub quantity: i32,
    /// Purchase cost before tax
    pub purchase_price: Decimal,
    pub selling_price: Option<Decimal>,
    /// Percent; the company default applies when omitted
    pub tax_rate: Option<Decimal>,
    pub category_id: Option<Uuid>,
    pub supplier_id: Option<Uuid>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateProductInput {
    #[validate(length(min = 1, message = "Name cannot be empty"))]
    pub name: Option<String>,
    pub barcode: Option<String>,
    pub reference: Option<String>,
    pub description: Option<String>,
    pub expiry_date: Option<NaiveDate>,
    #[validate(range(min = 0, message = "Quantity cannot be negative"))]
    pub quantity: Option<i32>,
    /// Purchase cost before tax; prices are recomputed when any price field changes
    pub purchase_price: Option<Decimal>,
    pub selling_price: Option<Decimal>,
    pub tax_rate: Option<Decimal>,
    pub category_id: Option<Uuid>,
    pub supplier_id: Option<Uuid>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProductStats {
    pub total_products: i64,
    pub total_quantity: i64,
}

// ============================================================================
// Stock mutation helpers
// ============================================================================

/// Take units off the shelf inside an open transaction.
///
/// The decrement only applies while enough stock is left, so two concurrent
/// callers can never both take the last unit.
pub async fn take_stock(
    conn: &mut PgConnection,
    company_id: Uuid,
    product_id: Uuid,
    quantity: i32,
) -> AppResult<()> {
    let result = sqlx::query(
        r#"
        UPDATE products
        SET quantity = quantity - $1, updated_at = NOW()
        WHERE id = $2 AND company_id = $3 AND quantity >= $1
        "#,
    )
    .bind(quantity)
    .bind(product_id)
    .bind(company_id)
    .execute(&mut *conn)
    .await?;

    if result.rows_affected() == 1 {
        return Ok(());
    }

    let current = sqlx::query_as::<_, (String, i32)>(
        "SELECT name, quantity FROM products WHERE id = $1 AND company_id = $2",
    )
    .bind(product_id)
    .bind(company_id)
    .fetch_optional(&mut *conn)
    .await?;

    match current {
        Some((name, available)) => Err(AppError::InsufficientStock {
            product: name,
            requested: quantity,
            available,
        }),
        None => Err(AppError::NotFound("Product".to_string())),
    }
}

/// Put units back on the shelf inside an open transaction
pub async fn put_back_stock(
    conn: &mut PgConnection,
    company_id: Uuid,
    product_id: Uuid,
    quantity: i32,
) -> AppResult<()> {
    let result = sqlx::query(
        r#"
        UPDATE products
        SET quantity = quantity + $1, updated_at = NOW()
        WHERE id = $2 AND company_id = $3
        "#,
    )
    .bind(quantity)
    .bind(product_id)
    .bind(company_id)
    .execute(&mut *conn)
    .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("Product".to_string()));
    }

    Ok(())
}

/// Lock the tenant's products for a transaction, in id order.
///
/// Fails with `NotFound` if any id is missing or belongs to another company.
pub(crate) async fn lock_products(
    conn: &mut PgConnection,
    company_id: Uuid,
    product_ids: &[Uuid],
) -> AppResult<Vec<Product>> {
    let products = sqlx::query_as::<_, Product>(&format!(
        "SELECT {} FROM products WHERE company_id = $1 AND id = ANY($2) ORDER BY id FOR UPDATE",
        PRODUCT_COLUMNS
    ))
    .bind(company_id)
    .bind(product_ids)
    .fetch_all(&mut *conn)
    .await?;

    if let Some(missing) = product_ids
        .iter()
        .find(|id| !products.iter().any(|p| p.id == **id))
    {
        return Err(AppError::NotFound(format!("Product {}", missing)));
    }

    Ok(products)
}

fn check_prices(purchase: Decimal, selling: Option<Decimal>, tax_rate: Decimal) -> AppResult<()> {
    validate_price(purchase).map_err(|m| AppError::validation("purchase_price", m))?;
    if let Some(selling) = selling {
        validate_price(selling).map_err(|m| AppError::validation("selling_price", m))?;
    }
    validate_tax_rate(tax_rate).map_err(|m| AppError::validation("tax_rate", m))?;
    Ok(())
}

/// Back out the pre-tax purchase cost from a stored tax-inclusive one
fn raw_purchase_price(product: &Product) -> Decimal {
    let factor = Decimal::ONE + product.tax_rate / Decimal::ONE_HUNDRED;
    if factor.is_zero() {
        product.purchase_price
    } else {
        (product.purchase_price / factor).round_dp(2)
    }
}

impl ProductService {
    pub fn new(db: PgPool, events: EventBus) -> Self {
        Self { db, events }
    }

    /// Create a product, or restock it when the barcode already exists for the company
    pub async fn create_product(
        &self,
        company_id: Uuid,
        user_id: Uuid,
        input: CreateProductInput,
    ) -> AppResult<Product> {
        input.validate()?;

        let tax_rate = match input.tax_rate {
            Some(rate) => rate,
            None => inventory_policy(&self.db, company_id).await?.default_tax_rate,
        };
        check_prices(input.purchase_price, input.selling_price, tax_rate)?;
        self.check_references(company_id, input.category_id, input.supplier_id)
            .await?;

        let pricing = ProductPricing::derive(input.purchase_price, input.selling_price, tax_rate);
        let barcode = input.barcode.filter(|b| !b.trim().is_empty());

        let upserted = sqlx::query_as::<_, UpsertedProduct>(&format!(
            r#"
            INSERT INTO products (
                company_id, category_id, supplier_id, name, barcode, reference, description,
                expiry_date, quantity, purchase_price, selling_price, tax_rate, profit
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            ON CONFLICT (company_id, barcode) DO UPDATE
            SET quantity = products.quantity + EXCLUDED.quantity,
                purchase_price = EXCLUDED.purchase_price,
                selling_price = EXCLUDED.selling_price,
                tax_rate = EXCLUDED.tax_rate,
                profit = EXCLUDED.profit,
                expiry_date = COALESCE(EXCLUDED.expiry_date, products.expiry_date),
                updated_at = NOW()
            RETURNING {}, (xmax = 0) AS inserted
            "#,
            PRODUCT_COLUMNS
        ))
        .bind(company_id)
        .bind(input.category_id)
        .bind(input.supplier_id)
        .bind(&input.name)
        .bind(&barcode)
        .bind(&input.reference)
        .bind(&input.description)
        .bind(input.expiry_date)
        .bind(input.quantity)
        .bind(pricing.purchase_price)
        .bind(pricing.selling_price)
        .bind(tax_rate)
        .bind(pricing.profit)
        .fetch_one(&self.db)
        .await?;

        let product = upserted.product;
        let change = if upserted.inserted {
            ProductChange::Created
        } else {
            ProductChange::Restocked
        };
        tracing::info!(product_id = %product.id, ?change, quantity = product.quantity, "Product saved");

        self.events.publish(DomainEvent::ProductChanged {
            company_id,
            actor_id: user_id,
            change,
            line: product.stock_line(input.quantity),
        });

        Ok(product)
    }

    pub async fn list_products(&self, company_id: Uuid) -> AppResult<Vec<ProductListing>> {
        let products = sqlx::query_as::<_, ProductListing>(
            r#"
            SELECT p.id, p.company_id, p.category_id, p.supplier_id, p.name, p.barcode,
                   p.reference, p.description, p.expiry_date, p.quantity, p.purchase_price,
                   p.selling_price, p.tax_rate, p.profit, p.created_at, p.updated_at,
                   c.name AS category_name, s.name AS supplier_name
            FROM products p
            LEFT JOIN categories c ON c.id = p.category_id
            LEFT JOIN suppliers s ON s.id = p.supplier_id
            WHERE p.company_id = $1
            ORDER BY p.name
            "#,
        )
        .bind(company_id)
        .fetch_all(&self.db)
        .await?;

        Ok(products)
    }

    pub async fn get_product(&self, company_id: Uuid, product_id: Uuid) -> AppResult<Product> {
        sqlx::query_as::<_, Product>(&format!(
            "SELECT {} FROM products WHERE id = $1 AND company_id = $2",
            PRODUCT_COLUMNS
        ))
        .bind(product_id)
        .bind(company_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Product".to_string()))
    }

    pub async fn update_product(
        &self,
        company_id: Uuid,
        user_id: Uuid,
        product_id: Uuid,
        input: UpdateProductInput,
    ) -> AppResult<Product> {
        input.validate()?;
        let existing = self.get_product(company_id, product_id).await?;

        let tax_rate = input.tax_rate.unwrap_or(existing.tax_rate);
        let raw_purchase = input
            .purchase_price
            .unwrap_or_else(|| raw_purchase_price(&existing));
        let selling = input.selling_price.or(Some(existing.selling_price));
        check_prices(raw_purchase, selling, tax_rate)?;
        self.check_references(company_id, input.category_id, input.supplier_id)
            .await?;

        let pricing = if input.purchase_price.is_some()
            || input.selling_price.is_some()
            || input.tax_rate.is_some()
        {
            ProductPricing::derive(raw_purchase, selling, tax_rate)
        } else {
            ProductPricing {
                purchase_price: existing.purchase_price,
                selling_price: existing.selling_price,
                profit: existing.profit,
            }
        };

        let product = sqlx::query_as::<_, Product>(&format!(
            r#"
            UPDATE products
            SET name = COALESCE($1, name),
                barcode = COALESCE($2, barcode),
                reference = COALESCE($3, reference),
                description = COALESCE($4, description),
                expiry_date = COALESCE($5, expiry_date),
                quantity = COALESCE($6, quantity),
                purchase_price = $7,
                selling_price = $8,
                tax_rate = $9,
                profit = $10,
                category_id = COALESCE($11, category_id),
                supplier_id = COALESCE($12, supplier_id),
                updated_at = NOW()
            WHERE id = $13 AND company_id = $14
            RETURNING {}
            "#,
            PRODUCT_COLUMNS
        ))
        .bind(&input.name)
        .bind(&input.barcode)
        .bind(&input.reference)
        .bind(&input.description)
        .bind(input.expiry_date)
        .bind(input.quantity)
        .bind(pricing.purchase_price)
        .bind(pricing.selling_price)
        .bind(tax_rate)
        .bind(pricing.profit)
        .bind(input.category_id)
        .bind(input.supplier_id)
        .bind(product_id)
        .bind(company_id)
        .fetch_optional(&self.db)
        .await
        .map_err(|e| {
            AppError::on_unique_violation(e, "barcode", "Another product already uses this barcode")
        })?
        .ok_or_else(|| AppError::NotFound("Product".to_string()))?;

        self.events.publish(DomainEvent::ProductChanged {
            company_id,
            actor_id: user_id,
            change: ProductChange::Updated,
            line: product.stock_line(product.quantity),
        });

        Ok(product)
    }

    pub async fn delete_product(
        &self,
        company_id: Uuid,
        user_id: Uuid,
        product_id: Uuid,
    ) -> AppResult<()> {
        let deleted = sqlx::query_as::<_, Product>(&format!(
            "DELETE FROM products WHERE id = $1 AND company_id = $2 RETURNING {}",
            PRODUCT_COLUMNS
        ))
        .bind(product_id)
        .bind(company_id)
        .fetch_optional(&self.db)
        .await
        .map_err(|e| match &e {
            sqlx::Error::Database(db_err) if db_err.is_foreign_key_violation() => {
                AppError::conflict("product", "Product has returns on record and cannot be deleted")
            }
            _ => AppError::DatabaseError(e),
        })?
        .ok_or_else(|| AppError::NotFound("Product".to_string()))?;

        self.events.publish(DomainEvent::ProductChanged {
            company_id,
            actor_id: user_id,
            change: ProductChange::Deleted,
            line: deleted.stock_line(deleted.quantity),
        });

        Ok(())
    }

    /// Product count and units on hand
    pub async fn stats(&self, company_id: Uuid) -> AppResult<ProductStats> {
        let (total_products, total_quantity) = sqlx::query_as::<_, (i64, i64)>(
            "SELECT COUNT(*), COALESCE(SUM(quantity), 0)::BIGINT FROM products WHERE company_id = $1",
        )
        .bind(company_id)
        .fetch_one(&self.db)
        .await?;

        Ok(ProductStats {
            total_products,
            total_quantity,
        })
    }

    async fn check_references(
        &self,
        company_id: Uuid,
        category_id: Option<Uuid>,
        supplier_id: Option<Uuid>,
    ) -> AppResult<()> {
        if let Some(category_id) = category_id {
            let exists = sqlx::query_scalar::<_, bool>(
                "SELECT EXISTS(SELECT 1 FROM categories WHERE id = $1 AND company_id = $2)",
            )
            .bind(category_id)
            .bind(company_id)
            .fetch_one(&self.db)
            .await?;
            if !exists {
                return Err(AppError::NotFound("Category".to_string()));
            }
        }

        if let Some(supplier_id) = supplier_id {
            let exists = sqlx::query_scalar::<_, bool>(
                "SELECT EXISTS(SELECT 1 FROM suppliers WHERE id = $1 AND company_id = $2)",
            )
            .bind(supplier_id)
            .bind(company_id)
            .fetch_one(&self.db)
            .await?;
            if !exists {
                return Err(AppError::NotFound("Supplier".to_string()));
            }
        }

        Ok(())
    }
}

/// Price requested lines against locked products, checking availability.
///
/// `lines` and `products` are both in product id order.
pub(crate) fn price_lines<'a>(
    lines: &[LineRequest],
    products: &'a [Product],
) -> AppResult<Vec<(PricedLine, &'a Product)>> {
    lines
        .iter()
        .map(|line| {
            let product = products
                .iter()
                .find(|p| p.id == line.product_id)
                .ok_or_else(|| AppError::NotFound(format!("Product {}", line.product_id)))?;

            ensure_available(line.quantity, product.quantity).map_err(|_| {
                AppError::InsufficientStock {
                    product: product.name.clone(),
                    requested: line.quantity,
                    available: product.quantity,
                }
            })?;

            let priced = PricedLine {
                quantity: line.quantity,
                unit_price: product.selling_price,
                purchase_price: product.purchase_price,
                tax_rate: product.tax_rate,
            };
            Ok((priced, product))
        })
        .collect()
}
