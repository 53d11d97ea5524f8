//! Stock ledger tests against Postgres
//!
//! - Concurrent takes of the last unit: exactly one succeeds
//! - A sale that cannot be fully served changes nothing
//! - Invoices only for completed orders, and only once
//! - One unread low-stock notification per product
//!
//! Run with `DATABASE_URL` pointing at a Postgres server:
//! `cargo test --test ledger_integration_tests -- --ignored`

use pos_stock_backend::error::AppError;
use pos_stock_backend::events::EventBus;
use pos_stock_backend::services::invoice::IssueInvoiceInput;
use pos_stock_backend::services::order::CreateOrderInput;
use pos_stock_backend::services::product::take_stock;
use pos_stock_backend::services::sale::CreateSaleInput;
use pos_stock_backend::services::{
    InvoiceService, NotificationService, OrderService, SaleService, StockMonitor,
};
use rust_decimal::Decimal;
use shared::LineRequest;
use sqlx::PgPool;
use uuid::Uuid;

// ============================================================================
// Fixtures
// ============================================================================

struct Tenant {
    company_id: Uuid,
    user_id: Uuid,
}

async fn tenant(pool: &PgPool) -> Tenant {
    let company_id = sqlx::query_scalar::<_, Uuid>(
        "INSERT INTO companies (name, low_stock_threshold) VALUES ('Mercearia Central', 10) RETURNING id",
    )
    .fetch_one(pool)
    .await
    .unwrap();

    let user_id = sqlx::query_scalar::<_, Uuid>(
        r#"
        INSERT INTO users (company_id, email, password_hash, name)
        VALUES ($1, $2, 'not-a-real-hash', 'Caixa')
        RETURNING id
        "#,
    )
    .bind(company_id)
    .bind(format!("caixa-{}@example.com", Uuid::new_v4()))
    .fetch_one(pool)
    .await
    .unwrap();

    Tenant {
        company_id,
        user_id,
    }
}

async fn product(pool: &PgPool, company_id: Uuid, name: &str, quantity: i32) -> Uuid {
    sqlx::query_scalar::<_, Uuid>(
        r#"
        INSERT INTO products (company_id, name, quantity, purchase_price, selling_price, tax_rate, profit)
        VALUES ($1, $2, $3, 40, 50, 16, 10)
        RETURNING id
        "#,
    )
    .bind(company_id)
    .bind(name)
    .bind(quantity)
    .fetch_one(pool)
    .await
    .unwrap()
}

async fn employee(pool: &PgPool, company_id: Uuid) -> Uuid {
    sqlx::query_scalar::<_, Uuid>(
        "INSERT INTO employees (company_id, full_name) VALUES ($1, 'Ana Mabunda') RETURNING id",
    )
    .bind(company_id)
    .fetch_one(pool)
    .await
    .unwrap()
}

async fn quantity(pool: &PgPool, product_id: Uuid) -> i32 {
    sqlx::query_scalar::<_, i32>("SELECT quantity FROM products WHERE id = $1")
        .bind(product_id)
        .fetch_one(pool)
        .await
        .unwrap()
}

async fn count(pool: &PgPool, sql: &str, id: Uuid) -> i64 {
    sqlx::query_scalar::<_, i64>(sql)
        .bind(id)
        .fetch_one(pool)
        .await
        .unwrap()
}

// ============================================================================
// Stock
// ============================================================================

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires a Postgres DATABASE_URL"]
async fn test_concurrent_takes_of_last_unit(pool: PgPool) {
    let tenant = tenant(&pool).await;
    let product_id = product(&pool, tenant.company_id, "Pão", 1).await;

    let take = |pool: PgPool| {
        let company_id = tenant.company_id;
        tokio::spawn(async move {
            let mut tx = pool.begin().await?;
            take_stock(&mut *tx, company_id, product_id, 1).await?;
            tx.commit().await?;
            Ok::<(), AppError>(())
        })
    };

    let first = take(pool.clone());
    let second = take(pool.clone());
    let results = [first.await.unwrap(), second.await.unwrap()];

    assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
    assert!(results
        .iter()
        .any(|r| matches!(r, Err(AppError::InsufficientStock { available: 0, .. }))));
    assert_eq!(quantity(&pool, product_id).await, 0);
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires a Postgres DATABASE_URL"]
async fn test_sale_short_on_one_line_changes_nothing(pool: PgPool) {
    let tenant = tenant(&pool).await;
    let rice = product(&pool, tenant.company_id, "Arroz 5kg", 5).await;
    let oil = product(&pool, tenant.company_id, "Óleo 1L", 1).await;

    let service = SaleService::new(pool.clone(), EventBus::new(16));
    let input = CreateSaleInput {
        items: vec![
            LineRequest { product_id: rice, quantity: 2 },
            LineRequest { product_id: oil, quantity: 3 },
        ],
        client_name: Some("Carlos".to_string()),
        amount_paid: None,
        change: None,
    };

    let err = service
        .record_sale(tenant.company_id, tenant.user_id, input)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::InsufficientStock { requested: 3, available: 1, .. }));

    assert_eq!(quantity(&pool, rice).await, 5);
    assert_eq!(quantity(&pool, oil).await, 1);
    assert_eq!(
        count(&pool, "SELECT COUNT(*) FROM sales WHERE company_id = $1", tenant.company_id).await,
        0
    );
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires a Postgres DATABASE_URL"]
async fn test_sale_takes_every_line(pool: PgPool) {
    let tenant = tenant(&pool).await;
    let rice = product(&pool, tenant.company_id, "Arroz 5kg", 5).await;
    let oil = product(&pool, tenant.company_id, "Óleo 1L", 4).await;

    let service = SaleService::new(pool.clone(), EventBus::new(16));
    let input = CreateSaleInput {
        items: vec![
            LineRequest { product_id: rice, quantity: 2 },
            LineRequest { product_id: oil, quantity: 1 },
            LineRequest { product_id: rice, quantity: 1 },
        ],
        client_name: None,
        amount_paid: Some(Decimal::from(500)),
        change: None,
    };

    let recorded = service
        .record_sale(tenant.company_id, tenant.user_id, input)
        .await
        .unwrap();

    assert_eq!(recorded.items.len(), 2);
    // 4 units at 50, 16% tax
    assert_eq!(recorded.sale.total, Decimal::from(232));
    assert_eq!(recorded.sale.change_due, Some(Decimal::from(268)));
    assert_eq!(quantity(&pool, rice).await, 2);
    assert_eq!(quantity(&pool, oil).await, 3);
}

// ============================================================================
// Invoices
// ============================================================================

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires a Postgres DATABASE_URL"]
async fn test_invoice_requires_completed_order_and_is_issued_once(pool: PgPool) {
    let tenant = tenant(&pool).await;
    let employee_id = employee(&pool, tenant.company_id).await;
    let bread = product(&pool, tenant.company_id, "Pão", 20).await;
    let events = EventBus::new(16);

    let orders = OrderService::new(pool.clone(), events.clone());
    let order = orders
        .create_order(
            tenant.company_id,
            tenant.user_id,
            CreateOrderInput {
                employee_id,
                items: vec![LineRequest { product_id: bread, quantity: 4 }],
                notes: None,
                client_name: Some("Restaurante Costa".to_string()),
                payment_method: Some("cash".to_string()),
            },
        )
        .await
        .unwrap();
    assert_eq!(quantity(&pool, bread).await, 16);

    let invoices = InvoiceService::new(pool.clone(), events.clone());
    let issue = || IssueInvoiceInput {
        order_id: order.order.id,
        notes: None,
    };

    let err = invoices
        .issue_invoice(tenant.company_id, tenant.user_id, issue())
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::ValidationError(_)));

    orders
        .start_processing(tenant.company_id, tenant.user_id, order.order.id)
        .await
        .unwrap();
    orders
        .complete_order(tenant.company_id, tenant.user_id, order.order.id)
        .await
        .unwrap();

    let invoice = invoices
        .issue_invoice(tenant.company_id, tenant.user_id, issue())
        .await
        .unwrap();
    assert_eq!(invoice.total, order.order.total);
    // Stock left with the order, not again with the invoice
    assert_eq!(quantity(&pool, bread).await, 16);

    let err = invoices
        .issue_invoice(tenant.company_id, tenant.user_id, issue())
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Conflict { .. }));
    assert_eq!(
        count(&pool, "SELECT COUNT(*) FROM invoices WHERE order_id = $1", order.order.id).await,
        1
    );
}

// ============================================================================
// Low-stock notifications
// ============================================================================

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires a Postgres DATABASE_URL"]
async fn test_one_unread_low_stock_notification_per_product(pool: PgPool) {
    let tenant = tenant(&pool).await;
    let sugar = product(&pool, tenant.company_id, "Açúcar 1kg", 3).await;
    let events = EventBus::new(16);
    let monitor = StockMonitor::new(pool.clone(), events.clone());
    let low_stock_rows =
        "SELECT COUNT(*) FROM notifications WHERE product_id = $1 AND kind = 'low_stock'";

    let first = monitor
        .check_product(tenant.company_id, sugar, None)
        .await
        .unwrap();
    assert!(first.is_low);
    assert!(first.notification_created);

    let second = monitor
        .check_product(tenant.company_id, sugar, None)
        .await
        .unwrap();
    assert!(second.is_low);
    assert!(!second.notification_created);
    assert_eq!(count(&pool, low_stock_rows, sugar).await, 1);

    let notifications = NotificationService::new(pool.clone(), events.clone());
    let notification_id = first.notification_id.unwrap();
    let receipt = notifications
        .mark_read(tenant.company_id, tenant.user_id, notification_id)
        .await
        .unwrap();
    assert_eq!(receipt.unread_count, 0);

    let third = monitor
        .check_product(tenant.company_id, sugar, None)
        .await
        .unwrap();
    assert!(third.notification_created);
    assert_ne!(third.notification_id, Some(notification_id));
    assert_eq!(count(&pool, low_stock_rows, sugar).await, 2);
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires a Postgres DATABASE_URL"]
async fn test_stock_above_threshold_raises_nothing(pool: PgPool) {
    let tenant = tenant(&pool).await;
    let flour = product(&pool, tenant.company_id, "Farinha 2kg", 11).await;
    let monitor = StockMonitor::new(pool.clone(), EventBus::new(16));

    let check = monitor
        .check_product(tenant.company_id, flour, None)
        .await
        .unwrap();
    assert!(!check.is_low);
    assert!(!check.notification_created);
    assert_eq!(
        count(&pool, "SELECT COUNT(*) FROM notifications WHERE product_id = $1", flour).await,
        0
    );
}
