//! Route definitions for the POS back office API

use axum::{
    middleware,
    routing::{delete, get, patch, post, put},
    Router,
};

use crate::{handlers, middleware::auth_middleware, AppState};

/// Create API routes
pub fn api_routes() -> Router<AppState> {
    Router::new()
        // Health check (public)
        .route("/health", get(handlers::health_check))
        .nest("/auth", auth_routes())
        .nest("/companies", company_routes())
        .nest("/users", user_routes())
        .nest("/categories", category_routes())
        .nest("/suppliers", supplier_routes())
        .nest("/customers", customer_routes())
        .nest("/products", product_routes())
        .nest("/sales", sale_routes())
        .nest("/orders", order_routes())
        .nest("/invoices", invoice_routes())
        .nest("/returns", return_routes())
        .nest("/movements", movement_routes())
        .nest("/notifications", notification_routes())
        .nest("/stock-check", stock_check_routes())
        .nest("/employees", employee_routes())
        .nest("/attendance", attendance_routes())
        .nest("/payrolls", payroll_routes())
        .nest("/vacations", vacation_routes())
        .nest("/settings", setting_routes())
        .nest("/dashboard", dashboard_routes())
}

/// Authentication routes: register, login and refresh are public
fn auth_routes() -> Router<AppState> {
    let protected = Router::new()
        .route(
            "/profile",
            get(handlers::get_profile).put(handlers::update_profile),
        )
        .route("/change-password", put(handlers::change_password))
        .route("/assign-company", patch(handlers::assign_company))
        .route_layer(middleware::from_fn(auth_middleware));

    Router::new()
        .route("/register", post(handlers::register))
        .route("/login", post(handlers::login))
        .route("/refresh", post(handlers::refresh))
        .merge(protected)
}

fn company_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(handlers::list_companies).post(handlers::create_company),
        )
        .route(
            "/:company_id",
            get(handlers::get_company)
                .put(handlers::update_company)
                .delete(handlers::delete_company),
        )
        .route_layer(middleware::from_fn(auth_middleware))
}

fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::list_users))
        .route_layer(middleware::from_fn(auth_middleware))
}

fn category_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(handlers::list_categories).post(handlers::create_category),
        )
        .route(
            "/:category_id",
            put(handlers::update_category).delete(handlers::delete_category),
        )
        .route_layer(middleware::from_fn(auth_middleware))
}

fn supplier_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(handlers::list_suppliers).post(handlers::create_supplier),
        )
        .route(
            "/:supplier_id",
            get(handlers::get_supplier)
                .put(handlers::update_supplier)
                .delete(handlers::delete_supplier),
        )
        .route_layer(middleware::from_fn(auth_middleware))
}

fn customer_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(handlers::list_customers).post(handlers::create_customer),
        )
        .route(
            "/:customer_id",
            get(handlers::get_customer)
                .put(handlers::update_customer)
                .delete(handlers::delete_customer),
        )
        .route_layer(middleware::from_fn(auth_middleware))
}

/// Product ledger routes (protected)
fn product_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(handlers::list_products).post(handlers::create_product),
        )
        .route("/stats", get(handlers::product_stats))
        .route(
            "/:product_id",
            get(handlers::get_product)
                .put(handlers::update_product)
                .delete(handlers::delete_product),
        )
        .route_layer(middleware::from_fn(auth_middleware))
}

/// Point-of-sale routes (protected)
fn sale_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::list_sales).post(handlers::create_sale))
        .route("/recent", get(handlers::recent_sales))
        .route("/stats", get(handlers::sales_stats))
        .route("/top-products", get(handlers::top_products))
        .route("/report", get(handlers::sales_report))
        .route("/report/export", get(handlers::export_sales_report))
        .route("/search", get(handlers::search_sales))
        .route("/:sale_id", get(handlers::get_sale))
        .route_layer(middleware::from_fn(auth_middleware))
}

/// Order lifecycle routes (protected)
fn order_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::list_orders).post(handlers::create_order))
        .route("/recent", get(handlers::recent_orders))
        .route("/by-date", get(handlers::orders_by_date))
        .route(
            "/:order_id",
            get(handlers::get_order)
                .patch(handlers::update_order)
                .delete(handlers::delete_order),
        )
        .route(
            "/:order_id/start-processing",
            patch(handlers::start_processing_order),
        )
        .route("/:order_id/complete", patch(handlers::complete_order))
        .route("/:order_id/cancel", patch(handlers::cancel_order))
        .route_layer(middleware::from_fn(auth_middleware))
}

fn invoice_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(handlers::list_invoices).post(handlers::issue_invoice),
        )
        .route("/:invoice_id", get(handlers::get_invoice))
        .route_layer(middleware::from_fn(auth_middleware))
}

fn return_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::list_returns).post(handlers::create_return))
        .route(
            "/:return_id",
            get(handlers::get_return).delete(handlers::delete_return),
        )
        .route_layer(middleware::from_fn(auth_middleware))
}

/// Audit trail routes (protected)
fn movement_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(handlers::list_movements).post(handlers::create_movement),
        )
        .route("/recent", get(handlers::recent_movements))
        .route(
            "/:movement_id",
            delete(handlers::delete_movement),
        )
        .route_layer(middleware::from_fn(auth_middleware))
}

/// Notification routes (protected)
fn notification_routes() -> Router<AppState> {
    Router::new()
        .route("/pending", get(handlers::pending_notifications))
        .route("/unread-count", get(handlers::unread_count))
        .route("/read-all", patch(handlers::mark_all_notifications_read))
        .route(
            "/:notification_id/read",
            patch(handlers::mark_notification_read),
        )
        .route_layer(middleware::from_fn(auth_middleware))
}

fn stock_check_routes() -> Router<AppState> {
    Router::new()
        .route("/:product_id", get(handlers::check_stock))
        .route_layer(middleware::from_fn(auth_middleware))
}

fn employee_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(handlers::list_employees).post(handlers::create_employee),
        )
        .route(
            "/active-with-attendance",
            get(handlers::active_employees_with_attendance),
        )
        .route(
            "/:employee_id",
            get(handlers::get_employee)
                .put(handlers::update_employee)
                .delete(handlers::delete_employee),
        )
        .route_layer(middleware::from_fn(auth_middleware))
}

/// Attendance and monthly aggregates (protected)
fn attendance_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::list_attendance).post(handlers::check_in))
        .route("/by-date", get(handlers::attendance_by_date))
        .route("/active-with-status", get(handlers::active_with_status))
        .route("/report", get(handlers::attendance_report))
        .route(
            "/by-employee/:employee_id",
            get(handlers::attendance_by_employee),
        )
        .route(
            "/absences/:employee_id",
            get(handlers::employee_absences),
        )
        .route("/hours/:employee_id", get(handlers::employee_worked_hours))
        .route(
            "/:attendance_id",
            get(handlers::get_attendance)
                .patch(handlers::check_out)
                .delete(handlers::delete_attendance),
        )
        .route_layer(middleware::from_fn(auth_middleware))
}

fn payroll_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(handlers::list_payrolls).post(handlers::create_payroll),
        )
        .route("/by-month", get(handlers::payrolls_by_month))
        .route("/summary", get(handlers::payroll_summary))
        .route("/employee/:employee_id", get(handlers::payrolls_by_employee))
        .route("/:payroll_id/pay", patch(handlers::mark_payroll_paid))
        .route_layer(middleware::from_fn(auth_middleware))
}

fn vacation_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::list_vacations))
        .route("/request", post(handlers::request_vacation))
        .route(
            "/by-employee/:employee_id",
            get(handlers::vacations_by_employee),
        )
        .route("/:vacation_id/approve", patch(handlers::approve_vacation))
        .route("/:vacation_id/reject", patch(handlers::reject_vacation))
        .route_layer(middleware::from_fn(auth_middleware))
}

fn setting_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::list_settings).post(handlers::create_setting))
        .route(
            "/:key",
            get(handlers::get_setting).put(handlers::update_setting),
        )
        .route_layer(middleware::from_fn(auth_middleware))
}

fn dashboard_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::dashboard_stats))
        .route_layer(middleware::from_fn(auth_middleware))
}
