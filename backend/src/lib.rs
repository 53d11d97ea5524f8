//! POS back office server
//!
//! Multi-tenant HTTP API for a retail point of sale: product ledger,
//! sales, orders, invoices and returns kept consistent with stock, plus
//! the staff side (attendance, payroll, vacations) and dashboards.

use axum::{routing::get, Extension, Router};
use std::sync::Arc;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

pub mod config;
pub mod error;
pub mod events;
pub mod handlers;
pub mod middleware;
pub mod routes;
pub mod services;

pub use config::Config;
pub use events::EventBus;
pub use middleware::TokenKeys;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub db: sqlx::PgPool,
    pub config: Arc<Config>,
    pub events: EventBus,
    pub keys: Arc<TokenKeys>,
}

impl AppState {
    pub fn new(db: sqlx::PgPool, config: Config) -> Self {
        let events = EventBus::new(config.inventory.event_channel_capacity);
        let keys = Arc::new(TokenKeys::new(&config.jwt));
        Self {
            db,
            config: Arc::new(config),
            events,
            keys,
        }
    }

    /// Start the audit recorder and the stock monitor
    pub fn spawn_subscribers(&self) {
        services::spawn_movement_recorder(self.db.clone(), &self.events);
        services::spawn_stock_monitor(self.db.clone(), &self.events);
    }
}

/// Create the application router with all routes and middleware
pub fn create_app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(root))
        .route("/health", get(handlers::health_check))
        .route("/ws", get(handlers::ws_handler))
        .nest("/api/v1", routes::api_routes())
        .layer(Extension(state.keys.clone()))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

async fn root() -> &'static str {
    "POS Back Office API v1"
}
