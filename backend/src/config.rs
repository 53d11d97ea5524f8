//! Configuration management for the POS back office
//!
//! Supports hierarchical configuration loading:
//! 1. Default values in code
//! 2. Configuration files (config/development.toml, config/production.toml)
//! 3. Environment variable overrides with POS__ prefix

use config::{ConfigError, Environment, File};
use serde::Deserialize;

/// Main application configuration
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// Current environment (development, production)
    pub environment: String,

    pub server: ServerConfig,

    pub database: DatabaseConfig,

    pub jwt: JwtConfig,

    /// Stock and event defaults
    pub inventory: InventoryConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub port: u16,
    pub host: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    /// PostgreSQL connection URL
    pub url: String,

    /// Maximum number of connections in the pool
    pub max_connections: u32,

    /// Minimum number of connections in the pool
    pub min_connections: u32,
}

#[derive(Debug, Deserialize, Clone)]
pub struct JwtConfig {
    /// Secret key for signing JWT tokens
    pub secret: String,

    /// Access token expiration in seconds
    pub access_token_expiry: i64,

    /// Refresh token expiration in seconds
    pub refresh_token_expiry: i64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct InventoryConfig {
    /// Low-stock threshold for companies that have not set their own
    pub low_stock_threshold: i32,

    /// Tax rate (percent) for companies that have not set their own
    pub default_tax_rate: rust_decimal::Decimal,

    /// Capacity of the domain event channel
    pub event_channel_capacity: usize,
}

impl Config {
    /// Load configuration from files and environment variables
    pub fn load() -> Result<Self, ConfigError> {
        let environment = std::env::var("POS_ENVIRONMENT").unwrap_or_else(|_| "development".into());
        Self::load_from(&environment, Environment::with_prefix("POS"))
    }

    /// Build the configuration for `environment` on top of the given
    /// variable source. There is no default signing secret: it must come
    /// from the environment file or `POS__JWT__SECRET`.
    pub fn load_from(environment: &str, env: Environment) -> Result<Self, ConfigError> {
        let config = config::Config::builder()
            .set_default("environment", environment)?
            .set_default("server.port", 3000)?
            .set_default("server.host", "0.0.0.0")?
            .set_default("database.max_connections", 10)?
            .set_default("database.min_connections", 2)?
            .set_default("jwt.access_token_expiry", 3600)?
            .set_default("jwt.refresh_token_expiry", 604800)?
            .set_default(
                "inventory.low_stock_threshold",
                i64::from(shared::DEFAULT_LOW_STOCK_THRESHOLD),
            )?
            .set_default("inventory.default_tax_rate", "16")?
            .set_default("inventory.event_channel_capacity", 256)?
            .add_source(File::with_name(&format!("config/{}", environment)).required(false))
            .add_source(env.separator("__").try_parsing(true))
            .build()?;

        config.try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn variables(pairs: &[(&str, &str)]) -> Environment {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Environment::with_prefix("POS").source(Some(map))
    }

    #[test]
    fn test_missing_jwt_secret_fails_to_load() {
        let env = variables(&[("POS__DATABASE__URL", "postgres://localhost/pos")]);
        let err = Config::load_from("production", env).unwrap_err();
        assert!(err.to_string().contains("secret"));
    }

    #[test]
    fn test_jwt_secret_from_environment() {
        let env = variables(&[
            ("POS__DATABASE__URL", "postgres://localhost/pos"),
            ("POS__JWT__SECRET", "s3cr3t"),
        ]);
        let config = Config::load_from("production", env).unwrap();
        assert_eq!(config.jwt.secret, "s3cr3t");
        assert_eq!(config.environment, "production");
        assert_eq!(config.inventory.event_channel_capacity, 256);
    }
}
