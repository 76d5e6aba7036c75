//! API configuration module.
//!
//! Configuration is loaded from environment variables with fallback to defaults.

use std::env;
use std::str::FromStr;

use bazaar_core::{Money, PricingPolicy, DEFAULT_DELIVERY_FEE_CENTS};
use bazaar_db::DbConfig;

/// API server configuration.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// HTTP server port
    pub http_port: u16,

    /// SQLite database file
    pub database_path: String,

    /// Pool size
    pub database_max_connections: u32,

    /// JWT secret key for verifying (and, in tooling, signing) tokens
    pub jwt_secret: String,

    /// Lifetime of tokens issued by [`JwtManager`](crate::auth::JwtManager)
    pub jwt_access_lifetime_secs: i64,

    /// Flat delivery fee added to every bill, in cents
    pub delivery_fee_cents: i64,
}

impl ApiConfig {
    /// Load configuration from environment variables.
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration from any key lookup (tests pass a map).
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let config = ApiConfig {
            http_port: parse_or(&lookup, "HTTP_PORT", 8080)?,

            database_path: lookup("DATABASE_PATH")
                .unwrap_or_else(|| "./data/bazaar.db".to_string()),

            database_max_connections: parse_or(&lookup, "DATABASE_MAX_CONNECTIONS", 5)?,

            jwt_secret: lookup("JWT_SECRET")
                // Development only; production MUST set JWT_SECRET
                .unwrap_or_else(|| "bazaar-dev-secret-change-in-production".to_string()),

            jwt_access_lifetime_secs: parse_or(&lookup, "JWT_ACCESS_LIFETIME_SECS", 3600)?,

            delivery_fee_cents: parse_or(
                &lookup,
                "DELIVERY_FEE_CENTS",
                DEFAULT_DELIVERY_FEE_CENTS,
            )?,
        };

        if config.delivery_fee_cents < 0 {
            return Err(ConfigError::InvalidValue("DELIVERY_FEE_CENTS".to_string()));
        }
        if config.database_max_connections == 0 {
            return Err(ConfigError::InvalidValue(
                "DATABASE_MAX_CONNECTIONS".to_string(),
            ));
        }

        Ok(config)
    }

    pub fn db_config(&self) -> DbConfig {
        DbConfig::new(&self.database_path).max_connections(self.database_max_connections)
    }

    pub fn pricing_policy(&self) -> PricingPolicy {
        PricingPolicy {
            delivery_fee: Money::from_cents(self.delivery_fee_cents),
        }
    }
}

fn parse_or<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: T,
) -> Result<T, ConfigError> {
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidValue(key.to_string())),
        None => Ok(default),
    }
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {0}")]
    InvalidValue(String),
}
