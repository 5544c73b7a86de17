//! Application configuration
//!
//! All runtime options are collected into a single [`AppConfig`] value,
//! constructed once at process start and never mutated. Values come from
//! environment variables (a `.env` file is honored via `dotenvy` in the
//! binary), with defaults for everything except the JWT secret.

use crate::orders::workflow::WriteMode;
use thiserror::Error;

/// Errors raised while loading configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingVar(&'static str),

    #[error("invalid value for {var}: {message}")]
    InvalidValue { var: &'static str, message: String },
}

/// Immutable application configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Socket address the HTTP server binds to
    pub bind_addr: String,

    /// Prefix all API routes are nested under (e.g. `/api/v1`)
    pub api_prefix: String,

    /// MongoDB connection string
    pub mongo_uri: String,

    /// MongoDB database name
    pub database: String,

    /// HS256 secret for issuing and verifying bearer tokens
    pub jwt_secret: String,

    /// Bearer token lifetime, in hours
    pub token_ttl_hours: i64,

    /// API key for the external payment gateway. Recognized but unused by
    /// this service; checkout sessions are delegated to the gateway.
    pub payment_gateway_key: Option<String>,

    /// Reject order line items whose product reference does not resolve.
    /// When disabled, the reference is only checked during aggregation.
    pub strict_product_refs: bool,

    /// How order creation writes to storage (atomic transaction vs.
    /// step-by-step with compensation)
    pub order_write_mode: WriteMode,
}

impl AppConfig {
    /// Load configuration from process environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Load configuration from an arbitrary variable lookup.
    ///
    /// `from_env` delegates here; tests pass a map instead of touching the
    /// process environment.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let jwt_secret = lookup("ESHOP_JWT_SECRET").ok_or(ConfigError::MissingVar("ESHOP_JWT_SECRET"))?;

        let token_ttl_hours = match lookup("ESHOP_TOKEN_TTL_HOURS") {
            Some(raw) => raw.parse::<i64>().map_err(|e| ConfigError::InvalidValue {
                var: "ESHOP_TOKEN_TTL_HOURS",
                message: e.to_string(),
            })?,
            None => 24,
        };

        let strict_product_refs = match lookup("ESHOP_STRICT_PRODUCT_REFS") {
            Some(raw) => parse_bool("ESHOP_STRICT_PRODUCT_REFS", &raw)?,
            None => true,
        };

        let order_write_mode = match lookup("ESHOP_ORDER_WRITE_MODE").as_deref() {
            None | Some("atomic") => WriteMode::Atomic,
            Some("sequential") => WriteMode::Sequential,
            Some(other) => {
                return Err(ConfigError::InvalidValue {
                    var: "ESHOP_ORDER_WRITE_MODE",
                    message: format!("expected `atomic` or `sequential`, got `{other}`"),
                });
            }
        };

        Ok(Self {
            bind_addr: lookup("ESHOP_BIND_ADDR").unwrap_or_else(|| "0.0.0.0:3000".to_string()),
            api_prefix: lookup("ESHOP_API_PREFIX").unwrap_or_else(|| "/api/v1".to_string()),
            mongo_uri: lookup("ESHOP_MONGO_URI")
                .unwrap_or_else(|| "mongodb://localhost:27017".to_string()),
            database: lookup("ESHOP_DATABASE").unwrap_or_else(|| "eshop".to_string()),
            jwt_secret,
            token_ttl_hours,
            payment_gateway_key: lookup("ESHOP_PAYMENT_GATEWAY_KEY"),
            strict_product_refs,
            order_write_mode,
        })
    }
}

fn parse_bool(var: &'static str, raw: &str) -> Result<bool, ConfigError> {
    match raw {
        "1" | "true" | "yes" => Ok(true),
        "0" | "false" | "no" => Ok(false),
        other => Err(ConfigError::InvalidValue {
            var,
            message: format!("expected a boolean, got `{other}`"),
        }),
    }
}
