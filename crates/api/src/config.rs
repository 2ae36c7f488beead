//! Application configuration loaded from environment variables.

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while reading configuration.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("missing required environment variable {0}")]
    Missing(&'static str),

    #[error("invalid value {value:?} for environment variable {var}")]
    Invalid { var: &'static str, value: String },
}

/// A configuration value that must not show up in logs.
#[derive(Clone, PartialEq, Eq)]
pub struct Secret(String);

impl Secret {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Returns the secret value.
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for Secret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Secret([redacted])")
    }
}

/// Server configuration.
///
/// Reads from environment variables:
/// - `HOST` (default `0.0.0.0`), `PORT` (default `5000`), `RUST_LOG` (default `info`)
/// - `DATABASE_URL`: PostgreSQL URL; the in-memory store is used without it
/// - `DB_MAX_CONNECTIONS` (default `10`)
/// - `JWT_SECRET` (required), `JWT_TTL_SECS` (default `3600`)
/// - `BCRYPT_COST` (default `10`)
/// - `RAZORPAY_KEY_ID`, `RAZORPAY_KEY_SECRET` (required), `RAZORPAY_BASE_URL`
/// - `PAYMENT_CURRENCY` (default `INR`)
/// - `UPLOAD_DIR` (default `uploads`)
/// - `CORS_ORIGIN`: comma-separated origins (default `http://localhost:5173`)
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub log_level: String,
    pub database_url: Option<String>,
    pub db_max_connections: u32,
    pub jwt_secret: Secret,
    pub jwt_ttl_secs: i64,
    pub bcrypt_cost: u32,
    pub razorpay_key_id: String,
    pub razorpay_key_secret: Secret,
    pub razorpay_base_url: String,
    pub payment_currency: String,
    pub upload_dir: PathBuf,
    pub cors_origin: String,
}

impl Config {
    pub const DEFAULT_PORT: u16 = 5000;

    /// Loads configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Loads configuration through `lookup`, which returns the value of a variable if set.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        // blank values count as unset
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let required = |key: &'static str| get(key).ok_or(ConfigError::Missing(key));

        Ok(Self {
            host: get("HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            port: parse_or(get("PORT"), "PORT", Self::DEFAULT_PORT)?,
            log_level: get("RUST_LOG").unwrap_or_else(|| "info".to_string()),
            database_url: get("DATABASE_URL"),
            db_max_connections: parse_or(get("DB_MAX_CONNECTIONS"), "DB_MAX_CONNECTIONS", 10)?,
            jwt_secret: Secret::new(required("JWT_SECRET")?),
            jwt_ttl_secs: parse_or(get("JWT_TTL_SECS"), "JWT_TTL_SECS", 3600)?,
            bcrypt_cost: parse_or(get("BCRYPT_COST"), "BCRYPT_COST", 10)?,
            razorpay_key_id: required("RAZORPAY_KEY_ID")?,
            razorpay_key_secret: Secret::new(required("RAZORPAY_KEY_SECRET")?),
            razorpay_base_url: get("RAZORPAY_BASE_URL")
                .unwrap_or_else(|| "https://api.razorpay.com".to_string()),
            payment_currency: get("PAYMENT_CURRENCY").unwrap_or_else(|| "INR".to_string()),
            upload_dir: get("UPLOAD_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("uploads")),
            cors_origin: get("CORS_ORIGIN")
                .unwrap_or_else(|| "http://localhost:5173".to_string()),
        })
    }

    /// Returns the `"host:port"` bind address string.
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse_or<T: std::str::FromStr>(
    raw: Option<String>,
    var: &'static str,
    default: T,
) -> Result<T, ConfigError> {
    match raw {
        None => Ok(default),
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { var, value }),
    }
}
