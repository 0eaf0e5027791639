//! Configuration module for the library backend.
//!
//! All configuration is loaded from environment variables with sensible defaults.

use std::env;
use std::fmt;
use std::net::SocketAddr;
use std::path::PathBuf;

/// Default bind address, matching the port the container exposes.
pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8000";

/// Default loan period in days when a loan is created without a due date.
pub const DEFAULT_LOAN_DAYS: i64 = 14;

/// Output format of the fmt logging layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    Json,
}

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Pre-shared key for API authentication (disabled when unset)
    pub api_key: Option<String>,
    /// Path to SQLite database file
    pub db_path: PathBuf,
    /// Path to Tantivy search index directory
    pub index_path: PathBuf,
    /// Address to bind the server to
    pub bind_addr: SocketAddr,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
    pub log_format: LogFormat,
    /// Days until a new loan is due
    pub loan_days: i64,
}

/// Invalid configuration value.
#[derive(Debug)]
pub enum ConfigError {
    BindAddr(String),
    LoanDays(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::BindAddr(v) => write!(f, "invalid LIBRARY_BIND_ADDR: {}", v),
            ConfigError::LoanDays(v) => write!(f, "invalid LIBRARY_LOAN_DAYS: {}", v),
        }
    }
}

impl std::error::Error for ConfigError {}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let api_key = env::var("LIBRARY_API_KEY").ok().filter(|k| !k.is_empty());

        let db_path = env::var("LIBRARY_DB_PATH")
            .unwrap_or_else(|_| "./data/library.sqlite".to_string())
            .into();

        let index_path = env::var("LIBRARY_INDEX_PATH")
            .unwrap_or_else(|_| "./data/index".to_string())
            .into();

        let bind_raw =
            env::var("LIBRARY_BIND_ADDR").unwrap_or_else(|_| DEFAULT_BIND_ADDR.to_string());
        let bind_addr = bind_raw
            .parse()
            .map_err(|_| ConfigError::BindAddr(bind_raw.clone()))?;

        let log_level = env::var("LIBRARY_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        let log_format = match env::var("LIBRARY_LOG_FORMAT").as_deref() {
            Ok("json") => LogFormat::Json,
            _ => LogFormat::Text,
        };

        let loan_days = match env::var("LIBRARY_LOAN_DAYS") {
            Ok(raw) => match raw.parse::<i64>() {
                Ok(days) if days > 0 => days,
                _ => return Err(ConfigError::LoanDays(raw)),
            },
            Err(_) => DEFAULT_LOAN_DAYS,
        };

        Ok(Self {
            api_key,
            db_path,
            index_path,
            bind_addr,
            log_level,
            log_format,
            loan_days,
        })
    }
}
