//! Type definitions for book_user_api
//!
//! Contains the shared configuration models and startup error types
//! used throughout the app.

use serde::Deserialize;
use thiserror::Error;

/// Application startup errors
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("Database connection error: {0}")]
    Database(String),
    #[error("Server binding error: {0}")]
    ServerBind(String),
}

impl From<config::ConfigError> for StartupError {
    fn from(err: config::ConfigError) -> Self {
        StartupError::Config(err.to_string())
    }
}

/// Complete app configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub jwt: JwtConfig,
    pub password: PasswordConfig,
    pub mail: MailConfig,
    pub log: LogConfig,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Zero means one worker per physical core (actix default).
    pub workers: usize,
    pub cors_origins: Vec<String>,
}

/// PostgreSQL pool configuration
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: usize,
    pub connect_timeout_secs: u64,
    /// Create the user table on startup when missing.
    pub auto_migrate: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub expiration_hours: i64,
}

/// Password hashing and reset settings
#[derive(Debug, Clone, Deserialize)]
pub struct PasswordConfig {
    /// `md5` (salted digest, compatible with existing rows) or `argon2`.
    pub scheme: String,
    pub salt: String,
    /// Password assigned by the reset-and-mail endpoint.
    pub reset_default: String,
}

/// Outbound mail API settings
///
/// With no `api_url` configured, mail is written to the log instead of sent.
#[derive(Debug, Clone, Deserialize)]
pub struct MailConfig {
    pub api_url: Option<String>,
    pub api_key: Option<String>,
    pub from: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LogConfig {
    pub level: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            database: DatabaseConfig::default(),
            jwt: JwtConfig::default(),
            password: PasswordConfig::default(),
            mail: MailConfig::default(),
            log: LogConfig::default(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            workers: 0,
            cors_origins: vec!["*".to_string()],
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "postgresql://localhost/book".to_string(),
            max_connections: 16,
            connect_timeout_secs: 5,
            auto_migrate: true,
        }
    }
}

impl Default for JwtConfig {
    fn default() -> Self {
        Self {
            secret: "change_me_in_production".to_string(),
            expiration_hours: 24,
        }
    }
}

impl Default for PasswordConfig {
    fn default() -> Self {
        Self {
            scheme: "md5".to_string(),
            salt: "book_salt".to_string(),
            reset_default: "123456789".to_string(),
        }
    }
}

impl Default for MailConfig {
    fn default() -> Self {
        Self {
            api_url: None,
            api_key: None,
            from: "noreply@example.com".to_string(),
        }
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}
