use std::path::PathBuf;
use std::str::FromStr;

use config::{Config, ConfigError, Environment};
use serde::{Deserialize, Serialize};

/// Where records and accounts are kept
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    Postgres,
    /// Process memory; everything is lost on restart
    Memory,
}

impl FromStr for StorageBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "postgres" | "postgresql" => Ok(StorageBackend::Postgres),
            "memory" => Ok(StorageBackend::Memory),
            other => anyhow::bail!("unknown storage backend '{other}', expected postgres or memory"),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ServiceConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,

    // HTTP server
    #[serde(default = "default_http_host")]
    pub http_host: String,

    #[serde(default = "default_http_port")]
    pub http_port: u16,

    /// CORS allowed origins (comma-separated list, "*" for all origins)
    #[serde(default = "default_cors_allowed_origins")]
    pub cors_allowed_origins: String,

    /// Path prefixes left out of the request log (comma-separated)
    #[serde(default = "default_http_ignored_paths")]
    pub http_ignored_paths: String,

    /// Directory holding the dashboard front-end; empty disables it
    #[serde(default = "default_static_dir")]
    pub static_dir: String,

    /// `postgres` or `memory`
    #[serde(default = "default_storage_backend")]
    pub storage_backend: String,

    // PostgreSQL
    #[serde(default = "default_postgres_host")]
    pub postgres_host: String,

    #[serde(default = "default_postgres_port")]
    pub postgres_port: u16,

    #[serde(default = "default_postgres_database")]
    pub postgres_database: String,

    #[serde(default = "default_postgres_username")]
    pub postgres_username: String,

    #[serde(default = "default_postgres_password")]
    pub postgres_password: String,

    #[serde(default = "default_postgres_max_pool_size")]
    pub postgres_max_pool_size: usize,

    // JWT
    /// JWT signing secret (required for production)
    #[serde(default = "default_jwt_secret")]
    pub jwt_secret: String,

    #[serde(default = "default_jwt_expiration_hours")]
    pub jwt_expiration_hours: u64,

    // Access policy
    /// Allow anonymous listing of regions
    #[serde(default)]
    pub public_region_list: bool,

    // First super account, created when no super account exists
    #[serde(default)]
    pub bootstrap_admin_username: Option<String>,

    #[serde(default)]
    pub bootstrap_admin_password: Option<String>,

    // OpenTelemetry
    #[serde(default = "default_otel_endpoint")]
    pub otel_endpoint: String,

    #[serde(default = "default_otel_enabled")]
    pub otel_enabled: bool,

    #[serde(default = "default_otel_service_name")]
    pub otel_service_name: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

// HTTP defaults
fn default_http_host() -> String {
    "0.0.0.0".to_string()
}

fn default_http_port() -> u16 {
    8080
}

fn default_cors_allowed_origins() -> String {
    "*".to_string()
}

fn default_http_ignored_paths() -> String {
    "/healthz,/assets/".to_string()
}

fn default_static_dir() -> String {
    "public".to_string()
}

fn default_storage_backend() -> String {
    "postgres".to_string()
}

// PostgreSQL defaults
fn default_postgres_host() -> String {
    "localhost".to_string()
}

fn default_postgres_port() -> u16 {
    5432
}

fn default_postgres_database() -> String {
    "backoffice".to_string()
}

fn default_postgres_username() -> String {
    "backoffice".to_string()
}

fn default_postgres_password() -> String {
    "backoffice".to_string()
}

fn default_postgres_max_pool_size() -> usize {
    5
}

// JWT defaults
fn default_jwt_secret() -> String {
    "change-me-in-production".to_string()
}

fn default_jwt_expiration_hours() -> u64 {
    24
}

// OpenTelemetry defaults
fn default_otel_endpoint() -> String {
    "http://localhost:4317".to_string()
}

fn default_otel_enabled() -> bool {
    false
}

fn default_otel_service_name() -> String {
    "backoffice".to_string()
}

/// Split a comma-separated setting, dropping blanks
fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

impl ServiceConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Config::builder()
            .add_source(Environment::with_prefix("BACKOFFICE"))
            .build()?
            .try_deserialize()
    }

    pub fn storage_backend(&self) -> anyhow::Result<StorageBackend> {
        self.storage_backend.parse()
    }

    pub fn http_ignored_paths(&self) -> Vec<String> {
        split_list(&self.http_ignored_paths)
    }

    pub fn static_dir(&self) -> Option<PathBuf> {
        let dir = self.static_dir.trim();
        (!dir.is_empty()).then(|| PathBuf::from(dir))
    }

    /// Bootstrap credentials, when both are set
    pub fn bootstrap_admin(&self) -> Option<(&str, &str)> {
        match (&self.bootstrap_admin_username, &self.bootstrap_admin_password) {
            (Some(username), Some(password)) if !username.is_empty() && !password.is_empty() => {
                Some((username.as_str(), password.as_str()))
            }
            _ => None,
        }
    }
}
