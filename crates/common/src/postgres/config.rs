use serde::{Deserialize, Serialize};

/// PostgreSQL connection settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostgresConfig {
    pub host: String,
    pub port: u16,
    pub database: String,
    pub username: String,
    pub password: String,
    pub max_pool_size: usize,
}

impl Default for PostgresConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 5432,
            database: "backoffice".to_string(),
            username: "backoffice".to_string(),
            password: "backoffice".to_string(),
            max_pool_size: 10,
        }
    }
}
