use crate::domain::{
    DocumentFields, RegionFields, ResourceFields, SaleFields, TargetFields, TourFields,
};
use crate::postgres::PostgresClient;
use anyhow::Result;
use tracing::{debug, info};

const USERS_TABLE: &str = "CREATE TABLE IF NOT EXISTS users (
    id TEXT PRIMARY KEY,
    username TEXT NOT NULL UNIQUE,
    password_hash TEXT NOT NULL,
    role TEXT NOT NULL CHECK (role IN ('super', 'semi', 'basic')),
    created_at TIMESTAMPTZ NOT NULL,
    updated_at TIMESTAMPTZ NOT NULL
)";

fn record_table(table: &str) -> String {
    format!(
        "CREATE TABLE IF NOT EXISTS {table} (
    id TEXT PRIMARY KEY,
    owner TEXT,
    fields JSONB NOT NULL,
    created_at TIMESTAMPTZ NOT NULL,
    updated_at TIMESTAMPTZ NOT NULL
);
CREATE INDEX IF NOT EXISTS {table}_owner_idx ON {table} (owner);"
    )
}

/// Statements creating every table the stores use
pub fn schema_statements() -> Vec<String> {
    vec![
        USERS_TABLE.to_string(),
        record_table(TourFields::TABLE),
        record_table(SaleFields::TABLE),
        record_table(DocumentFields::TABLE),
        record_table(RegionFields::TABLE),
        record_table(TargetFields::TABLE),
    ]
}

/// Create missing tables. Existing tables are left as they are.
pub async fn ensure_schema(client: &PostgresClient) -> Result<()> {
    let conn = client.get_connection().await?;
    for statement in schema_statements() {
        conn.batch_execute(&statement).await?;
    }
    debug!(tables = 6, "schema statements applied");
    info!("database schema ready");
    Ok(())
}
