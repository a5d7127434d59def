use std::marker::PhantomData;

use crate::auth::ScopeFilter;
use crate::domain::{
    CreateRecordInput, DomainError, DomainResult, Record, ResourceFields, ResourceStore,
};
use crate::postgres::{store_error, PostgresClient};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tracing::{debug, instrument};

/// Record row; the typed field set is kept in a `jsonb` column
#[derive(Debug, Clone)]
struct RecordRow {
    id: String,
    owner: Option<String>,
    fields: serde_json::Value,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl RecordRow {
    fn from_pg(row: &tokio_postgres::Row) -> Self {
        Self {
            id: row.get(0),
            owner: row.get(1),
            fields: row.get(2),
            created_at: row.get(3),
            updated_at: row.get(4),
        }
    }

    fn into_record<F: ResourceFields>(self) -> DomainResult<Record<F>> {
        let fields = serde_json::from_value(self.fields).map_err(|e| {
            DomainError::StoreUnavailable(anyhow::anyhow!(
                "stored {} {} has unreadable fields: {}",
                F::KIND,
                self.id,
                e
            ))
        })?;

        Ok(Record {
            id: self.id,
            owner: self.owner,
            fields,
            created_at: Some(self.created_at),
            updated_at: Some(self.updated_at),
        })
    }
}

const SELECT_COLUMNS: &str = "id, owner, fields, created_at, updated_at";

fn to_json<F: ResourceFields>(fields: &F) -> DomainResult<serde_json::Value> {
    serde_json::to_value(fields).map_err(|e| DomainError::StoreUnavailable(e.into()))
}

/// PostgreSQL implementation of [`ResourceStore`], one table per record kind
pub struct PostgresResourceStore<F> {
    client: PostgresClient,
    _fields: PhantomData<fn() -> F>,
}

impl<F> Clone for PostgresResourceStore<F> {
    fn clone(&self) -> Self {
        Self {
            client: self.client.clone(),
            _fields: PhantomData,
        }
    }
}

impl<F: ResourceFields> PostgresResourceStore<F> {
    pub fn new(client: PostgresClient) -> Self {
        Self {
            client,
            _fields: PhantomData,
        }
    }
}

#[async_trait]
impl<F: ResourceFields> ResourceStore<F> for PostgresResourceStore<F> {
    #[instrument(skip(self, scope), fields(kind = %F::KIND))]
    async fn list(&self, scope: &ScopeFilter) -> DomainResult<Vec<Record<F>>> {
        let conn = self
            .client
            .get_connection()
            .await
            .map_err(DomainError::StoreUnavailable)?;

        let rows = match scope {
            ScopeFilter::Unrestricted => {
                conn.query(
                    &format!(
                        "SELECT {} FROM {} ORDER BY created_at DESC, id DESC",
                        SELECT_COLUMNS,
                        F::TABLE
                    ),
                    &[],
                )
                .await
            }
            ScopeFilter::OwnedBy(owner) => {
                conn.query(
                    &format!(
                        "SELECT {} FROM {} WHERE owner = $1 ORDER BY created_at DESC, id DESC",
                        SELECT_COLUMNS,
                        F::TABLE
                    ),
                    &[owner],
                )
                .await
            }
        }
        .map_err(store_error)?;

        let records = rows
            .iter()
            .map(|r| RecordRow::from_pg(r).into_record())
            .collect::<DomainResult<Vec<Record<F>>>>()?;

        debug!(count = records.len(), "listed records from database");
        Ok(records)
    }

    #[instrument(skip(self), fields(kind = %F::KIND))]
    async fn get(&self, id: &str) -> DomainResult<Option<Record<F>>> {
        let conn = self
            .client
            .get_connection()
            .await
            .map_err(DomainError::StoreUnavailable)?;

        let row = conn
            .query_opt(
                &format!("SELECT {} FROM {} WHERE id = $1", SELECT_COLUMNS, F::TABLE),
                &[&id],
            )
            .await
            .map_err(store_error)?;

        row.map(|r| RecordRow::from_pg(&r).into_record()).transpose()
    }

    #[instrument(skip(self, input), fields(kind = %F::KIND, id = %input.id))]
    async fn create(&self, input: CreateRecordInput<F>) -> DomainResult<Record<F>> {
        let conn = self
            .client
            .get_connection()
            .await
            .map_err(DomainError::StoreUnavailable)?;

        let fields = to_json(&input.fields)?;
        let now = Utc::now();

        let result = conn
            .execute(
                &format!(
                    "INSERT INTO {} (id, owner, fields, created_at, updated_at)
                     VALUES ($1, $2, $3, $4, $5)",
                    F::TABLE
                ),
                &[&input.id, &input.owner, &fields, &now, &now],
            )
            .await;

        if let Err(e) = result {
            if let Some(db_err) = e.as_db_error() {
                // 23xxx: integrity constraint violation class
                if db_err.code().code().starts_with("23") {
                    return Err(DomainError::ConstraintViolation(db_err.message().to_string()));
                }
            }
            return Err(store_error(e));
        }

        debug!(id = %input.id, owner = ?input.owner, "record created in database");

        Ok(Record {
            id: input.id,
            owner: input.owner,
            fields: input.fields,
            created_at: Some(now),
            updated_at: Some(now),
        })
    }

    #[instrument(skip(self, fields), fields(kind = %F::KIND))]
    async fn update(&self, id: &str, fields: F) -> DomainResult<Record<F>> {
        let conn = self
            .client
            .get_connection()
            .await
            .map_err(DomainError::StoreUnavailable)?;

        let json = to_json(&fields)?;
        let now = Utc::now();

        let row = conn
            .query_opt(
                &format!(
                    "UPDATE {} SET fields = $1, updated_at = $2 WHERE id = $3 RETURNING {}",
                    F::TABLE,
                    SELECT_COLUMNS
                ),
                &[&json, &now, &id],
            )
            .await
            .map_err(store_error)?;

        match row {
            Some(r) => {
                debug!(id = %id, "record updated in database");
                RecordRow::from_pg(&r).into_record()
            }
            None => Err(DomainError::not_found(F::KIND, id)),
        }
    }

    #[instrument(skip(self), fields(kind = %F::KIND))]
    async fn delete(&self, id: &str) -> DomainResult<()> {
        let conn = self
            .client
            .get_connection()
            .await
            .map_err(DomainError::StoreUnavailable)?;

        let rows_affected = conn
            .execute(&format!("DELETE FROM {} WHERE id = $1", F::TABLE), &[&id])
            .await
            .map_err(store_error)?;

        if rows_affected == 0 {
            return Err(DomainError::not_found(F::KIND, id));
        }

        debug!(id = %id, "record deleted from database");
        Ok(())
    }
}
