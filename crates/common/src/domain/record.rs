use std::fmt;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use garde::Validate;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::auth::{ResourceKind, ScopeFilter};
use crate::domain::result::DomainResult;

/// Field set of one kind of back-office record (tour, sale, ...)
pub trait ResourceFields:
    Serialize + DeserializeOwned + Validate<Context = ()> + Clone + fmt::Debug + Send + Sync + 'static
{
    const KIND: ResourceKind;

    /// Table the PostgreSQL store keeps this kind in
    const TABLE: &'static str;
}

/// A persisted record with its owning staff username
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record<F> {
    pub id: String,
    pub owner: Option<String>,
    #[serde(flatten)]
    pub fields: F,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// Store input for creating a record (id generated and owner resolved by the service)
#[derive(Debug, Clone, PartialEq)]
pub struct CreateRecordInput<F> {
    pub id: String,
    pub owner: Option<String>,
    pub fields: F,
}

/// Persistence for records of one kind.
///
/// Implementations apply the scope they are handed and never make access
/// decisions of their own.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait ResourceStore<F: ResourceFields>: Send + Sync {
    /// List records visible under `scope`, newest first
    async fn list(&self, scope: &ScopeFilter) -> DomainResult<Vec<Record<F>>>;

    async fn get(&self, id: &str) -> DomainResult<Option<Record<F>>>;

    async fn create(&self, input: CreateRecordInput<F>) -> DomainResult<Record<F>>;

    /// Replace a record's fields; `ResourceNotFound` if it does not exist
    async fn update(&self, id: &str, fields: F) -> DomainResult<Record<F>>;

    /// `ResourceNotFound` if it does not exist
    async fn delete(&self, id: &str) -> DomainResult<()>;
}
