use common::auth::{AccessGuard, Grant, Operation, Principal, ResourceRef};
use common::domain::{
    CreateRecordInput, DomainError, DomainResult, Record, ResourceFields, ResourceStore,
};
use common::validation::validate_struct;
use serde::Deserialize;
use std::sync::Arc;
use tracing::{debug, instrument};

use crate::domain::access::authorize;

/// Create request body: the record's fields plus an optional owner, which is
/// only honoured for elevated roles
#[derive(Debug, Clone, Deserialize)]
pub struct CreateRecordRequest<F> {
    #[serde(default)]
    pub owner: Option<String>,
    #[serde(flatten)]
    pub fields: F,
}

/// Guarded CRUD over one kind of record.
///
/// Every operation gets an access decision before the store is touched for
/// writing; read/update/delete load the record first so its owner can be checked.
pub struct RecordService<F: ResourceFields> {
    store: Arc<dyn ResourceStore<F>>,
    guard: Arc<AccessGuard>,
}

impl<F: ResourceFields> RecordService<F> {
    pub fn new(store: Arc<dyn ResourceStore<F>>, guard: Arc<AccessGuard>) -> Self {
        Self { store, guard }
    }

    fn authorize(
        &self,
        principal: Option<&Principal>,
        operation: Operation,
        owner: Option<&str>,
    ) -> DomainResult<Grant> {
        authorize(
            &self.guard,
            principal,
            operation,
            ResourceRef::owned(F::KIND, owner),
        )
    }

    /// Load `id` and decide `operation` against its owner
    async fn authorize_existing(
        &self,
        principal: Option<&Principal>,
        operation: Operation,
        id: &str,
    ) -> DomainResult<Record<F>> {
        // Anonymous callers never learn whether a record exists
        if principal.is_none() {
            self.authorize(None, operation, None)?;
        }

        let record = self
            .store
            .get(id)
            .await?
            .ok_or_else(|| DomainError::not_found(F::KIND, id))?;

        self.authorize(principal, operation, record.owner.as_deref())?;
        Ok(record)
    }

    #[instrument(skip(self, principal), fields(kind = %F::KIND))]
    pub async fn list(&self, principal: Option<&Principal>) -> DomainResult<Vec<Record<F>>> {
        let grant = self.authorize(principal, Operation::List, None)?;
        let records = self.store.list(&grant.scope).await?;
        debug!(count = records.len(), scope = ?grant.scope, "listed records");
        Ok(records)
    }

    #[instrument(skip(self, principal), fields(kind = %F::KIND))]
    pub async fn get(&self, principal: Option<&Principal>, id: &str) -> DomainResult<Record<F>> {
        self.authorize_existing(principal, Operation::Read, id).await
    }

    #[instrument(skip(self, principal, request), fields(kind = %F::KIND))]
    pub async fn create(
        &self,
        principal: Option<&Principal>,
        request: CreateRecordRequest<F>,
    ) -> DomainResult<Record<F>> {
        let grant = self.authorize(principal, Operation::Create, None)?;
        validate_struct(&request.fields)?;

        let owner = grant
            .owner_override
            .or(request.owner)
            .or_else(|| principal.map(|p| p.username.clone()));

        let input = CreateRecordInput {
            id: xid::new().to_string(),
            owner,
            fields: request.fields,
        };
        debug!(id = %input.id, owner = ?input.owner, "creating record");

        self.store.create(input).await
    }

    /// Replace the fields of `id`. The owner never changes.
    #[instrument(skip(self, principal, fields), fields(kind = %F::KIND))]
    pub async fn update(
        &self,
        principal: Option<&Principal>,
        id: &str,
        fields: F,
    ) -> DomainResult<Record<F>> {
        self.authorize_existing(principal, Operation::Update, id).await?;
        validate_struct(&fields)?;

        let record = self.store.update(id, fields).await?;
        debug!(id = %record.id, "record updated");
        Ok(record)
    }

    #[instrument(skip(self, principal), fields(kind = %F::KIND))]
    pub async fn delete(&self, principal: Option<&Principal>, id: &str) -> DomainResult<()> {
        self.authorize_existing(principal, Operation::Delete, id).await?;
        self.store.delete(id).await?;
        debug!(id = %id, "record deleted");
        Ok(())
    }
}
