use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use tracing::debug;

use crate::auth::{ResourceKind, Role, ScopeFilter};
use crate::domain::{
    CreateRecordInput, CreateUserInputWithId, DomainError, DomainResult, Record, ResourceFields,
    ResourceStore, UpdateUserInputWithHash, User, UserRepository,
};

/// Process-local record store for tests and `memory` storage runs
pub struct InMemoryResourceStore<F> {
    records: RwLock<HashMap<String, Record<F>>>,
}

impl<F> InMemoryResourceStore<F> {
    pub fn new() -> Self {
        Self {
            records: RwLock::new(HashMap::new()),
        }
    }
}

impl<F> Default for InMemoryResourceStore<F> {
    fn default() -> Self {
        Self::new()
    }
}

fn newest_first<F>(records: &mut [Record<F>]) {
    records.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| b.id.cmp(&a.id)));
}

#[async_trait]
impl<F: ResourceFields> ResourceStore<F> for InMemoryResourceStore<F> {
    async fn list(&self, scope: &ScopeFilter) -> DomainResult<Vec<Record<F>>> {
        let records = self.records.read().await;
        let mut visible: Vec<Record<F>> = records
            .values()
            .filter(|r| scope.permits(r.owner.as_deref()))
            .cloned()
            .collect();
        newest_first(&mut visible);
        Ok(visible)
    }

    async fn get(&self, id: &str) -> DomainResult<Option<Record<F>>> {
        Ok(self.records.read().await.get(id).cloned())
    }

    async fn create(&self, input: CreateRecordInput<F>) -> DomainResult<Record<F>> {
        let mut records = self.records.write().await;
        if records.contains_key(&input.id) {
            return Err(DomainError::ConstraintViolation(format!(
                "{} {} already exists",
                F::KIND,
                input.id
            )));
        }

        let now = Utc::now();
        let record = Record {
            id: input.id,
            owner: input.owner,
            fields: input.fields,
            created_at: Some(now),
            updated_at: Some(now),
        };
        records.insert(record.id.clone(), record.clone());
        debug!(kind = %F::KIND, id = %record.id, "stored record in memory");
        Ok(record)
    }

    async fn update(&self, id: &str, fields: F) -> DomainResult<Record<F>> {
        let mut records = self.records.write().await;
        let record = records
            .get_mut(id)
            .ok_or_else(|| DomainError::not_found(F::KIND, id))?;
        record.fields = fields;
        record.updated_at = Some(Utc::now());
        Ok(record.clone())
    }

    async fn delete(&self, id: &str) -> DomainResult<()> {
        self.records
            .write()
            .await
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| DomainError::not_found(F::KIND, id))
    }
}

/// Process-local user repository
#[derive(Default)]
pub struct InMemoryUserRepository {
    users: RwLock<HashMap<String, User>>,
}

impl InMemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn create_user(&self, input: CreateUserInputWithId) -> DomainResult<User> {
        let mut users = self.users.write().await;
        if users.values().any(|u| u.username == input.username) {
            return Err(DomainError::UserAlreadyExists(input.username));
        }

        let now = Utc::now();
        let user = User {
            id: input.id,
            username: input.username,
            password_hash: input.password_hash,
            role: input.role,
            created_at: Some(now),
            updated_at: Some(now),
        };
        users.insert(user.id.clone(), user.clone());
        Ok(user)
    }

    async fn get_user(&self, user_id: &str) -> DomainResult<Option<User>> {
        Ok(self.users.read().await.get(user_id).cloned())
    }

    async fn get_user_by_username(&self, username: &str) -> DomainResult<Option<User>> {
        Ok(self
            .users
            .read()
            .await
            .values()
            .find(|u| u.username == username)
            .cloned())
    }

    async fn list_users(&self, scope: &ScopeFilter) -> DomainResult<Vec<User>> {
        let mut users: Vec<User> = self
            .users
            .read()
            .await
            .values()
            .filter(|u| scope.permits(Some(u.username.as_str())))
            .cloned()
            .collect();
        users.sort_by(|a, b| a.username.cmp(&b.username));
        Ok(users)
    }

    async fn update_user(&self, input: UpdateUserInputWithHash) -> DomainResult<User> {
        let mut users = self.users.write().await;
        let user = users
            .get_mut(&input.id)
            .ok_or_else(|| DomainError::not_found(ResourceKind::User, &input.id))?;
        if let Some(hash) = input.password_hash {
            user.password_hash = hash;
        }
        if let Some(role) = input.role {
            user.role = role;
        }
        user.updated_at = Some(Utc::now());
        Ok(user.clone())
    }

    async fn delete_user(&self, user_id: &str) -> DomainResult<()> {
        self.users
            .write()
            .await
            .remove(user_id)
            .map(|_| ())
            .ok_or_else(|| DomainError::not_found(ResourceKind::User, user_id))
    }

    async fn has_role(&self, role: Role) -> DomainResult<bool> {
        Ok(self.users.read().await.values().any(|u| u.role == role))
    }
}
