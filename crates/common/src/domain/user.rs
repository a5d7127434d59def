use crate::auth::{Principal, Role, ScopeFilter};
use crate::domain::result::DomainResult;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use garde::Validate;
use serde::{Deserialize, Serialize};

/// Back-office staff account
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: String,
    pub username: String,
    pub password_hash: String,
    pub role: Role,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl User {
    /// Identity carried by this user's access tokens
    pub fn principal(&self) -> Principal {
        Principal::new(self.id.clone(), self.username.clone(), self.role)
    }
}

/// API-facing view of a user, without the password hash
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserView {
    pub id: String,
    pub username: String,
    pub role: Role,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl From<User> for UserView {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            role: user.role,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

/// External input for creating a user (plaintext password)
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Validate)]
pub struct CreateUserInput {
    #[garde(length(min = 3, max = 64))]
    pub username: String,
    #[garde(length(min = 8))]
    pub password: String,
    #[garde(skip)]
    pub role: Role,
}

/// Internal input with generated ID and hashed password
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateUserInputWithId {
    pub id: String,
    pub username: String,
    pub password_hash: String,
    pub role: Role,
}

/// External input for updating a user; absent fields are left unchanged
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Validate)]
pub struct UpdateUserInput {
    #[garde(inner(length(min = 8)))]
    #[serde(default)]
    pub password: Option<String>,
    #[garde(skip)]
    #[serde(default)]
    pub role: Option<Role>,
}

/// Internal input for updating a user (password already hashed)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateUserInputWithHash {
    pub id: String,
    pub password_hash: Option<String>,
    pub role: Option<Role>,
}

/// Repository trait for user storage operations
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Create a user; `UserAlreadyExists` when the username is taken
    async fn create_user(&self, input: CreateUserInputWithId) -> DomainResult<User>;

    async fn get_user(&self, user_id: &str) -> DomainResult<Option<User>>;

    async fn get_user_by_username(&self, username: &str) -> DomainResult<Option<User>>;

    /// List users visible under `scope`; an owner scope matches the username
    async fn list_users(&self, scope: &ScopeFilter) -> DomainResult<Vec<User>>;

    /// `ResourceNotFound` if the user does not exist
    async fn update_user(&self, input: UpdateUserInputWithHash) -> DomainResult<User>;

    /// `ResourceNotFound` if the user does not exist
    async fn delete_user(&self, user_id: &str) -> DomainResult<()>;

    async fn has_role(&self, role: Role) -> DomainResult<bool>;
}
