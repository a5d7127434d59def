use crate::auth::{ResourceKind, Role, ScopeFilter};
use crate::domain::{
    CreateUserInputWithId, DomainError, DomainResult, UpdateUserInputWithHash, User,
    UserRepository,
};
use crate::postgres::{store_error, PostgresClient};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tracing::{debug, instrument};

/// User row for PostgreSQL storage
#[derive(Debug, Clone)]
pub struct UserRow {
    pub id: String,
    pub username: String,
    pub password_hash: String,
    pub role: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl UserRow {
    fn from_pg(row: &tokio_postgres::Row) -> Self {
        Self {
            id: row.get("id"),
            username: row.get("username"),
            password_hash: row.get("password_hash"),
            role: row.get("role"),
            created_at: row.get("created_at"),
            updated_at: row.get("updated_at"),
        }
    }
}

impl TryFrom<UserRow> for User {
    type Error = DomainError;

    fn try_from(row: UserRow) -> DomainResult<Self> {
        Ok(User {
            role: row.role.parse()?,
            id: row.id,
            username: row.username,
            password_hash: row.password_hash,
            created_at: Some(row.created_at),
            updated_at: Some(row.updated_at),
        })
    }
}

const SELECT_COLUMNS: &str = "id, username, password_hash, role, created_at, updated_at";

/// PostgreSQL implementation of UserRepository trait
#[derive(Clone)]
pub struct PostgresUserRepository {
    client: PostgresClient,
}

impl PostgresUserRepository {
    pub fn new(client: PostgresClient) -> Self {
        Self { client }
    }

    async fn fetch_one(&self, column: &str, value: &str) -> DomainResult<Option<User>> {
        let conn = self
            .client
            .get_connection()
            .await
            .map_err(DomainError::StoreUnavailable)?;

        let row = conn
            .query_opt(
                &format!("SELECT {SELECT_COLUMNS} FROM users WHERE {column} = $1"),
                &[&value],
            )
            .await
            .map_err(store_error)?;

        row.map(|r| UserRow::from_pg(&r).try_into()).transpose()
    }
}

#[async_trait]
impl UserRepository for PostgresUserRepository {
    #[instrument(skip(self, input), fields(user_id = %input.id, username = %input.username))]
    async fn create_user(&self, input: CreateUserInputWithId) -> DomainResult<User> {
        let conn = self
            .client
            .get_connection()
            .await
            .map_err(DomainError::StoreUnavailable)?;

        let now = Utc::now();

        let result = conn
            .execute(
                "INSERT INTO users (id, username, password_hash, role, created_at, updated_at)
                 VALUES ($1, $2, $3, $4, $5, $6)",
                &[
                    &input.id,
                    &input.username,
                    &input.password_hash,
                    &input.role.as_str(),
                    &now,
                    &now,
                ],
            )
            .await;

        if let Err(e) = result {
            if let Some(db_err) = e.as_db_error() {
                match db_err.code().code() {
                    // unique_violation on username
                    "23505" if db_err.constraint() == Some("users_username_key") => {
                        return Err(DomainError::UserAlreadyExists(input.username));
                    }
                    code if code.starts_with("23") => {
                        return Err(DomainError::ConstraintViolation(
                            db_err.message().to_string(),
                        ));
                    }
                    _ => {}
                }
            }
            return Err(store_error(e));
        }

        debug!(user_id = %input.id, "user created in database");

        Ok(User {
            id: input.id,
            username: input.username,
            password_hash: input.password_hash,
            role: input.role,
            created_at: Some(now),
            updated_at: Some(now),
        })
    }

    #[instrument(skip(self))]
    async fn get_user(&self, user_id: &str) -> DomainResult<Option<User>> {
        self.fetch_one("id", user_id).await
    }

    #[instrument(skip(self))]
    async fn get_user_by_username(&self, username: &str) -> DomainResult<Option<User>> {
        self.fetch_one("username", username).await
    }

    #[instrument(skip(self, scope))]
    async fn list_users(&self, scope: &ScopeFilter) -> DomainResult<Vec<User>> {
        let conn = self
            .client
            .get_connection()
            .await
            .map_err(DomainError::StoreUnavailable)?;

        let rows = match scope {
            ScopeFilter::Unrestricted => {
                conn.query(
                    &format!("SELECT {SELECT_COLUMNS} FROM users ORDER BY username"),
                    &[],
                )
                .await
            }
            ScopeFilter::OwnedBy(username) => {
                conn.query(
                    &format!("SELECT {SELECT_COLUMNS} FROM users WHERE username = $1"),
                    &[username],
                )
                .await
            }
        }
        .map_err(store_error)?;

        let users = rows
            .iter()
            .map(|r| UserRow::from_pg(r).try_into())
            .collect::<DomainResult<Vec<User>>>()?;

        debug!(count = users.len(), "listed users from database");
        Ok(users)
    }

    #[instrument(skip(self, input), fields(user_id = %input.id))]
    async fn update_user(&self, input: UpdateUserInputWithHash) -> DomainResult<User> {
        let conn = self
            .client
            .get_connection()
            .await
            .map_err(DomainError::StoreUnavailable)?;

        let now = Utc::now();
        let role = input.role.map(|r| r.as_str());

        // Build dynamic UPDATE query based on provided fields
        let mut query = String::from("UPDATE users SET updated_at = $1");
        let mut params: Vec<&(dyn tokio_postgres::types::ToSql + Sync)> = vec![&now];
        let mut param_idx = 2;

        if let Some(ref hash) = input.password_hash {
            query.push_str(&format!(", password_hash = ${}", param_idx));
            params.push(hash);
            param_idx += 1;
        }

        if let Some(ref role) = role {
            query.push_str(&format!(", role = ${}", param_idx));
            params.push(role);
            param_idx += 1;
        }

        query.push_str(&format!(
            " WHERE id = ${} RETURNING {}",
            param_idx, SELECT_COLUMNS
        ));
        params.push(&input.id);

        let row = conn
            .query_opt(&query, &params[..])
            .await
            .map_err(store_error)?;

        match row {
            Some(r) => {
                debug!(user_id = %input.id, "user updated in database");
                UserRow::from_pg(&r).try_into()
            }
            None => Err(DomainError::not_found(ResourceKind::User, input.id)),
        }
    }

    #[instrument(skip(self))]
    async fn delete_user(&self, user_id: &str) -> DomainResult<()> {
        let conn = self
            .client
            .get_connection()
            .await
            .map_err(DomainError::StoreUnavailable)?;

        let rows_affected = conn
            .execute("DELETE FROM users WHERE id = $1", &[&user_id])
            .await
            .map_err(store_error)?;

        if rows_affected == 0 {
            return Err(DomainError::not_found(ResourceKind::User, user_id));
        }

        debug!(user_id = %user_id, "user deleted from database");
        Ok(())
    }

    #[instrument(skip(self))]
    async fn has_role(&self, role: Role) -> DomainResult<bool> {
        let conn = self
            .client
            .get_connection()
            .await
            .map_err(DomainError::StoreUnavailable)?;

        let row = conn
            .query_one(
                "SELECT EXISTS (SELECT 1 FROM users WHERE role = $1)",
                &[&role.as_str()],
            )
            .await
            .map_err(store_error)?;

        Ok(row.get(0))
    }
}
