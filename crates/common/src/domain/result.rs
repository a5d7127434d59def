use thiserror::Error;

use crate::auth::{DenyReason, ResourceKind};

pub type DomainResult<T> = Result<T, DomainError>;

#[derive(Error, Debug)]
pub enum DomainError {
    // Authorization outcomes. The reason is the only detail surfaced to clients.
    #[error("Access denied: {0}")]
    AccessDenied(DenyReason),

    #[error("{0} not found: {1}")]
    ResourceNotFound(ResourceKind, String),

    // Credentials
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Invalid token: {0}")]
    InvalidToken(String),

    #[error("Token expired")]
    TokenExpired,

    #[error("Password hashing error: {0}")]
    PasswordHashingError(String),

    #[error("Token signing error: {0}")]
    TokenSigningError(String),

    // User accounts
    #[error("User already exists: {0}")]
    UserAlreadyExists(String),

    #[error("Invalid role: {0}")]
    InvalidRole(String),

    // Input
    #[error("Validation error: {0}")]
    ValidationError(String),

    // Persistence
    #[error("Constraint violation: {0}")]
    ConstraintViolation(String),

    #[error("Store unavailable: {0}")]
    StoreUnavailable(#[from] anyhow::Error),
}

impl DomainError {
    /// Access-control outcome for a missing resource.
    pub fn not_found(kind: ResourceKind, id: impl Into<String>) -> Self {
        DomainError::ResourceNotFound(kind, id.into())
    }

    /// The deny reason carried by this error, if it is an authorization outcome.
    pub fn deny_reason(&self) -> Option<DenyReason> {
        match self {
            DomainError::AccessDenied(reason) => Some(*reason),
            DomainError::ResourceNotFound(_, _) => Some(DenyReason::NotFound),
            _ => None,
        }
    }
}
