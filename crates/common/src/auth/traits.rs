use crate::auth::Principal;
use crate::domain::DomainResult;

/// Turns a bearer credential into the principal it was issued for
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
pub trait PrincipalResolver: Send + Sync {
    /// Verify the credential; fails with `InvalidToken` or `TokenExpired`
    fn resolve(&self, credential: &str) -> DomainResult<Principal>;
}

/// Issues access tokens (JWT) for authenticated users
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
pub trait AuthTokenProvider: Send + Sync {
    fn generate_token(&self, principal: &Principal) -> DomainResult<String>;
}

/// Trait for password hashing and verification
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
pub trait PasswordService: Send + Sync {
    /// Hash a plaintext password
    fn hash_password(&self, password: &str) -> DomainResult<String>;

    /// Verify a password against a hash
    fn verify_password(&self, password: &str, hash: &str) -> DomainResult<bool>;
}
