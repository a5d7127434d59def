use crate::auth::PasswordService;
use crate::domain::{DomainError, DomainResult};
use argon2::{
    password_hash::{rand_core::OsRng, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};

/// Argon2-based implementation of PasswordService
#[derive(Default)]
pub struct Argon2PasswordService;

impl Argon2PasswordService {
    pub fn new() -> Self {
        Self
    }
}

impl PasswordService for Argon2PasswordService {
    fn hash_password(&self, password: &str) -> DomainResult<String> {
        let salt = SaltString::generate(&mut OsRng);

        Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| DomainError::PasswordHashingError(e.to_string()))
    }

    fn verify_password(&self, password: &str, hash: &str) -> DomainResult<bool> {
        let parsed_hash = argon2::PasswordHash::new(hash)
            .map_err(|e| DomainError::PasswordHashingError(e.to_string()))?;

        Ok(Argon2::default()
            .verify_password(password.as_bytes(), &parsed_hash)
            .is_ok())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_is_salted_argon2() {
        let service = Argon2PasswordService::new();
        let hash1 = service.hash_password("same-password").unwrap();
        let hash2 = service.hash_password("same-password").unwrap();

        assert!(hash1.starts_with("$argon2"));
        assert_ne!(hash1, hash2);
    }

    #[test]
    fn test_verify_password() {
        let service = Argon2PasswordService::new();
        let hash = service.hash_password("correct-password").unwrap();

        assert!(service.verify_password("correct-password", &hash).unwrap());
        assert!(!service.verify_password("wrong-password", &hash).unwrap());
    }

    #[test]
    fn test_verify_password_invalid_hash() {
        let service = Argon2PasswordService::new();
        let result = service.verify_password("any-password", "plaintext-from-legacy-table");
        assert!(matches!(result, Err(DomainError::PasswordHashingError(_))));
    }
}
