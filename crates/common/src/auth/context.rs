use http::header::AUTHORIZATION;
use http::HeaderMap;

use super::traits::PrincipalResolver;
use crate::auth::Principal;
use crate::domain::{DomainError, DomainResult};

/// Resolve the caller from an `Authorization: Bearer <token>` header.
///
/// A request without the header is anonymous (`Ok(None)`) so the access guard
/// can still admit public listings. A header that is present but malformed,
/// or carries a token the resolver rejects, is an error.
pub fn extract_principal(
    headers: &HeaderMap,
    resolver: &dyn PrincipalResolver,
) -> DomainResult<Option<Principal>> {
    let Some(value) = headers.get(AUTHORIZATION) else {
        return Ok(None);
    };

    let auth_header = value
        .to_str()
        .map_err(|_| DomainError::InvalidToken("Invalid authorization header".to_string()))?;

    let token = auth_header
        .strip_prefix("Bearer ")
        .or_else(|| auth_header.strip_prefix("bearer "))
        .ok_or_else(|| {
            DomainError::InvalidToken(
                "Invalid authorization format, expected 'Bearer <token>'".to_string(),
            )
        })?;

    resolver.resolve(token.trim()).map(Some)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{MockPrincipalResolver, Role};

    fn headers_with(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, value.parse().unwrap());
        headers
    }

    #[test]
    fn test_extract_principal_success() {
        let mut mock_resolver = MockPrincipalResolver::new();
        mock_resolver
            .expect_resolve()
            .with(mockall::predicate::eq("valid_token"))
            .returning(|_| Ok(Principal::new("user123", "staff1", Role::Basic)));

        let result = extract_principal(&headers_with("Bearer valid_token"), &mock_resolver);
        let principal = result.unwrap().unwrap();
        assert_eq!(principal.id, "user123");
        assert_eq!(principal.role, Role::Basic);
    }

    #[test]
    fn test_extract_principal_missing_header_is_anonymous() {
        let mock_resolver = MockPrincipalResolver::new();
        let result = extract_principal(&HeaderMap::new(), &mock_resolver);
        assert!(matches!(result, Ok(None)));
    }

    #[test]
    fn test_extract_principal_invalid_format() {
        let mock_resolver = MockPrincipalResolver::new();
        let result = extract_principal(&headers_with("Basic abc123"), &mock_resolver);
        assert!(matches!(result, Err(DomainError::InvalidToken(_))));
    }

    #[test]
    fn test_extract_principal_expired_token() {
        let mut mock_resolver = MockPrincipalResolver::new();
        mock_resolver
            .expect_resolve()
            .returning(|_| Err(DomainError::TokenExpired));

        let result = extract_principal(&headers_with("Bearer old_token"), &mock_resolver);
        assert!(matches!(result, Err(DomainError::TokenExpired)));
    }

    #[test]
    fn test_extract_principal_lowercase_bearer() {
        let mut mock_resolver = MockPrincipalResolver::new();
        mock_resolver
            .expect_resolve()
            .with(mockall::predicate::eq("valid_token"))
            .returning(|_| Ok(Principal::new("user456", "lead", Role::Semi)));

        let result = extract_principal(&headers_with("bearer valid_token"), &mock_resolver);
        assert_eq!(result.unwrap().unwrap().username, "lead");
    }
}
