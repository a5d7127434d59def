use crate::auth::{AuthTokenProvider, JwtConfig, Principal, PrincipalResolver, Role};
use crate::domain::{DomainError, DomainResult};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

/// JWT claims structure
#[derive(Debug, Serialize, Deserialize)]
pub struct JwtClaims {
    pub sub: String, // user id
    pub username: String,
    pub role: Role,
    pub exp: usize,
    pub iat: usize,
}

/// HS256 tokens carrying the principal's id, username and role
pub struct JwtAuthTokenProvider {
    config: JwtConfig,
}

impl JwtAuthTokenProvider {
    pub fn new(config: JwtConfig) -> Self {
        Self { config }
    }
}

impl AuthTokenProvider for JwtAuthTokenProvider {
    fn generate_token(&self, principal: &Principal) -> DomainResult<String> {
        let now = chrono::Utc::now();
        let exp = now + chrono::Duration::hours(self.config.expiration_hours as i64);

        let claims = JwtClaims {
            sub: principal.id.clone(),
            username: principal.username.clone(),
            role: principal.role,
            exp: exp.timestamp() as usize,
            iat: now.timestamp() as usize,
        };

        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.config.secret.as_bytes()),
        )
        .map_err(|e| DomainError::TokenSigningError(e.to_string()))
    }
}

impl PrincipalResolver for JwtAuthTokenProvider {
    fn resolve(&self, credential: &str) -> DomainResult<Principal> {
        let token_data = decode::<JwtClaims>(
            credential,
            &DecodingKey::from_secret(self.config.secret.as_bytes()),
            &Validation::default(),
        )
        .map_err(|e| match e.kind() {
            ErrorKind::ExpiredSignature => DomainError::TokenExpired,
            _ => DomainError::InvalidToken(e.to_string()),
        })?;

        let claims = token_data.claims;
        Ok(Principal {
            id: claims.sub,
            username: claims.username,
            role: claims.role,
        })
    }
}
