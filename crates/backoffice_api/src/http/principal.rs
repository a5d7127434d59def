use std::sync::Arc;

use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use common::auth::{extract_principal, Principal, PrincipalResolver};
use common::http::ApiError;

/// Router state that can verify bearer credentials
pub trait HasPrincipalResolver {
    fn principal_resolver(&self) -> &Arc<dyn PrincipalResolver>;
}

/// The caller, or `None` for a request without an `Authorization` header.
///
/// A header that is present but invalid rejects the request with 401 before
/// the handler runs.
#[derive(Debug, Clone)]
pub struct CurrentPrincipal(pub Option<Principal>);

impl CurrentPrincipal {
    pub fn get(&self) -> Option<&Principal> {
        self.0.as_ref()
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for CurrentPrincipal
where
    S: HasPrincipalResolver + Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let principal = extract_principal(&parts.headers, state.principal_resolver().as_ref())?;
        Ok(CurrentPrincipal(principal))
    }
}
