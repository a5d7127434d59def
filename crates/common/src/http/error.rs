use axum::extract::rejection::JsonRejection;
use axum::extract::FromRequest;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use tracing::error;

use crate::auth::DenyReason;
use crate::domain::DomainError;

/// Error response body
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorBody {
    pub message: String,
}

/// An HTTP error: status plus the client-facing message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }
}

/// Status for an authorization outcome
pub fn deny_status(reason: DenyReason) -> StatusCode {
    match reason {
        DenyReason::Unauthenticated => StatusCode::UNAUTHORIZED,
        DenyReason::NotOwner | DenyReason::InsufficientRole => StatusCode::FORBIDDEN,
        DenyReason::NotFound => StatusCode::NOT_FOUND,
    }
}

/// Convert domain error to an HTTP error.
///
/// Authorization failures expose only their reason; store and signing
/// failures are logged and reported as a bare internal error.
pub fn domain_error_to_api(error: DomainError) -> ApiError {
    match error {
        DomainError::AccessDenied(reason) => ApiError::new(deny_status(reason), reason.as_str()),

        DomainError::ResourceNotFound(_, _) => ApiError::new(
            deny_status(DenyReason::NotFound),
            DenyReason::NotFound.as_str(),
        ),

        DomainError::InvalidCredentials => {
            ApiError::new(StatusCode::UNAUTHORIZED, "invalid username or password")
        }

        DomainError::InvalidToken(_) => ApiError::new(StatusCode::UNAUTHORIZED, "invalid token"),

        DomainError::TokenExpired => ApiError::new(StatusCode::UNAUTHORIZED, "token expired"),

        DomainError::UserAlreadyExists(username) => ApiError::new(
            StatusCode::CONFLICT,
            format!("user already exists: {username}"),
        ),

        DomainError::InvalidRole(role) => {
            ApiError::new(StatusCode::BAD_REQUEST, format!("invalid role: {role}"))
        }

        DomainError::ValidationError(msg) => ApiError::new(StatusCode::BAD_REQUEST, msg),

        e @ (DomainError::PasswordHashingError(_)
        | DomainError::TokenSigningError(_)
        | DomainError::ConstraintViolation(_)
        | DomainError::StoreUnavailable(_)) => {
            error!(error = %e, "request failed");
            ApiError::new(StatusCode::INTERNAL_SERVER_ERROR, "internal error")
        }
    }
}

impl From<DomainError> for ApiError {
    fn from(error: DomainError) -> Self {
        domain_error_to_api(error)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::new(StatusCode::BAD_REQUEST, rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (
            self.status,
            Json(ErrorBody {
                message: self.message,
            }),
        )
            .into_response()
    }
}

/// JSON body extractor whose rejections use the `{message}` error shape
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct JsonBody<T>(pub T);

pub type ApiResult<T> = Result<T, ApiError>;
