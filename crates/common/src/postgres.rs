mod client;
mod config;
mod record_store;
mod schema;
mod user_repository;

pub use client::*;
pub use config::*;
pub use record_store::*;
pub use schema::*;
pub use user_repository::*;

use crate::domain::DomainError;

/// Driver failures surface as an unavailable store
pub(crate) fn store_error(e: tokio_postgres::Error) -> DomainError {
    DomainError::StoreUnavailable(e.into())
}
