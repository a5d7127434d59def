mod access;
mod record_service;
mod user_service;

pub use record_service::*;
pub use user_service::*;
