pub mod backoffice_api;
pub mod domain;
pub mod http;

pub use backoffice_api::*;
pub use domain::*;
pub use http::*;
