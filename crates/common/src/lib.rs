pub mod auth;
pub mod domain;
pub mod http;
pub mod postgres;
pub mod telemetry;
pub mod validation;
