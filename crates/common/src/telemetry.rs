//! Structured logging, with optional OTLP export of traces and logs.

mod init;
mod log_enricher;

pub use init::*;
pub use log_enricher::*;
