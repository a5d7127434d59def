//! HTTP server runner with CORS and request logging.

use std::net::SocketAddr;
use std::time::Duration;

use anyhow::Context;
use axum::Router;
use http::{header, Method};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{debug, info};

use super::{HttpLoggingConfig, HttpLoggingLayer};

/// CORS settings for browser clients of the dashboard API
#[derive(Debug, Clone)]
pub struct CorsConfig {
    /// Allowed origins; `["*"]` allows any origin
    pub allowed_origins: Vec<String>,
    /// Preflight cache lifetime in seconds
    pub max_age_secs: u64,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allowed_origins: vec!["*".to_string()],
            max_age_secs: 3600,
        }
    }
}

impl CorsConfig {
    /// Parse a comma-separated origin list; empty means any origin
    pub fn from_comma_separated(origins: &str) -> Self {
        let allowed_origins: Vec<String> = origins
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        Self {
            allowed_origins: if allowed_origins.is_empty() {
                vec!["*".to_string()]
            } else {
                allowed_origins
            },
            ..Self::default()
        }
    }

    fn allows_any(&self) -> bool {
        self.allowed_origins.iter().any(|o| o == "*")
    }

    fn layer(&self) -> CorsLayer {
        let allow_origin = if self.allows_any() {
            AllowOrigin::any()
        } else {
            AllowOrigin::list(
                self.allowed_origins
                    .iter()
                    .filter_map(|origin| origin.parse().ok()),
            )
        };

        CorsLayer::new()
            .allow_origin(allow_origin)
            .allow_methods([
                Method::GET,
                Method::POST,
                Method::PUT,
                Method::DELETE,
                Method::OPTIONS,
            ])
            .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
            .max_age(Duration::from_secs(self.max_age_secs))
    }
}

#[derive(Debug, Clone)]
pub struct HttpServerConfig {
    pub host: String,
    pub port: u16,
    pub logging_config: HttpLoggingConfig,
    pub cors_config: CorsConfig,
}

impl Default for HttpServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            logging_config: HttpLoggingConfig::default(),
            cors_config: CorsConfig::default(),
        }
    }
}

impl HttpServerConfig {
    pub fn addr(&self) -> anyhow::Result<SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .with_context(|| format!("invalid server address {}:{}", self.host, self.port))
    }
}

/// Wrap `router` in the tracing, logging and CORS layers every deployment uses
pub fn apply_layers(router: Router, config: &HttpServerConfig) -> Router {
    router
        .layer(config.cors_config.layer())
        .layer(HttpLoggingLayer::new(config.logging_config.clone()))
        .layer(TraceLayer::new_for_http())
}

/// Serve `router` until `cancellation_token` is cancelled
pub async fn run_http_server(
    config: HttpServerConfig,
    router: Router,
    cancellation_token: CancellationToken,
) -> anyhow::Result<()> {
    let addr = config.addr()?;
    let app = apply_layers(router, &config);

    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!(address = %addr, "HTTP server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            cancellation_token.cancelled().await;
            debug!("HTTP server shutdown signal received");
        })
        .await?;

    debug!("HTTP server stopped");
    Ok(())
}
