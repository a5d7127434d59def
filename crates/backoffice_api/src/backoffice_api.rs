use std::path::PathBuf;

use crate::http::{run_backoffice_http_server, BackofficeServices};
use common::http::HttpServerConfig;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// The back-office HTTP API as a runner process
pub struct BackofficeApi {
    services: BackofficeServices,
    config: HttpServerConfig,
    static_dir: Option<PathBuf>,
}

impl BackofficeApi {
    pub fn new(
        services: BackofficeServices,
        config: HttpServerConfig,
        static_dir: Option<PathBuf>,
    ) -> Self {
        debug!("initializing back-office API module");
        Self {
            services,
            config,
            static_dir,
        }
    }

    pub fn into_runner_process(
        self,
    ) -> impl FnOnce(
        CancellationToken,
    ) -> std::pin::Pin<
        Box<dyn std::future::Future<Output = anyhow::Result<()>> + Send>,
    > {
        move |ctx| {
            Box::pin(async move {
                run_backoffice_http_server(self.config, self.services, self.static_dir, ctx).await
            })
        }
    }
}
