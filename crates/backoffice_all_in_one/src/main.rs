mod config;

use std::sync::Arc;
use std::time::Duration;

use backoffice_api::backoffice_api::BackofficeApi;
use backoffice_api::domain::{RecordService, UserService};
use backoffice_api::http::BackofficeServices;
use backoffice_runner::Runner;
use common::auth::{
    AccessGuard, AccessPolicy, Argon2PasswordService, JwtAuthTokenProvider, JwtConfig,
};
use common::domain::{
    DocumentFields, InMemoryResourceStore, InMemoryUserRepository, RegionFields, ResourceFields,
    ResourceStore, SaleFields, TargetFields, TourFields, UserRepository,
};
use common::http::{CorsConfig, HttpLoggingConfig, HttpServerConfig};
use common::postgres::{
    ensure_schema, PostgresClient, PostgresConfig, PostgresResourceStore, PostgresUserRepository,
};
use common::telemetry::{init_telemetry, TelemetryConfig};
use crate::config::{ServiceConfig, StorageBackend};
use tracing::{error, info, warn};

#[tokio::main]
async fn main() {
    let config = match ServiceConfig::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    let telemetry = match init_telemetry(&TelemetryConfig {
        service_name: config.otel_service_name.clone(),
        otel_endpoint: config.otel_endpoint.clone(),
        otel_enabled: config.otel_enabled,
        log_level: config.log_level.clone(),
    }) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("Failed to initialize telemetry: {}", e);
            std::process::exit(1);
        }
    };

    info!(
        otel_enabled = config.otel_enabled,
        storage_backend = %config.storage_backend,
        "Starting back-office service"
    );

    if config.jwt_secret == "change-me-in-production" {
        warn!("BACKOFFICE_JWT_SECRET is not set, using the development secret");
    }

    let stores = match initialize_stores(&config).await {
        Ok(stores) => stores,
        Err(e) => {
            error!("Failed to initialize storage: {}", e);
            std::process::exit(1);
        }
    };

    let guard = Arc::new(AccessGuard::new(AccessPolicy {
        public_region_list: config.public_region_list,
    }));
    let token_provider = Arc::new(JwtAuthTokenProvider::new(JwtConfig::new(
        config.jwt_secret.clone(),
        config.jwt_expiration_hours,
    )));

    let user_service = Arc::new(UserService::new(
        stores.users,
        guard.clone(),
        token_provider.clone(),
        Arc::new(Argon2PasswordService::new()),
    ));

    if let Some((username, password)) = config.bootstrap_admin() {
        if let Err(e) = user_service.bootstrap_admin(username, password).await {
            error!("Failed to create bootstrap account: {}", e);
            std::process::exit(1);
        }
    }

    let services = BackofficeServices {
        tours: Arc::new(RecordService::new(stores.tours, guard.clone())),
        sales: Arc::new(RecordService::new(stores.sales, guard.clone())),
        documents: Arc::new(RecordService::new(stores.documents, guard.clone())),
        regions: Arc::new(RecordService::new(stores.regions, guard.clone())),
        targets: Arc::new(RecordService::new(stores.targets, guard)),
        users: user_service,
        principal_resolver: token_provider,
    };

    let http_config = HttpServerConfig {
        host: config.http_host.clone(),
        port: config.http_port,
        logging_config: HttpLoggingConfig::new(config.http_ignored_paths()),
        cors_config: CorsConfig::from_comma_separated(&config.cors_allowed_origins),
    };

    let api = BackofficeApi::new(services, http_config, config.static_dir());

    let runner = Runner::new()
        .with_named_process("backoffice_api", api.into_runner_process())
        .with_closer(move || async move {
            info!("Running cleanup tasks...");
            // Flush pending traces and logs
            telemetry.shutdown();
            info!("Cleanup complete");
            Ok(())
        })
        .with_closer_timeout(Duration::from_secs(10));

    if let Err(e) = runner.run().await {
        error!("Service stopped with error: {:#}", e);
        std::process::exit(1);
    }
}

struct Stores {
    tours: Arc<dyn ResourceStore<TourFields>>,
    sales: Arc<dyn ResourceStore<SaleFields>>,
    documents: Arc<dyn ResourceStore<DocumentFields>>,
    regions: Arc<dyn ResourceStore<RegionFields>>,
    targets: Arc<dyn ResourceStore<TargetFields>>,
    users: Arc<dyn UserRepository>,
}

async fn initialize_stores(config: &ServiceConfig) -> anyhow::Result<Stores> {
    match config.storage_backend()? {
        StorageBackend::Memory => {
            warn!("Using in-memory storage, data is lost on restart");
            Ok(Stores {
                tours: Arc::new(InMemoryResourceStore::<TourFields>::new()),
                sales: Arc::new(InMemoryResourceStore::<SaleFields>::new()),
                documents: Arc::new(InMemoryResourceStore::<DocumentFields>::new()),
                regions: Arc::new(InMemoryResourceStore::<RegionFields>::new()),
                targets: Arc::new(InMemoryResourceStore::<TargetFields>::new()),
                users: Arc::new(InMemoryUserRepository::new()),
            })
        }
        StorageBackend::Postgres => {
            info!("Initializing PostgreSQL...");
            let client = create_postgres_client(config)?;
            client.ping().await?;
            ensure_schema(&client).await?;
            Ok(Stores {
                tours: postgres_store(&client),
                sales: postgres_store(&client),
                documents: postgres_store(&client),
                regions: postgres_store(&client),
                targets: postgres_store(&client),
                users: Arc::new(PostgresUserRepository::new(client)),
            })
        }
    }
}

fn postgres_store<F: ResourceFields>(client: &PostgresClient) -> Arc<dyn ResourceStore<F>> {
    Arc::new(PostgresResourceStore::<F>::new(client.clone()))
}

fn create_postgres_client(config: &ServiceConfig) -> anyhow::Result<PostgresClient> {
    PostgresClient::new(&PostgresConfig {
        host: config.postgres_host.clone(),
        port: config.postgres_port,
        database: config.postgres_database.clone(),
        username: config.postgres_username.clone(),
        password: config.postgres_password.clone(),
        max_pool_size: config.postgres_max_pool_size,
    })
}
