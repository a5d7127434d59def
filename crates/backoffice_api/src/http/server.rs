use std::path::PathBuf;
use std::sync::Arc;

use axum::http::StatusCode;
use axum::routing::get;
use axum::Router;
use common::auth::{DenyReason, PrincipalResolver};
use common::domain::{DocumentFields, RegionFields, SaleFields, TargetFields, TourFields};
use common::http::{run_http_server, ApiError, HttpServerConfig};
use tokio_util::sync::CancellationToken;
use tower_http::services::{ServeDir, ServeFile};
use tracing::debug;

use crate::domain::{RecordService, UserService};
use crate::http::{auth_routes, record_routes, user_routes};

/// Every service the HTTP API exposes
#[derive(Clone)]
pub struct BackofficeServices {
    pub tours: Arc<RecordService<TourFields>>,
    pub sales: Arc<RecordService<SaleFields>>,
    pub documents: Arc<RecordService<DocumentFields>>,
    pub regions: Arc<RecordService<RegionFields>>,
    pub targets: Arc<RecordService<TargetFields>>,
    pub users: Arc<UserService>,
    pub principal_resolver: Arc<dyn PrincipalResolver>,
}

async fn healthz() -> &'static str {
    "ok"
}

/// Unknown `/api` paths stay JSON instead of falling through to the dashboard
async fn api_not_found() -> ApiError {
    ApiError::new(StatusCode::NOT_FOUND, DenyReason::NotFound.as_str())
}

/// JSON API under `/api`, `/healthz`, and the dashboard files from
/// `static_dir` for every other path
pub fn build_router(services: BackofficeServices, static_dir: Option<PathBuf>) -> Router {
    let resolver = services.principal_resolver;

    let api = Router::new()
        .nest("/auth", auth_routes(services.users.clone(), resolver.clone()))
        .nest("/users", user_routes(services.users, resolver.clone()))
        .nest("/tours", record_routes(services.tours, resolver.clone()))
        .nest("/sales", record_routes(services.sales, resolver.clone()))
        .nest("/documents", record_routes(services.documents, resolver.clone()))
        .nest("/regions", record_routes(services.regions, resolver.clone()))
        .nest("/targets", record_routes(services.targets, resolver))
        .fallback(api_not_found);

    let router = Router::new()
        .route("/healthz", get(healthz))
        .nest("/api", api);

    match static_dir {
        Some(dir) => {
            debug!(static_dir = %dir.display(), "serving dashboard files");
            let index = ServeFile::new(dir.join("index.html"));
            router.fallback_service(ServeDir::new(dir).fallback(index))
        }
        None => router,
    }
}

/// Run the API until `cancellation_token` is cancelled
pub async fn run_backoffice_http_server(
    config: HttpServerConfig,
    services: BackofficeServices,
    static_dir: Option<PathBuf>,
    cancellation_token: CancellationToken,
) -> anyhow::Result<()> {
    run_http_server(config, build_router(services, static_dir), cancellation_token).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use chrono::NaiveDate;
    use common::auth::{
        AccessGuard, Argon2PasswordService, AuthTokenProvider, JwtAuthTokenProvider, JwtConfig,
        Principal, Role,
    };
    use common::domain::{
        CreateRecordInput, InMemoryResourceStore, InMemoryUserRepository, ResourceStore,
    };
    use http::{header, Request, StatusCode};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    struct TestApp {
        router: Router,
        tours: Arc<InMemoryResourceStore<TourFields>>,
        tokens: Arc<JwtAuthTokenProvider>,
    }

    impl TestApp {
        async fn new() -> Self {
            Self::with_static_dir(None).await
        }

        async fn with_static_dir(static_dir: Option<PathBuf>) -> Self {
            let guard = Arc::new(AccessGuard::default());
            let tokens = Arc::new(JwtAuthTokenProvider::new(JwtConfig::new("router-test", 1)));
            let tours = Arc::new(InMemoryResourceStore::<TourFields>::new());

            let users = Arc::new(UserService::new(
                Arc::new(InMemoryUserRepository::new()),
                guard.clone(),
                tokens.clone(),
                Arc::new(Argon2PasswordService::new()),
            ));
            users
                .bootstrap_admin("admin", "correct horse")
                .await
                .unwrap();

            let services = BackofficeServices {
                tours: Arc::new(RecordService::new(tours.clone(), guard.clone())),
                sales: Arc::new(RecordService::new(
                    Arc::new(InMemoryResourceStore::<SaleFields>::new()),
                    guard.clone(),
                )),
                documents: Arc::new(RecordService::new(
                    Arc::new(InMemoryResourceStore::<DocumentFields>::new()),
                    guard.clone(),
                )),
                regions: Arc::new(RecordService::new(
                    Arc::new(InMemoryResourceStore::<RegionFields>::new()),
                    guard.clone(),
                )),
                targets: Arc::new(RecordService::new(
                    Arc::new(InMemoryResourceStore::<TargetFields>::new()),
                    guard,
                )),
                users,
                principal_resolver: tokens.clone(),
            };

            Self {
                router: build_router(services, static_dir),
                tours,
                tokens,
            }
        }

        fn token(&self, username: &str, role: Role) -> String {
            let principal = Principal::new(format!("id-{username}"), username, role);
            self.tokens.generate_token(&principal).unwrap()
        }

        async fn seed_tour(&self, id: &str, owner: &str) {
            self.tours
                .create(CreateRecordInput {
                    id: id.to_string(),
                    owner: Some(owner.to_string()),
                    fields: tour_fields("Seeded tour"),
                })
                .await
                .unwrap();
        }

        async fn send(
            &self,
            method: &str,
            uri: &str,
            token: Option<&str>,
            body: Option<Value>,
        ) -> (StatusCode, Value) {
            let mut request = Request::builder().method(method).uri(uri);
            if let Some(token) = token {
                request = request.header(header::AUTHORIZATION, format!("Bearer {token}"));
            }
            let body = match body {
                Some(value) => {
                    request = request.header(header::CONTENT_TYPE, "application/json");
                    Body::from(value.to_string())
                }
                None => Body::empty(),
            };

            let response = self
                .router
                .clone()
                .oneshot(request.body(body).unwrap())
                .await
                .unwrap();
            let status = response.status();
            let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
                .await
                .unwrap();
            let value = if bytes.is_empty() {
                Value::Null
            } else {
                serde_json::from_slice(&bytes)
                    .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into()))
            };
            (status, value)
        }
    }

    fn tour_fields(name: &str) -> TourFields {
        TourFields {
            name: name.to_string(),
            destination: "Da Nang".to_string(),
            region_id: None,
            start_date: NaiveDate::from_ymd_opt(2026, 12, 1).unwrap(),
            end_date: NaiveDate::from_ymd_opt(2026, 12, 3).unwrap(),
            price_cents: 320_000,
            capacity: 15,
            description: None,
        }
    }

    fn tour_json(name: &str) -> Value {
        json!({
            "name": name,
            "destination": "Da Nang",
            "start_date": "2026-12-01",
            "end_date": "2026-12-03",
            "price_cents": 320000,
            "capacity": 15
        })
    }

    #[tokio::test]
    async fn test_healthz() {
        let app = TestApp::new().await;
        let (status, body) = app.send("GET", "/healthz", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, Value::String("ok".to_string()));
    }

    #[tokio::test]
    async fn test_unknown_api_path_is_json_not_found_with_dashboard() {
        let dir = tempfile::TempDir::new().unwrap();
        std::fs::write(dir.path().join("index.html"), "<html>dash</html>").unwrap();
        let app = TestApp::with_static_dir(Some(dir.path().to_path_buf())).await;

        let (status, body) = app.send("GET", "/api/tourz", None, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body, json!({ "message": "not_found" }));

        let (status, body) = app.send("GET", "/reports/monthly", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, Value::String("<html>dash</html>".to_string()));
    }

    #[tokio::test]
    async fn test_basic_updates_own_record() {
        let app = TestApp::new().await;
        app.seed_tour("t1", "staff1").await;
        let token = app.token("staff1", Role::Basic);

        let (status, body) = app
            .send("PUT", "/api/tours/t1", Some(&token), Some(tour_json("Renamed")))
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["name"], "Renamed");
        assert_eq!(body["owner"], "staff1");
    }

    #[tokio::test]
    async fn test_basic_cannot_delete_foreign_record() {
        let app = TestApp::new().await;
        app.seed_tour("t2", "staff2").await;
        let token = app.token("staff1", Role::Basic);

        let (status, body) = app
            .send("DELETE", "/api/tours/t2", Some(&token), None)
            .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body, json!({ "message": "not_owner" }));
        assert!(app.tours.get("t2").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_semi_deletes_any_record() {
        let app = TestApp::new().await;
        app.seed_tour("t2", "staff2").await;
        let token = app.token("lead", Role::Semi);

        let (status, body) = app
            .send("DELETE", "/api/tours/t2", Some(&token), None)
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "id": "t2", "deleted": true }));
        assert!(app.tours.get("t2").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_list_without_credentials_is_unauthenticated() {
        let app = TestApp::new().await;
        let (status, body) = app.send("GET", "/api/tours", None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["message"], "unauthenticated");
    }

    #[tokio::test]
    async fn test_basic_list_shows_only_own_records() {
        let app = TestApp::new().await;
        app.seed_tour("t1", "staff1").await;
        app.seed_tour("t2", "staff2").await;
        let token = app.token("staff1", Role::Basic);

        let (status, body) = app.send("GET", "/api/tours", Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);
        let records = body.as_array().unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0]["id"], "t1");
    }

    #[tokio::test]
    async fn test_create_forces_owner_for_basic() {
        let app = TestApp::new().await;
        let token = app.token("staff1", Role::Basic);

        let mut payload = tour_json("Hoi An by night");
        payload["owner"] = json!("other_user");
        let (status, body) = app
            .send("POST", "/api/tours", Some(&token), Some(payload))
            .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["owner"], "staff1");

        let id = body["id"].as_str().unwrap();
        let stored = app.tours.get(id).await.unwrap().unwrap();
        assert_eq!(stored.owner.as_deref(), Some("staff1"));
    }

    #[tokio::test]
    async fn test_create_with_invalid_fields_is_bad_request() {
        let app = TestApp::new().await;
        let token = app.token("admin", Role::Super);

        let mut payload = tour_json("Backwards");
        payload["end_date"] = json!("2026-11-01");
        let (status, _) = app
            .send("POST", "/api/tours", Some(&token), Some(payload))
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, body) = app
            .send("POST", "/api/tours", Some(&token), Some(json!({ "name": 5 })))
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["message"].is_string());
    }

    #[tokio::test]
    async fn test_missing_record_is_not_found() {
        let app = TestApp::new().await;
        let token = app.token("admin", Role::Super);
        let (status, body) = app
            .send("GET", "/api/tours/nope", Some(&token), None)
            .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["message"], "not_found");
    }

    #[tokio::test]
    async fn test_malformed_bearer_is_rejected() {
        let app = TestApp::new().await;
        let (status, _) = app
            .send("GET", "/api/tours", Some("not-a-jwt"), None)
            .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_login_then_me() {
        let app = TestApp::new().await;

        let (status, body) = app
            .send(
                "POST",
                "/api/auth/login",
                None,
                Some(json!({ "username": "admin", "password": "correct horse" })),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["token_type"], "Bearer");
        assert_eq!(body["user"]["role"], "super");
        assert!(body["user"].get("password_hash").is_none());
        let token = body["access_token"].as_str().unwrap().to_string();

        let (status, body) = app.send("GET", "/api/auth/me", Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["username"], "admin");
    }

    #[tokio::test]
    async fn test_login_with_wrong_password() {
        let app = TestApp::new().await;
        let (status, _) = app
            .send(
                "POST",
                "/api/auth/login",
                None,
                Some(json!({ "username": "admin", "password": "wrong password" })),
            )
            .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }
}
