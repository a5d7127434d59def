use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use common::auth::{LoginUserInput, LoginUserOutput, PrincipalResolver};
use common::domain::{CreateUserInput, UpdateUserInput, UserView};
use common::http::{ApiResult, JsonBody};
use tracing::{debug, instrument};

use crate::domain::UserService;
use crate::http::{CurrentPrincipal, DeletedResponse, HasPrincipalResolver};

#[derive(Clone)]
pub struct UserState {
    service: Arc<UserService>,
    resolver: Arc<dyn PrincipalResolver>,
}

impl HasPrincipalResolver for UserState {
    fn principal_resolver(&self) -> &Arc<dyn PrincipalResolver> {
        &self.resolver
    }
}

/// `/api/auth/*` routes
pub fn auth_routes(service: Arc<UserService>, resolver: Arc<dyn PrincipalResolver>) -> Router {
    Router::new()
        .route("/login", post(login))
        .route("/me", get(me))
        .with_state(UserState { service, resolver })
}

/// `/api/users` routes
pub fn user_routes(service: Arc<UserService>, resolver: Arc<dyn PrincipalResolver>) -> Router {
    Router::new()
        .route("/", get(list_users).post(create_user))
        .route(
            "/:id",
            get(get_user).put(update_user).delete(delete_user),
        )
        .with_state(UserState { service, resolver })
}

#[instrument(name = "Login", skip_all, fields(username = %input.username))]
async fn login(
    State(state): State<UserState>,
    JsonBody(input): JsonBody<LoginUserInput>,
) -> ApiResult<Json<LoginUserOutput>> {
    let output = state.service.login(input).await?;
    debug!(user_id = %output.user.id, "login succeeded");
    Ok(Json(output))
}

#[instrument(name = "Me", skip_all)]
async fn me(
    State(state): State<UserState>,
    principal: CurrentPrincipal,
) -> ApiResult<Json<UserView>> {
    Ok(Json(state.service.me(principal.get()).await?))
}

#[instrument(name = "ListUsers", skip_all)]
async fn list_users(
    State(state): State<UserState>,
    principal: CurrentPrincipal,
) -> ApiResult<Json<Vec<UserView>>> {
    Ok(Json(state.service.list_users(principal.get()).await?))
}

#[instrument(name = "GetUser", skip_all, fields(user_id = %id))]
async fn get_user(
    State(state): State<UserState>,
    principal: CurrentPrincipal,
    Path(id): Path<String>,
) -> ApiResult<Json<UserView>> {
    Ok(Json(state.service.get_user(principal.get(), &id).await?))
}

#[instrument(name = "CreateUser", skip_all, fields(username = %input.username))]
async fn create_user(
    State(state): State<UserState>,
    principal: CurrentPrincipal,
    JsonBody(input): JsonBody<CreateUserInput>,
) -> ApiResult<(StatusCode, Json<UserView>)> {
    let user = state.service.create_user(principal.get(), input).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

#[instrument(name = "UpdateUser", skip_all, fields(user_id = %id))]
async fn update_user(
    State(state): State<UserState>,
    principal: CurrentPrincipal,
    Path(id): Path<String>,
    JsonBody(input): JsonBody<UpdateUserInput>,
) -> ApiResult<Json<UserView>> {
    Ok(Json(
        state
            .service
            .update_user(principal.get(), &id, input)
            .await?,
    ))
}

#[instrument(name = "DeleteUser", skip_all, fields(user_id = %id))]
async fn delete_user(
    State(state): State<UserState>,
    principal: CurrentPrincipal,
    Path(id): Path<String>,
) -> ApiResult<Json<DeletedResponse>> {
    state.service.delete_user(principal.get(), &id).await?;
    Ok(Json(DeletedResponse { id, deleted: true }))
}
