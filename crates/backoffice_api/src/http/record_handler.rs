use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use common::auth::PrincipalResolver;
use common::domain::{Record, ResourceFields};
use common::http::{ApiResult, JsonBody};
use serde::Serialize;
use tracing::{debug, instrument};

use crate::domain::{CreateRecordRequest, RecordService};
use crate::http::{CurrentPrincipal, HasPrincipalResolver};

/// Per-kind router state
pub struct RecordState<F: ResourceFields> {
    service: Arc<RecordService<F>>,
    resolver: Arc<dyn PrincipalResolver>,
}

impl<F: ResourceFields> Clone for RecordState<F> {
    fn clone(&self) -> Self {
        Self {
            service: self.service.clone(),
            resolver: self.resolver.clone(),
        }
    }
}

impl<F: ResourceFields> HasPrincipalResolver for RecordState<F> {
    fn principal_resolver(&self) -> &Arc<dyn PrincipalResolver> {
        &self.resolver
    }
}

#[derive(Debug, Serialize)]
pub struct DeletedResponse {
    pub id: String,
    pub deleted: bool,
}

/// `GET/POST /` and `GET/PUT/DELETE /:id` for one record kind, to be nested
/// under `/api/<kind>s`
pub fn record_routes<F: ResourceFields>(
    service: Arc<RecordService<F>>,
    resolver: Arc<dyn PrincipalResolver>,
) -> Router {
    Router::new()
        .route("/", get(list_records::<F>).post(create_record::<F>))
        .route(
            "/:id",
            get(get_record::<F>)
                .put(update_record::<F>)
                .delete(delete_record::<F>),
        )
        .with_state(RecordState { service, resolver })
}

#[instrument(name = "ListRecords", skip_all, fields(kind = %F::KIND))]
async fn list_records<F: ResourceFields>(
    State(state): State<RecordState<F>>,
    principal: CurrentPrincipal,
) -> ApiResult<Json<Vec<Record<F>>>> {
    let records = state.service.list(principal.get()).await?;
    Ok(Json(records))
}

#[instrument(name = "GetRecord", skip_all, fields(kind = %F::KIND, id = %id))]
async fn get_record<F: ResourceFields>(
    State(state): State<RecordState<F>>,
    principal: CurrentPrincipal,
    Path(id): Path<String>,
) -> ApiResult<Json<Record<F>>> {
    let record = state.service.get(principal.get(), &id).await?;
    Ok(Json(record))
}

#[instrument(name = "CreateRecord", skip_all, fields(kind = %F::KIND))]
async fn create_record<F: ResourceFields>(
    State(state): State<RecordState<F>>,
    principal: CurrentPrincipal,
    JsonBody(request): JsonBody<CreateRecordRequest<F>>,
) -> ApiResult<(StatusCode, Json<Record<F>>)> {
    let record = state.service.create(principal.get(), request).await?;
    debug!(id = %record.id, "record created");
    Ok((StatusCode::CREATED, Json(record)))
}

#[instrument(name = "UpdateRecord", skip_all, fields(kind = %F::KIND, id = %id))]
async fn update_record<F: ResourceFields>(
    State(state): State<RecordState<F>>,
    principal: CurrentPrincipal,
    Path(id): Path<String>,
    JsonBody(fields): JsonBody<F>,
) -> ApiResult<Json<Record<F>>> {
    let record = state.service.update(principal.get(), &id, fields).await?;
    Ok(Json(record))
}

#[instrument(name = "DeleteRecord", skip_all, fields(kind = %F::KIND, id = %id))]
async fn delete_record<F: ResourceFields>(
    State(state): State<RecordState<F>>,
    principal: CurrentPrincipal,
    Path(id): Path<String>,
) -> ApiResult<Json<DeletedResponse>> {
    state.service.delete(principal.get(), &id).await?;
    Ok(Json(DeletedResponse { id, deleted: true }))
}
