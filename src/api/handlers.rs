//! HTTP request handlers.
//!
//! Extractor rejections (malformed JSON, non-numeric ids) are taken as
//! `Result` arguments and converted into `AppError` so that every failure
//! leaves through the same error envelope.

use std::sync::Arc;

use axum::{
    Json,
    extract::{
        Path, Query, State,
        rejection::{JsonRejection, PathRejection, QueryRejection},
    },
    http::{StatusCode, Uri, header},
    response::{IntoResponse, Response},
};
use tracing::error;

use crate::app::{AppState, HEALTH_CHECK_TIMEOUT};
use crate::domain::{AppError, Hello, HelloId, HelloRequest, ListParams, ListQuery};

/// List hellos, ordered by id
pub async fn list_hellos(
    State(state): State<Arc<AppState>>,
    query: Result<Query<ListQuery>, QueryRejection>,
) -> Result<Json<Vec<Hello>>, AppError> {
    let query = query.map(|Query(query)| query).unwrap_or_default();
    let hellos = state.service.list(ListParams::from_query(&query)).await?;
    Ok(Json(hellos))
}

/// Get a single hello by id
pub async fn get_hello(
    State(state): State<Arc<AppState>>,
    id: Result<Path<HelloId>, PathRejection>,
) -> Result<Json<Hello>, AppError> {
    let Path(id) = id?;
    let hello = state.service.get(id).await?;
    Ok(Json(hello))
}

/// Create a new hello
pub async fn create_hello(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<HelloRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Hello>), AppError> {
    let Json(payload) = payload?;
    let hello = state.service.create(&payload).await?;
    Ok((StatusCode::CREATED, Json(hello)))
}

/// Replace the message of an existing hello
pub async fn update_hello(
    State(state): State<Arc<AppState>>,
    id: Result<Path<HelloId>, PathRejection>,
    payload: Result<Json<HelloRequest>, JsonRejection>,
) -> Result<Json<Hello>, AppError> {
    let Path(id) = id?;
    let Json(payload) = payload?;
    let hello = state.service.update(id, &payload).await?;
    Ok(Json(hello))
}

/// Delete a hello
pub async fn delete_hello(
    State(state): State<Arc<AppState>>,
    id: Result<Path<HelloId>, PathRejection>,
) -> Result<StatusCode, AppError> {
    let Path(id) = id?;
    state.service.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Detailed health check: 200 when every dependency is up, 503 otherwise
pub async fn health_check(State(state): State<Arc<AppState>>) -> Response {
    let health = state.health.check(HEALTH_CHECK_TIMEOUT).await;
    let status = if health.is_ok() {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    match serde_json::to_vec(&health) {
        Ok(body) => (
            status,
            [(header::CONTENT_TYPE, "application/json")],
            body,
        )
            .into_response(),
        Err(e) => {
            error!(error = %e, "Failed to encode health status");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

/// Liveness probe
pub async fn liveness() -> StatusCode {
    StatusCode::OK
}

/// Readiness probe
pub async fn readiness(State(state): State<Arc<AppState>>) -> StatusCode {
    if state.health.check(HEALTH_CHECK_TIMEOUT).await.is_ok() {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    }
}

/// Prometheus scrape endpoint
pub async fn metrics(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}

/// Fallback for unmatched routes
pub async fn not_found(uri: Uri) -> AppError {
    AppError::RouteNotFound(uri.path().to_string())
}
