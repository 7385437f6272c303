//! HTTP middleware for the request pipeline.
//!
//! Outermost to innermost: trace ID, request span, metrics, error handling.
//! `tag_matched_path` is a route layer and only runs for matched routes.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Instant;

use axum::{
    extract::{MatchedPath, Request, State},
    http::{HeaderName, HeaderValue},
    middleware::Next,
    response::Response,
};
use futures::FutureExt;
use tracing::error;

use crate::app::AppState;
use crate::domain::{AppError, ServerErrorResponse};

use super::error::{HandlerFailure, error_response, map_error};

tokio::task_local! {
    static TRACE_ID: String;
}

/// Trace ID of a request, stored in its extensions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TraceId(pub String);

/// Header the trace ID is read from and written to.
#[derive(Debug, Clone)]
pub struct TraceHeader(pub HeaderName);

/// Route template that matched a request, stored in response extensions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteTemplate(pub String);

/// Trace ID of the request being handled on this task, or `""` outside a
/// request.
#[must_use]
pub fn current_trace_id() -> String {
    TRACE_ID.try_with(Clone::clone).unwrap_or_default()
}

/// Trace ID attached to `request`, or `""` if the request has not passed
/// through [`propagate_trace_id`].
#[must_use]
pub fn trace_id_of<B>(request: &axum::http::Request<B>) -> &str {
    request
        .extensions()
        .get::<TraceId>()
        .map_or("", |id| id.0.as_str())
}

fn incoming_trace_id(request: &Request, header: &HeaderName) -> Option<HeaderValue> {
    request
        .headers()
        .get(header)
        .filter(|value| !value.is_empty())
        .cloned()
}

/// Reuses the incoming trace ID or generates one, echoes it on the response
/// and scopes the rest of the pipeline to it.
///
/// A non-empty incoming value is echoed byte for byte. Inside the service it
/// is carried as lossy UTF-8.
pub async fn propagate_trace_id(
    State(header): State<TraceHeader>,
    mut request: Request,
    next: Next,
) -> Response {
    let (value, trace_id) = match incoming_trace_id(&request, &header.0) {
        Some(value) => {
            let trace_id = String::from_utf8_lossy(value.as_bytes()).into_owned();
            (Some(value), trace_id)
        }
        None => {
            let trace_id = uuid::Uuid::new_v4().to_string();
            (HeaderValue::from_str(&trace_id).ok(), trace_id)
        }
    };

    request.extensions_mut().insert(TraceId(trace_id.clone()));
    let mut response = TRACE_ID.scope(trace_id, next.run(request)).await;

    if let Some(value) = value {
        response.headers_mut().insert(header.0, value);
    }
    response
}

/// Copies the matched route template onto the response for [`track_metrics`].
pub async fn tag_matched_path(request: Request, next: Next) -> Response {
    let template = request
        .extensions()
        .get::<MatchedPath>()
        .map(|path| path.as_str().to_owned());

    let mut response = next.run(request).await;
    if let Some(template) = template {
        response.extensions_mut().insert(RouteTemplate(template));
    }
    response
}

/// Records request count and latency, labelled by route template.
pub async fn track_metrics(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Response {
    let start = Instant::now();
    let method = request.method().to_string();
    let raw_path = request.uri().path().to_owned();

    let response = next.run(request).await;

    let path = response
        .extensions()
        .get::<RouteTemplate>()
        .map_or(raw_path, |template| template.0.clone());
    state
        .metrics
        .record(&method, &path, response.status().as_u16(), start.elapsed());

    response
}

/// Recovers from handler panics and reports 5xx responses to error capture.
///
/// Panics become a 500 `internal_error` envelope. Other responses pass
/// through unchanged.
pub async fn handle_errors(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Response {
    let method = request.method().to_string();
    let path = request.uri().path().to_owned();
    let trace_id = trace_id_of(&request).to_owned();

    match AssertUnwindSafe(next.run(request)).catch_unwind().await {
        Ok(response) => {
            let status = response.status();
            if status.is_server_error() {
                let err = ServerErrorResponse {
                    status: status.as_u16(),
                    method,
                    path,
                    source: response
                        .extensions()
                        .get::<HandlerFailure>()
                        .map(|failure| Arc::clone(&failure.0)),
                };
                state.capture.capture(&err, &trace_id);
            }
            response
        }
        Err(payload) => {
            let err = AppError::from_panic(payload);
            let (status, code, message) = map_error(Some(&err));
            error!(
                status = status.as_u16(),
                code,
                message = %message,
                error = %err,
                trace_id = %trace_id,
                "Recovered from panic"
            );
            state.capture.capture(&err, &trace_id);
            error_response(status, code, &message, &trace_id)
        }
    }
}
