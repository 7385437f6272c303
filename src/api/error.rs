//! Error-to-HTTP mapping and the JSON error envelope.

use std::error::Error as StdError;
use std::sync::Arc;

use axum::{
    Json,
    extract::rejection::{JsonRejection, PathRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use tracing::{error, info};

use crate::domain::{AppError, ErrorKind, ErrorResponse, ValidationError, kind_of};

use super::middleware::current_trace_id;

/// Message returned to clients for every internal error.
pub const INTERNAL_MESSAGE: &str = "internal server error";

/// Response extension carrying the error a handler failed with, so the
/// error-handling middleware can forward the original to error capture.
#[derive(Debug, Clone)]
pub struct HandlerFailure(pub Arc<AppError>);

/// Maps an error to `(status, code, message)`.
///
/// `None` maps to `(200, "", "")`. Internal errors never expose their text.
#[must_use]
pub fn map_error(err: Option<&(dyn StdError + 'static)>) -> (StatusCode, &'static str, String) {
    let Some(err) = err else {
        return (StatusCode::OK, "", String::new());
    };

    let kind = kind_of(err);
    let status = match kind {
        ErrorKind::BadRequest => StatusCode::BAD_REQUEST,
        ErrorKind::NotFound => StatusCode::NOT_FOUND,
        ErrorKind::AlreadyExists => StatusCode::CONFLICT,
        ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
    };
    let message = match kind {
        ErrorKind::Internal => INTERNAL_MESSAGE.to_string(),
        _ => err.to_string(),
    };

    (status, kind.code(), message)
}

/// Builds an error envelope response.
pub fn error_response(status: StatusCode, code: &str, message: &str, trace_id: &str) -> Response {
    (status, Json(ErrorResponse::new(code, message, trace_id))).into_response()
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = map_error(Some(&self));
        let trace_id = current_trace_id();

        if status.is_server_error() {
            error!(
                status = status.as_u16(),
                code,
                error = %self,
                trace_id = %trace_id,
                "Server error"
            );
        } else {
            info!(
                status = status.as_u16(),
                code,
                message = %message,
                trace_id = %trace_id,
                "Client error"
            );
        }

        let mut response = error_response(status, code, &message, &trace_id);
        if status.is_server_error() {
            response
                .extensions_mut()
                .insert(HandlerFailure(Arc::new(self)));
        }
        response
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::Validation(ValidationError::InvalidFormat(rejection.body_text()))
    }
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        AppError::Validation(ValidationError::InvalidField {
            field: "id".to_string(),
            message: rejection.body_text(),
        })
    }
}
