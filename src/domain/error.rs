//! Application error types with proper error chaining.
//!
//! Every failure that reaches the HTTP layer resolves to exactly one
//! [`ErrorKind`]. Resolution walks the `source()` chain, so a taxonomy error
//! wrapped by another error (an `anyhow` context, a [`ServerErrorResponse`])
//! keeps its kind.

use std::error::Error as StdError;
use std::sync::Arc;

use thiserror::Error;

/// Closed set of semantic error categories surfaced to clients.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    #[error("bad request")]
    BadRequest,
    #[error("not found")]
    NotFound,
    #[error("already exists")]
    AlreadyExists,
    #[error("internal error")]
    Internal,
}

impl ErrorKind {
    /// Machine-readable code used in the error envelope.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            ErrorKind::BadRequest => "bad_request",
            ErrorKind::NotFound => "not_found",
            ErrorKind::AlreadyExists => "already_exists",
            ErrorKind::Internal => "internal_error",
        }
    }

    pub const ALL: [ErrorKind; 4] = [
        ErrorKind::BadRequest,
        ErrorKind::NotFound,
        ErrorKind::AlreadyExists,
        ErrorKind::Internal,
    ];
}

#[derive(Error, Debug, Clone)]
pub enum DatabaseError {
    #[error("Connection failed: {0}")]
    Connection(String),
    #[error("Query execution failed: {0}")]
    Query(String),
    #[error("Record not found: {0}")]
    NotFound(String),
    #[error("Duplicate record: {0}")]
    Duplicate(String),
    #[error("Pool exhausted: {0}")]
    PoolExhausted(String),
}

impl DatabaseError {
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            DatabaseError::NotFound(_) => ErrorKind::NotFound,
            DatabaseError::Duplicate(_) => ErrorKind::AlreadyExists,
            _ => ErrorKind::Internal,
        }
    }
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid value for '{key}': {message}")]
    InvalidValue { key: String, message: String },
    #[error("Parse error: {0}")]
    ParseError(String),
}

#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("Invalid field '{field}': {message}")]
    InvalidField { field: String, message: String },
    #[error("Invalid format: {0}")]
    InvalidFormat(String),
    #[error("Validation failed: {0}")]
    Multiple(String),
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error(transparent)]
    Database(#[from] DatabaseError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("Route not found: {0}")]
    RouteNotFound(String),
    #[error("Internal error: {0}")]
    Internal(String),
    #[error("panic: {0}")]
    Panic(String),
}

impl AppError {
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            AppError::Database(db_err) => db_err.kind(),
            AppError::Validation(_) => ErrorKind::BadRequest,
            AppError::RouteNotFound(_) => ErrorKind::NotFound,
            AppError::Config(_)
            | AppError::Internal(_)
            | AppError::Panic(_) => ErrorKind::Internal,
        }
    }

    /// Converts a payload caught by `catch_unwind` into an error.
    #[must_use]
    pub fn from_panic(payload: Box<dyn std::any::Any + Send>) -> Self {
        let message = match payload.downcast::<String>() {
            Ok(message) => *message,
            Err(payload) => match payload.downcast::<&'static str>() {
                Ok(message) => (*message).to_string(),
                Err(_) => "handler panicked with a non-string payload".to_string(),
            },
        };
        AppError::Panic(message)
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(err: validator::ValidationErrors) -> Self {
        AppError::Validation(ValidationError::Multiple(err.to_string()))
    }
}

impl From<sqlx::Error> for DatabaseError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => DatabaseError::NotFound("Row not found".to_string()),
            sqlx::Error::PoolTimedOut => DatabaseError::PoolExhausted("Pool timed out".to_string()),
            sqlx::Error::Database(db_err) => {
                if db_err.code().is_some_and(|code| code == "23505") {
                    return DatabaseError::Duplicate(db_err.message().to_string());
                }
                DatabaseError::Query(db_err.message().to_string())
            }
            sqlx::Error::Io(io_err) => DatabaseError::Connection(io_err.to_string()),
            _ => DatabaseError::Query(err.to_string()),
        }
    }
}

/// A response with a 5xx status observed after the handler completed.
#[derive(Error, Debug)]
#[error("http {status} {method} {path}")]
pub struct ServerErrorResponse {
    pub status: u16,
    pub method: String,
    pub path: String,
    #[source]
    pub source: Option<Arc<AppError>>,
}

/// Resolves the kind of an arbitrary error by walking its source chain.
///
/// The first link that belongs to the taxonomy decides; errors with no
/// taxonomy link anywhere in the chain are internal.
#[must_use]
pub fn kind_of(err: &(dyn StdError + 'static)) -> ErrorKind {
    let mut current = Some(err);
    while let Some(err) = current {
        if let Some(kind) = err.downcast_ref::<ErrorKind>() {
            return *kind;
        }
        if let Some(app_err) = err.downcast_ref::<AppError>() {
            return app_err.kind();
        }
        if let Some(db_err) = err.downcast_ref::<DatabaseError>() {
            return db_err.kind();
        }
        if err.downcast_ref::<ValidationError>().is_some() {
            return ErrorKind::BadRequest;
        }
        if let Some(shared) = err.downcast_ref::<Arc<AppError>>() {
            return shared.kind();
        }
        current = err.source();
    }
    ErrorKind::Internal
}

/// Display text of every error in the source chain, outermost first.
#[must_use]
pub fn error_chain(err: &(dyn StdError + 'static)) -> Vec<String> {
    let mut chain = Vec::new();
    let mut current = Some(err);
    while let Some(err) = current {
        chain.push(err.to_string());
        current = err.source();
    }
    chain
}
