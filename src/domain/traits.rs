//! Domain traits defining contracts for external systems.

use std::error::Error as StdError;

use async_trait::async_trait;

use super::error::AppError;
use super::types::{Hello, HelloId};

/// Persistence boundary for hello records.
///
/// Errors are returned as-is to the caller; a missing id surfaces as
/// `DatabaseError::NotFound` from `get`, `update` and `delete`.
#[async_trait]
pub trait HelloDatastore: Send + Sync {
    /// Check database connectivity
    async fn health_check(&self) -> Result<(), AppError>;

    /// Insert a new record; the store assigns the id
    async fn create(&self, message: &str) -> Result<Hello, AppError>;

    /// List records ordered by id
    async fn list(&self, limit: i64, offset: i64) -> Result<Vec<Hello>, AppError>;

    /// Get a single record by id
    async fn get(&self, id: HelloId) -> Result<Hello, AppError>;

    /// Replace the message of an existing record
    async fn update(&self, id: HelloId, message: &str) -> Result<Hello, AppError>;

    /// Delete a record
    async fn delete(&self, id: HelloId) -> Result<(), AppError>;
}

/// External error-reporting sink.
///
/// Called inline from the request pipeline, so implementations must not
/// block; network delivery belongs on a background task.
pub trait ErrorCapture: Send + Sync {
    fn capture(&self, error: &(dyn StdError + Send + Sync + 'static), trace_id: &str);
}

/// Capture sink used when no reporting backend is configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopCapture;

impl ErrorCapture for NoopCapture {
    fn capture(&self, _error: &(dyn StdError + Send + Sync + 'static), _trace_id: &str) {}
}
