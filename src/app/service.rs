//! Application service layer.
//!
//! The hello usecase is a thin pass-through: it validates request payloads
//! and forwards to the datastore, returning datastore errors unchanged.

use std::sync::Arc;
use tracing::{debug, info, instrument, warn};
use validator::Validate;

use crate::domain::{AppError, Hello, HelloDatastore, HelloId, HelloRequest, ListParams};

/// Usecase orchestrating hello CRUD operations.
///
/// # Example
///
/// ```ignore
/// let store = Arc::new(PostgresHelloStore::new(pool));
/// let service = HelloService::new(store);
///
/// let hello = service.create(&HelloRequest::new("hi")).await?;
/// ```
pub struct HelloService {
    store: Arc<dyn HelloDatastore>,
}

impl HelloService {
    #[must_use]
    pub fn new(store: Arc<dyn HelloDatastore>) -> Self {
        Self { store }
    }

    /// Lists records ordered by id.
    #[instrument(skip(self), fields(limit = params.limit, offset = params.offset))]
    pub async fn list(&self, params: ListParams) -> Result<Vec<Hello>, AppError> {
        let hellos = self.store.list(params.limit, params.offset).await?;
        debug!(count = hellos.len(), "Listed hellos");
        Ok(hellos)
    }

    #[instrument(skip(self))]
    pub async fn get(&self, id: HelloId) -> Result<Hello, AppError> {
        self.store.get(id).await
    }

    /// Validates and persists a new record.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Validation` when the message is empty or too long,
    /// otherwise whatever the datastore reports.
    #[instrument(skip(self, request))]
    pub async fn create(&self, request: &HelloRequest) -> Result<Hello, AppError> {
        validate(request)?;

        let hello = self.store.create(&request.message).await?;
        info!(hello_id = hello.id, "Hello created");
        Ok(hello)
    }

    /// Replaces the message of an existing record.
    #[instrument(skip(self, request))]
    pub async fn update(&self, id: HelloId, request: &HelloRequest) -> Result<Hello, AppError> {
        validate(request)?;

        let hello = self.store.update(id, &request.message).await?;
        info!(hello_id = hello.id, "Hello updated");
        Ok(hello)
    }

    #[instrument(skip(self))]
    pub async fn delete(&self, id: HelloId) -> Result<(), AppError> {
        self.store.delete(id).await?;
        info!(hello_id = id, "Hello deleted");
        Ok(())
    }
}

fn validate(request: &HelloRequest) -> Result<(), AppError> {
    request.validate().map_err(|e| {
        warn!(error = %e, "Validation failed for hello request");
        AppError::from(e)
    })
}
