//! Mock implementations for testing.
//!
//! These mocks provide in-memory implementations of domain traits
//! that can be configured to simulate various scenarios including
//! success, failure, slow dependencies and outages.

use async_trait::async_trait;
use std::collections::BTreeMap;
use std::error::Error as StdError;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use crate::domain::{
    AppError, DatabaseError, ErrorCapture, ErrorKind, Hello, HelloDatastore, HelloId, error_chain,
    kind_of,
};

/// Configuration for mock behavior.
#[derive(Debug, Clone, Default)]
pub struct MockConfig {
    /// If true, operations will fail.
    pub should_fail: bool,
    /// Custom error message for failures.
    pub error_message: Option<String>,
    /// Simulated latency in milliseconds.
    pub latency_ms: Option<u64>,
}

impl MockConfig {
    /// Creates a config that always succeeds.
    #[must_use]
    pub fn success() -> Self {
        Self::default()
    }

    /// Creates a config that always fails.
    #[must_use]
    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            should_fail: true,
            error_message: Some(message.into()),
            latency_ms: None,
        }
    }

    /// Adds simulated latency.
    #[must_use]
    pub fn with_latency(mut self, ms: u64) -> Self {
        self.latency_ms = Some(ms);
        self
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// In-memory hello datastore.
///
/// Ids are assigned sequentially from 1, records are kept ordered by id,
/// and the arguments of the last `list` call are recorded so tests can
/// check what the handler forwarded.
///
/// # Example
///
/// ```
/// use hello_service::test_utils::{MockHelloDatastore, mocks::MockConfig};
///
/// // Create a mock that succeeds
/// let mock = MockHelloDatastore::new();
///
/// // Create a mock that fails
/// let failing_mock = MockHelloDatastore::with_config(MockConfig::failure("DB error"));
/// ```
pub struct MockHelloDatastore {
    storage: Mutex<BTreeMap<HelloId, Hello>>,
    next_id: AtomicU64,
    config: MockConfig,
    call_count: AtomicU64,
    is_healthy: AtomicBool,
    last_list: Mutex<Option<(i64, i64)>>,
}

impl MockHelloDatastore {
    /// Creates a new mock with default (success) configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(MockConfig::success())
    }

    /// Creates a new mock with the given configuration.
    #[must_use]
    pub fn with_config(config: MockConfig) -> Self {
        Self {
            storage: Mutex::new(BTreeMap::new()),
            next_id: AtomicU64::new(1),
            config,
            call_count: AtomicU64::new(0),
            is_healthy: AtomicBool::new(true),
            last_list: Mutex::new(None),
        }
    }

    /// Creates a mock that always fails.
    #[must_use]
    pub fn failing(message: impl Into<String>) -> Self {
        Self::with_config(MockConfig::failure(message))
    }

    /// Gets the number of times any method was called.
    pub fn call_count(&self) -> u64 {
        self.call_count.load(Ordering::Relaxed)
    }

    /// Sets the health status.
    pub fn set_healthy(&self, healthy: bool) {
        self.is_healthy.store(healthy, Ordering::Relaxed);
    }

    /// The `(limit, offset)` pair passed to the most recent `list` call.
    pub fn last_list_params(&self) -> Option<(i64, i64)> {
        *lock(&self.last_list)
    }

    /// Gets all stored records in id order.
    pub fn all(&self) -> Vec<Hello> {
        lock(&self.storage).values().cloned().collect()
    }

    async fn enter(&self) -> Result<(), AppError> {
        self.call_count.fetch_add(1, Ordering::Relaxed);

        if let Some(ms) = self.config.latency_ms {
            tokio::time::sleep(Duration::from_millis(ms)).await;
        }

        if self.config.should_fail {
            let msg = self
                .config
                .error_message
                .clone()
                .unwrap_or_else(|| "Mock database error".to_string());
            return Err(AppError::Database(DatabaseError::Query(msg)));
        }
        Ok(())
    }

    fn not_found(id: HelloId) -> AppError {
        AppError::Database(DatabaseError::NotFound(format!("hello {id}")))
    }
}

impl Default for MockHelloDatastore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl HelloDatastore for MockHelloDatastore {
    async fn health_check(&self) -> Result<(), AppError> {
        if !self.is_healthy.load(Ordering::Relaxed) {
            self.call_count.fetch_add(1, Ordering::Relaxed);
            return Err(AppError::Database(DatabaseError::Connection(
                "Mock database unhealthy".to_string(),
            )));
        }

        self.enter().await
    }

    async fn create(&self, message: &str) -> Result<Hello, AppError> {
        self.enter().await?;

        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let hello = Hello::new(id, message);
        lock(&self.storage).insert(id, hello.clone());

        Ok(hello)
    }

    async fn list(&self, limit: i64, offset: i64) -> Result<Vec<Hello>, AppError> {
        *lock(&self.last_list) = Some((limit, offset));
        self.enter().await?;

        let skip = usize::try_from(offset).unwrap_or(0);
        let take = usize::try_from(limit).unwrap_or(usize::MAX);
        Ok(lock(&self.storage)
            .values()
            .skip(skip)
            .take(take)
            .cloned()
            .collect())
    }

    async fn get(&self, id: HelloId) -> Result<Hello, AppError> {
        self.enter().await?;

        lock(&self.storage)
            .get(&id)
            .cloned()
            .ok_or_else(|| Self::not_found(id))
    }

    async fn update(&self, id: HelloId, message: &str) -> Result<Hello, AppError> {
        self.enter().await?;

        let mut storage = lock(&self.storage);
        match storage.get_mut(&id) {
            Some(existing) => {
                existing.message = message.to_string();
                Ok(existing.clone())
            }
            None => Err(Self::not_found(id)),
        }
    }

    async fn delete(&self, id: HelloId) -> Result<(), AppError> {
        self.enter().await?;

        lock(&self.storage)
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| Self::not_found(id))
    }
}

/// An error observed by [`RecordingCapture`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapturedError {
    pub message: String,
    pub kind: ErrorKind,
    pub trace_id: String,
    /// Display text of every error in the source chain, outermost first.
    pub chain: Vec<String>,
}

/// Capture sink that keeps everything it is handed.
#[derive(Debug, Default)]
pub struct RecordingCapture {
    captured: Mutex<Vec<CapturedError>>,
}

impl RecordingCapture {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn captured(&self) -> Vec<CapturedError> {
        lock(&self.captured).clone()
    }

    pub fn len(&self) -> usize {
        lock(&self.captured).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl ErrorCapture for RecordingCapture {
    fn capture(&self, error: &(dyn StdError + Send + Sync + 'static), trace_id: &str) {
        lock(&self.captured).push(CapturedError {
            message: error.to_string(),
            kind: kind_of(error),
            trace_id: trace_id.to_string(),
            chain: error_chain(error),
        });
    }
}
