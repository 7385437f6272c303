//! Application state management.
//!
//! This module provides the shared application state that is
//! accessible to all request handlers and middleware via Axum's State
//! extractor.

use std::sync::Arc;

use crate::domain::{ErrorCapture, HelloDatastore};
use crate::infra::HttpMetrics;

use super::health::HealthChecker;
use super::service::HelloService;

/// Shared application state for the Axum web server.
///
/// Everything with process lifetime (the datastore, the metrics recorder,
/// the capture sink) is built once at startup and injected here.
///
/// # Example
///
/// ```ignore
/// let store = Arc::new(PostgresHelloStore::new(pool));
/// let metrics = Arc::new(HttpMetrics::new()?);
/// let state = Arc::new(AppState::new(store, metrics, Arc::new(NoopCapture)));
///
/// let router = create_router(state, &RouterConfig::default());
/// ```
#[derive(Clone)]
pub struct AppState {
    /// Hello usecase.
    pub service: Arc<HelloService>,

    /// Dependency health reporting.
    pub health: HealthChecker,

    /// HTTP request metrics.
    pub metrics: Arc<HttpMetrics>,

    /// Sink for 5xx responses and recovered panics.
    pub capture: Arc<dyn ErrorCapture>,
}

impl AppState {
    /// Wires the usecase and health checker to the same datastore.
    #[must_use]
    pub fn new(
        store: Arc<dyn HelloDatastore>,
        metrics: Arc<HttpMetrics>,
        capture: Arc<dyn ErrorCapture>,
    ) -> Self {
        Self {
            service: Arc::new(HelloService::new(Arc::clone(&store))),
            health: HealthChecker::new(store),
            metrics,
            capture,
        }
    }
}
