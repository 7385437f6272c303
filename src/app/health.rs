//! Dependency health checking.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use tracing::{instrument, warn};

use crate::domain::{HealthStatus, HelloDatastore, ServiceStatus};

/// Deadline applied to a health check issued from the HTTP layer.
pub const HEALTH_CHECK_TIMEOUT: Duration = Duration::from_secs(5);

/// Name of the database entry in [`HealthStatus::services`].
pub const DATABASE_SERVICE: &str = "database";

/// Computes the health of the service's dependencies on demand.
///
/// Nothing is cached; every call pings the datastore once.
#[derive(Clone)]
pub struct HealthChecker {
    store: Arc<dyn HelloDatastore>,
}

impl HealthChecker {
    #[must_use]
    pub fn new(store: Arc<dyn HelloDatastore>) -> Self {
        Self { store }
    }

    #[instrument(skip(self))]
    pub async fn check(&self, deadline: Duration) -> HealthStatus {
        let database = match tokio::time::timeout(deadline, self.store.health_check()).await {
            Ok(Ok(())) => ServiceStatus::ok(),
            Ok(Err(e)) => {
                warn!(error = %e, "Database health check failed");
                ServiceStatus::error(e.to_string())
            }
            Err(_) => {
                warn!(?deadline, "Database health check timed out");
                ServiceStatus::error(format!("health check timed out after {deadline:?}"))
            }
        };

        let mut services = BTreeMap::new();
        services.insert(DATABASE_SERVICE.to_string(), database);
        HealthStatus::from_services(services)
    }
}
