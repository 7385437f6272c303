//! Named connection pools opened at startup.

use std::collections::BTreeMap;
use std::future::Future;
use std::time::Duration;

use sqlx::PgPool;
use tracing::{info, instrument, warn};

use super::postgres::{PostgresConfig, connect};
use crate::domain::{AppError, ConfigError, DatabaseError};
use crate::infra::config::{DatabaseConfig, MAIN_DATABASE};

/// Fixed-backoff retry for startup connections.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub attempts: u32,
    pub backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts: 5,
            backoff: Duration::from_secs(2),
        }
    }
}

/// Runs `op` until it succeeds or `policy.attempts` is exhausted, returning
/// the last error.
pub async fn with_retry<T, F, Fut>(name: &str, policy: RetryPolicy, mut op: F) -> Result<T, AppError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, AppError>>,
{
    let attempts = policy.attempts.max(1);
    let mut last_error = None;
    for attempt in 1..=attempts {
        if attempt > 1 {
            tokio::time::sleep(policy.backoff).await;
        }
        match op().await {
            Ok(value) => return Ok(value),
            Err(e) => {
                warn!(database = %name, attempt, attempts, error = %e, "Database connection failed");
                last_error = Some(e);
            }
        }
    }
    Err(last_error.unwrap_or_else(|| {
        AppError::Database(DatabaseError::Connection(format!("{name}: no attempts made")))
    }))
}

/// Every configured database, keyed by lowercase name.
#[derive(Debug, Clone)]
pub struct DatabaseRegistry {
    pools: BTreeMap<String, PgPool>,
}

impl DatabaseRegistry {
    /// Opens a pool per configured database. Any failure is fatal.
    #[instrument(skip_all)]
    pub async fn connect_all(
        config: &DatabaseConfig,
        pool_config: &PostgresConfig,
    ) -> Result<Self, AppError> {
        let policy = RetryPolicy {
            attempts: config.connect_attempts,
            backoff: config.connect_backoff,
        };

        let mut pools = BTreeMap::new();
        for (name, uri) in &config.uris {
            let pool = with_retry(name, policy, || connect(uri, pool_config)).await?;
            info!(database = %name, "Connected to PostgreSQL");
            pools.insert(name.clone(), pool);
        }

        Ok(Self { pools })
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&PgPool> {
        self.pools.get(name)
    }

    /// The mandatory `main` pool.
    pub fn main(&self) -> Result<PgPool, AppError> {
        self.get(MAIN_DATABASE)
            .cloned()
            .ok_or_else(|| AppError::Config(ConfigError::MissingEnvVar("DATABASE_URI".to_string())))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.pools.keys().map(String::as_str)
    }

    /// Closes every pool, waiting for checked-out connections to return.
    pub async fn close(&self) {
        for (name, pool) in &self.pools {
            pool.close().await;
            info!(database = %name, "Database pool closed");
        }
    }
}
