//! PostgreSQL hello datastore.
//!
//! Expects a `hellos (id BIGSERIAL PRIMARY KEY, message TEXT NOT NULL)`
//! table; schema management happens outside this service.

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use sqlx::{PgPool, Row, postgres::PgPoolOptions};
use std::time::Duration;
use tracing::{info, instrument};

use crate::domain::{AppError, DatabaseError, Hello, HelloDatastore, HelloId};

/// PostgreSQL connection pool configuration
#[derive(Debug, Clone)]
pub struct PostgresConfig {
    pub max_connections: u32,
    pub min_connections: u32,
    pub acquire_timeout: Duration,
    pub idle_timeout: Duration,
    pub max_lifetime: Duration,
}

impl Default for PostgresConfig {
    fn default() -> Self {
        Self {
            max_connections: 10,
            min_connections: 2,
            acquire_timeout: Duration::from_secs(3),
            idle_timeout: Duration::from_secs(600),
            max_lifetime: Duration::from_secs(1800),
        }
    }
}

/// Opens a pool and verifies it with a round trip.
pub async fn connect(uri: &SecretString, config: &PostgresConfig) -> Result<PgPool, AppError> {
    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .acquire_timeout(config.acquire_timeout)
        .idle_timeout(config.idle_timeout)
        .max_lifetime(config.max_lifetime)
        .connect(uri.expose_secret())
        .await
        .map_err(|e| AppError::Database(DatabaseError::Connection(e.to_string())))?;

    sqlx::query("SELECT 1")
        .execute(&pool)
        .await
        .map_err(|e| AppError::Database(DatabaseError::Connection(e.to_string())))?;

    Ok(pool)
}

/// Hello datastore over a shared connection pool
pub struct PostgresHelloStore {
    pool: PgPool,
}

impl PostgresHelloStore {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Get the underlying connection pool (for testing)
    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    fn row_to_hello(row: &sqlx::postgres::PgRow) -> Result<Hello, AppError> {
        let id: i64 = row.try_get("id").map_err(db_error)?;
        let message: String = row.try_get("message").map_err(db_error)?;

        let id = HelloId::try_from(id).map_err(|_| {
            AppError::Database(DatabaseError::Query(format!("negative hello id {id}")))
        })?;
        Ok(Hello { id, message })
    }
}

fn db_error(err: sqlx::Error) -> AppError {
    AppError::Database(DatabaseError::from(err))
}

fn not_found(id: HelloId) -> AppError {
    AppError::Database(DatabaseError::NotFound(format!("hello {id}")))
}

/// Ids beyond `i64::MAX` cannot exist in a BIGSERIAL column.
fn to_db_id(id: HelloId) -> Result<i64, AppError> {
    i64::try_from(id).map_err(|_| not_found(id))
}

#[async_trait]
impl HelloDatastore for PostgresHelloStore {
    #[instrument(skip(self))]
    async fn health_check(&self) -> Result<(), AppError> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::Database(DatabaseError::Connection(e.to_string())))?;
        Ok(())
    }

    #[instrument(skip(self, message))]
    async fn create(&self, message: &str) -> Result<Hello, AppError> {
        let row = sqlx::query("INSERT INTO hellos (message) VALUES ($1) RETURNING id, message")
            .bind(message)
            .fetch_one(&self.pool)
            .await
            .map_err(db_error)?;

        let hello = Self::row_to_hello(&row)?;
        info!(hello_id = hello.id, "Inserted hello");
        Ok(hello)
    }

    #[instrument(skip(self))]
    async fn list(&self, limit: i64, offset: i64) -> Result<Vec<Hello>, AppError> {
        let rows = sqlx::query("SELECT id, message FROM hellos ORDER BY id LIMIT $1 OFFSET $2")
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await
            .map_err(db_error)?;

        rows.iter().map(Self::row_to_hello).collect()
    }

    #[instrument(skip(self))]
    async fn get(&self, id: HelloId) -> Result<Hello, AppError> {
        let row = sqlx::query("SELECT id, message FROM hellos WHERE id = $1")
            .bind(to_db_id(id)?)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error)?;

        match row {
            Some(row) => Self::row_to_hello(&row),
            None => Err(not_found(id)),
        }
    }

    #[instrument(skip(self, message))]
    async fn update(&self, id: HelloId, message: &str) -> Result<Hello, AppError> {
        let row =
            sqlx::query("UPDATE hellos SET message = $1 WHERE id = $2 RETURNING id, message")
                .bind(message)
                .bind(to_db_id(id)?)
                .fetch_optional(&self.pool)
                .await
                .map_err(db_error)?;

        match row {
            Some(row) => Self::row_to_hello(&row),
            None => Err(not_found(id)),
        }
    }

    #[instrument(skip(self))]
    async fn delete(&self, id: HelloId) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM hellos WHERE id = $1")
            .bind(to_db_id(id)?)
            .execute(&self.pool)
            .await
            .map_err(db_error)?;

        if result.rows_affected() == 0 {
            return Err(not_found(id));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ErrorKind;

    #[test]
    fn test_postgres_config_default() {
        let config = PostgresConfig::default();
        assert_eq!(config.max_connections, 10);
        assert_eq!(config.min_connections, 2);
        assert_eq!(config.acquire_timeout, Duration::from_secs(3));
    }

    #[test]
    fn test_out_of_range_id_is_not_found() {
        let err = to_db_id(u64::MAX).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert_eq!(to_db_id(7).unwrap(), 7);
    }
}
