//! Infrastructure layer implementations.

pub mod capture;
pub mod config;
pub mod database;
pub mod observability;

pub use capture::SentryCapture;
pub use config::AppConfig;
pub use database::{DatabaseRegistry, PostgresConfig, PostgresHelloStore};
pub use observability::{HttpMetrics, LogFormat, LoggerConfig, init_tracing};
