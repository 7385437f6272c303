//! Database adapters.
//!
//! `postgres` implements the `HelloDatastore` trait defined in the domain
//! layer; `registry` opens the configured pools at startup.

pub mod postgres;
pub mod registry;

pub use postgres::{PostgresConfig, PostgresHelloStore};
pub use registry::{DatabaseRegistry, RetryPolicy};
