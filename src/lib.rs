//! Hello Service
//!
//! A CRUD REST service for short "hello" messages stored in PostgreSQL,
//! wrapped in a production request pipeline: trace-ID propagation,
//! request logging, Prometheus metrics, panic recovery, error capture
//! and health checks.
//!
//! # Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │                   API Layer                  │
//! │   Handlers, middleware, routing, serving     │
//! ├─────────────────────────────────────────────┤
//! │               Application Layer              │
//! │   Hello usecase, health checker, app state   │
//! ├─────────────────────────────────────────────┤
//! │                 Domain Layer                 │
//! │        Traits, types, error taxonomy         │
//! ├─────────────────────────────────────────────┤
//! │             Infrastructure Layer             │
//! │  Config, Postgres, metrics, error capture    │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use hello_service::api::{RouterConfig, create_router};
//! use hello_service::app::AppState;
//! use hello_service::domain::NoopCapture;
//! use hello_service::infra::{HttpMetrics, PostgresHelloStore};
//!
//! let store = Arc::new(PostgresHelloStore::new(pool));
//! let state = Arc::new(AppState::new(store, Arc::new(HttpMetrics::new()?), Arc::new(NoopCapture)));
//! let router = create_router(state, &RouterConfig::default());
//! axum::serve(listener, router).await?;
//! ```

pub mod api;
pub mod app;
pub mod domain;
pub mod infra;

/// In-memory datastore and capture doubles, shared by unit and integration tests.
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
