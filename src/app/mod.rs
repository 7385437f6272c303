//! Application layer containing the usecase, health checking and shared state.

pub mod health;
pub mod service;
pub mod state;

pub use health::{HEALTH_CHECK_TIMEOUT, HealthChecker};
pub use service::HelloService;
pub use state::AppState;
