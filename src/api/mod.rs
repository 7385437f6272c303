//! The API layer, containing web handlers, middleware, routing and serving.

pub mod error;
pub mod handlers;
pub mod middleware;
pub mod router;
pub mod server;

pub use error::{error_response, map_error};
pub use middleware::{current_trace_id, trace_id_of};
pub use router::{RouterConfig, create_router, with_middleware};
pub use server::{ShutdownOutcome, serve, shutdown_signal};
