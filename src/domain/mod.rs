//! Domain layer containing core business types, traits, and error definitions.

pub mod error;
pub mod traits;
pub mod types;

pub use error::{
    AppError, ConfigError, DatabaseError, ErrorKind, ServerErrorResponse, ValidationError, error_chain,
    kind_of,
};
pub use traits::{ErrorCapture, HelloDatastore, NoopCapture};
pub use types::{
    ErrorDetail, ErrorResponse, HealthStatus, Hello, HelloId, HelloRequest, ListParams, ListQuery,
    OverallStatus, ServiceState, ServiceStatus,
};
