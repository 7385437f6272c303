//! Error capture backed by the Sentry SDK.
//!
//! [`SentryCapture`] owns its own [`Hub`] instead of binding the process-wide
//! one, so it is injected like any other collaborator. Delivery happens on
//! the SDK's transport thread; [`SentryCapture::flush`] waits for it.

use std::borrow::Cow;
use std::error::Error as StdError;
use std::sync::Arc;
use std::time::Duration;

use sentry::types::Dsn;
use sentry::{Client, ClientOptions, Hub, Level, Scope};
use tracing::{debug, info, warn};

use crate::domain::{ConfigError, ErrorCapture, kind_of};

pub const TRACE_ID_TAG: &str = "trace_id";
pub const ERROR_KIND_TAG: &str = "error_kind";

/// Forwards captured errors to Sentry.
pub struct SentryCapture {
    hub: Arc<Hub>,
}

impl SentryCapture {
    /// Builds a client for `dsn` reporting under `environment`.
    ///
    /// # Errors
    /// Returns `ConfigError::InvalidValue` if the DSN does not parse.
    pub fn new(dsn: &str, environment: impl Into<String>) -> Result<Self, ConfigError> {
        let dsn: Dsn = dsn.parse().map_err(|e: sentry::types::ParseDsnError| {
            ConfigError::InvalidValue {
                key: "SENTRY_DSN".to_string(),
                message: e.to_string(),
            }
        })?;
        info!(host = dsn.host(), project_id = %dsn.project_id(), "Error capture enabled");

        Ok(Self::with_options(ClientOptions {
            dsn: Some(dsn),
            environment: Some(Cow::Owned(environment.into())),
            ..ClientOptions::default()
        }))
    }

    #[must_use]
    pub fn with_options(options: ClientOptions) -> Self {
        let client = Arc::new(Client::from(options));
        Self {
            hub: Arc::new(Hub::new(Some(client), Arc::new(Scope::default()))),
        }
    }

    /// Blocks until queued events are sent or `timeout` passes.
    /// Returns `false` on timeout.
    pub fn flush(&self, timeout: Duration) -> bool {
        let Some(client) = self.hub.client() else {
            return true;
        };
        let flushed = client.flush(Some(timeout));
        if !flushed {
            warn!(?timeout, "Error capture flush timed out");
        }
        flushed
    }
}

impl ErrorCapture for SentryCapture {
    fn capture(&self, error: &(dyn StdError + Send + Sync + 'static), trace_id: &str) {
        // Tags go on the event itself; a shared hub's scope stack is not
        // per-request.
        let mut event = sentry::event_from_error(error);
        event.level = Level::Error;
        event
            .tags
            .insert(TRACE_ID_TAG.to_string(), trace_id.to_string());
        event
            .tags
            .insert(ERROR_KIND_TAG.to_string(), kind_of(error).code().to_string());

        let event_id = self.hub.capture_event(event);
        debug!(%event_id, trace_id, "Error captured");
    }
}
