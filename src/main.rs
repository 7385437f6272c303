use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use secrecy::ExposeSecret;
use tokio::net::TcpListener;
use tracing::{error, info};

use hello_service::api::{RouterConfig, ShutdownOutcome, create_router, serve, shutdown_signal};
use hello_service::app::AppState;
use hello_service::domain::{ErrorCapture, NoopCapture};
use hello_service::infra::{
    AppConfig, DatabaseRegistry, HttpMetrics, PostgresConfig, PostgresHelloStore, SentryCapture,
    init_tracing,
};

const CAPTURE_FLUSH_TIMEOUT: Duration = Duration::from_secs(2);

#[tokio::main]
async fn main() -> Result<()> {
    let config = AppConfig::from_env().context("failed to load configuration")?;
    init_tracing(&config.logger);

    let sentry = match &config.sentry.dsn {
        Some(dsn) => Some(Arc::new(
            SentryCapture::new(dsn.expose_secret(), config.sentry.environment.clone())
                .context("invalid SENTRY_DSN")?,
        )),
        None => {
            info!("SENTRY_DSN not set, error capture disabled");
            None
        }
    };
    let capture: Arc<dyn ErrorCapture> = match &sentry {
        Some(sentry) => Arc::clone(sentry) as Arc<dyn ErrorCapture>,
        None => Arc::new(NoopCapture),
    };

    let registry = DatabaseRegistry::connect_all(&config.database, &PostgresConfig::default())
        .await
        .context("failed to connect to databases")?;
    info!(databases = ?registry.names().collect::<Vec<_>>(), "Databases ready");
    let store = Arc::new(PostgresHelloStore::new(registry.main()?));

    let metrics = Arc::new(HttpMetrics::new().context("failed to build metrics recorder")?);
    let state = Arc::new(AppState::new(store, metrics, capture));
    let router = create_router(
        state,
        &RouterConfig::from_config(&config.server, &config.metrics),
    );

    let listener = TcpListener::bind(config.server.address)
        .await
        .with_context(|| format!("failed to bind {}", config.server.address))?;
    info!(address = %config.server.address, "Server starting");

    let outcome = serve(
        listener,
        router,
        shutdown_signal(),
        config.server.shutdown_timeout,
    )
    .await?;
    if outcome == ShutdownOutcome::Forced {
        error!("server forced to shutdown");
    }

    if let Some(sentry) = sentry {
        let flushed = tokio::task::spawn_blocking(move || sentry.flush(CAPTURE_FLUSH_TIMEOUT))
            .await
            .unwrap_or(false);
        if !flushed {
            error!("Timed out flushing captured errors");
        }
    }
    registry.close().await;

    info!("server stopped");
    Ok(())
}
