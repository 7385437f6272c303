//! Serving with bounded graceful shutdown.

use std::future::Future;
use std::io;
use std::time::Duration;

use axum::Router;
use tokio::net::TcpListener;
use tokio::signal;
use tokio::sync::oneshot;
use tracing::{error, info, warn};

/// How the server stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownOutcome {
    /// All in-flight requests finished within the grace period.
    Graceful,
    /// The grace period elapsed with requests still in flight.
    Forced,
}

/// Serves `router` until `signal` resolves, then stops accepting and gives
/// in-flight requests up to `grace` to finish.
///
/// # Errors
/// Returns the underlying I/O error if the accept loop fails.
pub async fn serve<F>(
    listener: TcpListener,
    router: Router,
    signal: F,
    grace: Duration,
) -> io::Result<ShutdownOutcome>
where
    F: Future<Output = ()> + Send + 'static,
{
    let (signalled_tx, mut signalled_rx) = oneshot::channel::<()>();
    let shutdown = async move {
        signal.await;
        let _ = signalled_tx.send(());
    };

    let server = axum::serve(listener, router)
        .with_graceful_shutdown(shutdown)
        .into_future();
    tokio::pin!(server);

    tokio::select! {
        result = &mut server => {
            result?;
            return Ok(ShutdownOutcome::Graceful);
        }
        Ok(()) = &mut signalled_rx => {}
    }

    info!(?grace, "Shutdown signal received, draining in-flight requests");
    match tokio::time::timeout(grace, &mut server).await {
        Ok(result) => {
            result?;
            Ok(ShutdownOutcome::Graceful)
        }
        Err(_) => {
            warn!(?grace, "Grace period elapsed with requests still in flight");
            Ok(ShutdownOutcome::Forced)
        }
    }
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM).
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => info!("Received Ctrl+C, initiating graceful shutdown"),
        () = terminate => info!("Received SIGTERM, initiating graceful shutdown"),
    }
}
