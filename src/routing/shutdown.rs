//! Signal handling and the graceful shutdown deadline.

use crate::core::error::{ToolkitError, ToolkitResult};
use std::future::Future;
use std::time::Duration;
use tokio::sync::oneshot;
use tokio::task::{JoinError, JoinHandle};
use tracing::{error, info, warn};

/// Resolve on SIGINT (Ctrl+C) or, on unix, SIGTERM
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to listen for SIGINT");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
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
        _ = ctrl_c => info!("📡 Received SIGINT (Ctrl+C), initiating graceful shutdown..."),
        _ = terminate => info!("📡 Received SIGTERM, initiating graceful shutdown..."),
    }
}

/// Drive a spawned server task until `signal` fires, then ask it to stop through `stop`
/// and give it `deadline` to drain.
///
/// If the server task ends on its own first, its result is returned unchanged.
pub(crate) async fn run_until_signal<S>(
    mut server: JoinHandle<ToolkitResult<()>>,
    stop: oneshot::Sender<()>,
    signal: S,
    deadline: Duration,
) -> ToolkitResult<()>
where
    S: Future<Output = ()> + Send,
{
    tokio::select! {
        _ = signal => {}
        result = &mut server => return flatten(result),
    }

    info!("🛑 Shutting down server...");
    if stop.send(()).is_err() {
        warn!("Server task already stopped accepting connections");
    }

    match tokio::time::timeout(deadline, &mut server).await {
        Ok(result) => {
            let result = flatten(result);
            if result.is_ok() {
                info!("✅ Server shutdown completed gracefully");
            }
            result
        }
        Err(_) => {
            server.abort();
            error!(deadline_secs = deadline.as_secs(), "Server forced to shutdown");
            Err(ToolkitError::shutdown(format!(
                "in-flight requests did not finish within {:?}",
                deadline
            )))
        }
    }
}

fn flatten(result: Result<ToolkitResult<()>, JoinError>) -> ToolkitResult<()> {
    match result {
        Ok(inner) => inner,
        Err(e) => Err(ToolkitError::server(format!("Server task failed: {}", e))),
    }
}
