use std::sync::Arc;
use std::time::Duration;

use actix_web::dev::ServerHandle;
use tokio::signal;
use tokio::time::timeout;
use tracing::{error, info, warn};

use crate::services::maintenance::{self, MaintenanceTasks};
use crate::storage::{LinkStore, SnapshotFile};

/// 关闭超时时间（秒）
const SHUTDOWN_TIMEOUT_SECS: u64 = 30;

/// Process signals that start a graceful shutdown.
///
/// SIGINT (Ctrl+C) everywhere, plus SIGTERM on Unix, which is what service
/// managers send on stop.
pub struct ShutdownSignal {
    #[cfg(unix)]
    terminate: Option<signal::unix::Signal>,
}

impl ShutdownSignal {
    /// Install the handlers now, so a signal arriving before [`recv`](Self::recv)
    /// is polled is still seen.
    #[cfg(unix)]
    pub fn register() -> Self {
        use signal::unix::SignalKind;

        let terminate = match signal::unix::signal(SignalKind::terminate()) {
            Ok(stream) => Some(stream),
            Err(e) => {
                warn!(
                    "Failed to create SIGTERM handler: {}. Only Ctrl+C will stop the server gracefully.",
                    e
                );
                None
            }
        };
        Self { terminate }
    }

    #[cfg(not(unix))]
    pub fn register() -> Self {
        Self {}
    }

    /// Resolve with the name of the first shutdown signal received.
    #[cfg(unix)]
    pub async fn recv(self) -> &'static str {
        match self.terminate {
            Some(mut terminate) => {
                tokio::select! {
                    name = wait_for_ctrl_c() => name,
                    _ = terminate.recv() => "SIGTERM",
                }
            }
            None => wait_for_ctrl_c().await,
        }
    }

    #[cfg(not(unix))]
    pub async fn recv(self) -> &'static str {
        wait_for_ctrl_c().await
    }
}

async fn wait_for_ctrl_c() -> &'static str {
    if let Err(e) = signal::ctrl_c().await {
        warn!(
            "Failed to listen for Ctrl+C: {}. Proceeding with shutdown anyway.",
            e
        );
    }
    "SIGINT"
}

/// Wait for a shutdown signal, then stop the HTTP server gracefully.
pub async fn listen_for_shutdown(handle: ServerHandle, shutdown: ShutdownSignal) {
    let name = shutdown.recv().await;
    info!("Received {}, stopping server...", name);

    // 等待进行中的请求完成
    handle.stop(true).await;
}

/// Stop background tasks and write the final snapshot.
///
/// Runs after the server has stopped so no fetch can race the last dump.
pub async fn finish_shutdown(
    tasks: MaintenanceTasks,
    store: Arc<LinkStore>,
    snapshot: Option<Arc<SnapshotFile>>,
) {
    let result = timeout(
        Duration::from_secs(SHUTDOWN_TIMEOUT_SECS),
        perform_shutdown_tasks(tasks, store, snapshot),
    )
    .await;

    match result {
        Ok(()) => info!("All shutdown tasks completed"),
        Err(_) => error!(
            "Shutdown tasks timed out after {} seconds",
            SHUTDOWN_TIMEOUT_SECS
        ),
    }
}

async fn perform_shutdown_tasks(
    tasks: MaintenanceTasks,
    store: Arc<LinkStore>,
    snapshot: Option<Arc<SnapshotFile>>,
) {
    tasks.shutdown().await;

    let Some(snapshot) = snapshot else {
        info!("Snapshot disabled, {} links discarded", store.len());
        return;
    };

    let count = store.len();
    let path = snapshot.path().display().to_string();
    match maintenance::write_snapshot(store, snapshot).await {
        Ok(()) => info!("Final snapshot written to {} ({} links)", path, count),
        Err(e) => error!("Final snapshot failed: {}", e),
    }
}
