//! 后台维护任务
//!
//! Two periodic loops share the store with the request workers:
//! - reaper: removes links whose expiry has passed
//! - snapshotter: writes the store to the snapshot file
//!
//! Both watch a shutdown channel and stop between ticks.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::errors::{DecaylinkError, Result};
use crate::storage::{LinkStore, SnapshotFile};

/// Run one sweep, logging every decayed token (and its URL when `log_urls`).
pub fn reap_once(store: &LinkStore, log_urls: bool) -> usize {
    let removed = if log_urls {
        store.reap(|token, record| info!("Reaper: decayed {} <- {}", token, record.url))
    } else {
        store.reap(|token, _| info!("Reaper: decayed {}", token))
    };

    if removed > 0 {
        debug!("Reaper removed {} links, {} left", removed, store.len());
    }
    removed
}

/// Write a snapshot off the async runtime.
pub async fn write_snapshot(store: Arc<LinkStore>, snapshot: Arc<SnapshotFile>) -> Result<()> {
    tokio::task::spawn_blocking(move || snapshot.write_from(&store))
        .await
        .map_err(|e| DecaylinkError::file_operation(format!("Snapshot task failed: {}", e)))?
}

/// Handles of the running loops plus the switch that stops them.
pub struct MaintenanceTasks {
    shutdown_tx: watch::Sender<bool>,
    reaper: JoinHandle<()>,
    snapshotter: Option<JoinHandle<()>>,
}

impl MaintenanceTasks {
    /// Start the reaper, and the snapshotter when a snapshot file is given.
    pub fn spawn(
        store: Arc<LinkStore>,
        snapshot: Option<Arc<SnapshotFile>>,
        reap_interval: Duration,
        snapshot_interval: Duration,
        log_urls: bool,
    ) -> Self {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let reaper = spawn_reaper(store.clone(), reap_interval, log_urls, shutdown_rx.clone());
        let snapshotter =
            snapshot.map(|file| spawn_snapshotter(store, file, snapshot_interval, shutdown_rx));

        Self {
            shutdown_tx,
            reaper,
            snapshotter,
        }
    }

    /// Signal both loops and wait for them to finish their current tick.
    pub async fn shutdown(self) {
        // 接收端全部退出时 send 会失败，此时任务已经结束
        let _ = self.shutdown_tx.send(true);

        if let Err(e) = self.reaper.await {
            warn!("Reaper task ended abnormally: {}", e);
        }
        if let Some(snapshotter) = self.snapshotter
            && let Err(e) = snapshotter.await
        {
            warn!("Snapshot task ended abnormally: {}", e);
        }
    }
}

pub fn spawn_reaper(
    store: Arc<LinkStore>,
    interval: Duration,
    log_urls: bool,
    mut shutdown: watch::Receiver<bool>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        debug!("Reaper started, interval {:?}", interval);
        loop {
            if *shutdown.borrow() {
                break;
            }
            tokio::select! {
                changed = shutdown.changed() => {
                    // 发送端已释放，视同关闭
                    if changed.is_err() {
                        break;
                    }
                }
                _ = tokio::time::sleep(interval) => {
                    reap_once(&store, log_urls);
                }
            }
        }
        debug!("Reaper stopped");
    })
}

pub fn spawn_snapshotter(
    store: Arc<LinkStore>,
    snapshot: Arc<SnapshotFile>,
    interval: Duration,
    mut shutdown: watch::Receiver<bool>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        debug!(
            "Snapshotter started for {}, interval {:?}",
            snapshot.path().display(),
            interval
        );
        loop {
            if *shutdown.borrow() {
                break;
            }
            tokio::select! {
                changed = shutdown.changed() => {
                    // 发送端已释放，视同关闭
                    if changed.is_err() {
                        break;
                    }
                }
                _ = tokio::time::sleep(interval) => {
                    if let Err(e) = write_snapshot(store.clone(), snapshot.clone()).await {
                        error!("Snapshot: {}", e);
                    }
                }
            }
        }
        debug!("Snapshotter stopped");
    })
}
