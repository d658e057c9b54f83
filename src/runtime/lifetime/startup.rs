use anyhow::{Context, Result};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::api::{LinkSettings, Renderer};
use crate::config::StaticConfig;
use crate::storage::token::encoded_len;
use crate::storage::{LinkStore, SnapshotFile, SnapshotLoad};

pub struct StartupContext {
    pub store: Arc<LinkStore>,
    pub snapshot: Option<Arc<SnapshotFile>>,
    pub link_settings: LinkSettings,
    pub renderer: Renderer,
    pub reap_interval: Duration,
    pub snapshot_interval: Duration,
}

/// 准备服务器启动的上下文
/// 包括链接存储、快照恢复和请求处理所需的设置
pub fn prepare_server_startup(config: &StaticConfig) -> Result<StartupContext> {
    let start_time = std::time::Instant::now();
    debug!("Starting pre-startup processing...");

    let link_settings =
        LinkSettings::from_config(&config.links).context("Invalid [links] configuration")?;
    let renderer = Renderer::from_config(&config.render);
    let reap_interval = config
        .reaper
        .interval_duration()
        .context("Invalid [reaper] configuration")?;
    let snapshot_interval = config
        .snapshot
        .interval_duration()
        .context("Invalid [snapshot] configuration")?;

    let store = Arc::new(LinkStore::new());

    // 快照存在但无法解析时拒绝启动，避免覆盖用户数据
    let snapshot = match config.snapshot.path.as_deref() {
        Some(path) => {
            let file = SnapshotFile::new(path);
            match file
                .load_into(&store)
                .with_context(|| format!("Failed to restore snapshot {}", path))?
            {
                SnapshotLoad::Loaded(count) => {
                    info!("Restored {} links from {}", count, path);
                }
                SnapshotLoad::Absent => {
                    info!("No snapshot at {}, starting empty", path);
                }
            }
            Some(Arc::new(file))
        }
        None => {
            warn!("Snapshot path not configured, links will not survive a restart");
            None
        }
    };

    log_link_settings(&link_settings);

    debug!(
        "Pre-startup processing completed in {} ms",
        start_time.elapsed().as_millis()
    );

    Ok(StartupContext {
        store,
        snapshot,
        link_settings,
        renderer,
        reap_interval,
        snapshot_interval,
    })
}

fn log_link_settings(settings: &LinkSettings) {
    match settings.decay_time {
        Some(decay) => info!("Links decay after {} seconds", decay.num_seconds()),
        None => info!("Links do not decay by time"),
    }
    if settings.decay_uses > 0 {
        info!("Links decay after {} uses", settings.decay_uses);
    }
    info!(
        "Submit endpoint: /{}/, {} bytes per token ({} chars), schemes: {}",
        settings.endpoint,
        settings.short_bytes,
        encoded_len(settings.short_bytes),
        settings.accepted_schemes.join(", ")
    );
}
