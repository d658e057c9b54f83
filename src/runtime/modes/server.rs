//! Server mode
//!
//! Starts the HTTP server, the background maintenance tasks, and the
//! shutdown sequence that ends with a final snapshot.

use actix_web::{App, HttpServer, web};
use anyhow::{Context, Result};
use tracing::warn;

use crate::api::link_routes;
use crate::config::StaticConfig;
use crate::runtime::lifetime;
use crate::services::maintenance::MaintenanceTasks;

/// Run the HTTP server
///
/// This function:
/// 1. Restores the store from the snapshot file, if any
/// 2. Starts the reaper and snapshotter
/// 3. Serves requests until Ctrl+C
/// 4. Stops the tasks and writes the final snapshot
///
/// **Note**: Logging system must be initialized before calling this function
pub async fn run_server(config: &StaticConfig) -> Result<()> {
    let startup = lifetime::startup::prepare_server_startup(config).map_err(|e| {
        tracing::error!("Server startup failed: {:#}", e);
        e
    })?;

    let store = startup.store.clone();
    let link_settings = web::Data::new(startup.link_settings);
    let renderer = web::Data::new(startup.renderer);
    let endpoint = link_settings.endpoint.clone();

    let tasks = MaintenanceTasks::spawn(
        store.clone(),
        startup.snapshot.clone(),
        startup.reap_interval,
        startup.snapshot_interval,
        link_settings.log_urls,
    );

    let cpu_count = config.server.cpu_count.clamp(1, 32);
    warn!("Using {} CPU cores for the server", cpu_count);

    let app_store = store.clone();
    let bind_address = format!("{}:{}", config.server.host, config.server.port);

    let server = HttpServer::new(move || {
        App::new()
            .app_data(web::Data::new(app_store.clone()))
            .app_data(link_settings.clone())
            .app_data(renderer.clone())
            .service(link_routes(&endpoint))
    })
    .keep_alive(std::time::Duration::from_secs(30))
    .client_request_timeout(std::time::Duration::from_millis(5000))
    .client_disconnect_timeout(std::time::Duration::from_millis(1000))
    .workers(cpu_count)
    .disable_signals();

    let server = match server.bind(&bind_address) {
        Ok(server) => server.run(),
        Err(e) => {
            tasks.shutdown().await;
            return Err(e).with_context(|| format!("Failed to bind {}", bind_address));
        }
    };
    warn!("Starting server at http://{}", bind_address);

    let shutdown_signal = lifetime::shutdown::ShutdownSignal::register();
    let signal_task = tokio::spawn(lifetime::shutdown::listen_for_shutdown(
        server.handle(),
        shutdown_signal,
    ));
    let served = server.await;
    signal_task.abort();

    lifetime::shutdown::finish_shutdown(tasks, store, startup.snapshot).await;

    served.context("HTTP server failed")
}
