//! Logging system initialization
//!
//! Sets up the tracing subscriber from `[logging]`: console or file output,
//! optional daily rotation, text or JSON formatting, and optional timestamps.

use std::path::Path;

use anyhow::Context;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling;

use crate::config::LoggingConfig;

/// Initialize logging system based on configuration
///
/// Call once, after the configuration has been loaded and validated.
///
/// # Returns
/// * `WorkerGuard` - Must be kept alive for the duration of the program
///   so that buffered log lines are flushed on exit
pub fn init_logging(config: &LoggingConfig) -> anyhow::Result<WorkerGuard> {
    let log_file = config.file.as_deref().filter(|f| !f.is_empty());

    let writer: Box<dyn std::io::Write + Send + Sync> = match log_file {
        Some(log_file) if config.enable_rotation => {
            // 按天滚动
            let path = Path::new(log_file);
            let dir = path.parent().unwrap_or(Path::new("."));
            let filename = path
                .file_name()
                .and_then(|name| name.to_str())
                .unwrap_or("decaylink.log");
            let appender = rolling::Builder::new()
                .rotation(rolling::Rotation::DAILY)
                .filename_prefix(filename.trim_end_matches(".log"))
                .filename_suffix("log")
                .max_log_files(config.max_backups as usize)
                .build(dir)
                .with_context(|| {
                    format!("Failed to create rolling log appender in {}", dir.display())
                })?;
            Box::new(appender)
        }
        Some(log_file) => {
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(log_file)
                .with_context(|| format!("Failed to open log file {}", log_file))?;
            Box::new(file)
        }
        None => Box::new(std::io::stdout()),
    };

    let (non_blocking_writer, guard) = tracing_appender::non_blocking(writer);
    let filter = tracing_subscriber::EnvFilter::try_new(&config.level)
        .with_context(|| format!("Invalid log level filter '{}'", config.level))?;

    let subscriber_builder = tracing_subscriber::fmt()
        .with_writer(non_blocking_writer)
        .with_env_filter(filter)
        .with_level(true)
        .with_ansi(log_file.is_none());

    let result = match (config.format == "json", config.timestamps) {
        (true, true) => subscriber_builder.json().try_init(),
        (true, false) => subscriber_builder.json().without_time().try_init(),
        (false, true) => subscriber_builder.try_init(),
        (false, false) => subscriber_builder.without_time().try_init(),
    };
    result.map_err(|e| anyhow::anyhow!("Failed to install log subscriber: {}", e))?;

    Ok(guard)
}
