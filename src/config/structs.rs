use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::errors::{DecaylinkError, Result};
use crate::utils::parse_duration;

pub const DEFAULT_FETCH_TEMPLATE: &str = r#"<html>
  <body>
    <a rel="noreferrer" href="{{ url }}">{{ url }}</a>
  </body>
</html>
"#;

pub const DEFAULT_SUBMIT_TEMPLATE: &str = r#"<html>
  <body>
    <a rel="noreferrer" href="{{ shorturl }}">{{ shorturl }}</a> &lt;- {{ url }}
  </body>
</html>
"#;

/// 静态配置（从 TOML 与环境变量加载，启动时使用）
///
/// - server: 监听地址、端口、worker 数量
/// - links: 短链生成与衰减规则
/// - snapshot: 快照文件与间隔
/// - reaper: 过期清理间隔
/// - render: 响应渲染
/// - logging: 日志配置
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct StaticConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub links: LinksConfig,
    #[serde(default)]
    pub snapshot: SnapshotConfig,
    #[serde(default)]
    pub reaper: ReaperConfig,
    #[serde(default)]
    pub render: RenderConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// 服务器配置
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ServerConfig {
    #[serde(default = "default_server_host")]
    pub host: String,
    #[serde(default = "default_server_port")]
    pub port: u16,
    #[serde(default = "default_cpu_count")]
    pub cpu_count: usize,
}

/// Link creation and decay settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LinksConfig {
    /// First path segment of submissions: `/<endpoint>/<url>`.
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    /// Random bytes per token.
    #[serde(default = "default_short_bytes")]
    pub short_bytes: usize,
    /// Lifetime of a new link, e.g. `7d` or `168h`. `0` never decays by time.
    #[serde(default = "default_decay_time")]
    pub decay_time: String,
    /// Fetches before a link decays. `0` never decays by use.
    #[serde(default)]
    pub decay_uses: u32,
    #[serde(default = "default_accepted_schemes")]
    pub accepted_schemes: Vec<String>,
    /// Prepended to the token in submission responses.
    #[serde(default)]
    pub link_prefix: String,
    /// Log full URLs next to tokens.
    #[serde(default)]
    pub log_urls: bool,
    /// Fresh draws after a token collision before the submission fails.
    #[serde(default = "default_collision_retries")]
    pub collision_retries: u32,
}

/// 快照配置
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SnapshotConfig {
    /// Snapshots are disabled when unset.
    #[serde(default)]
    pub path: Option<String>,
    #[serde(default = "default_task_interval")]
    pub interval: String,
}

/// 过期清理配置
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ReaperConfig {
    #[serde(default = "default_task_interval")]
    pub interval: String,
}

/// 响应渲染配置
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RenderConfig {
    #[serde(default = "default_cache_control")]
    pub cache_control: String,
    #[serde(default = "default_fetch_template")]
    pub fetch_template: String,
    #[serde(default = "default_submit_template")]
    pub submit_template: String,
    /// Answer resolves with `307` and a `Location` header instead of `200`.
    #[serde(default)]
    pub redirect: bool,
}

/// 日志配置
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_format")]
    pub format: String,
    #[serde(default)]
    pub file: Option<String>,
    #[serde(default = "default_max_backups")]
    pub max_backups: u32,
    #[serde(default = "default_enable_rotation")]
    pub enable_rotation: bool,
    /// Prefix each line with a timestamp; turn off when the process
    /// supervisor already stamps its output.
    #[serde(default = "default_log_timestamps")]
    pub timestamps: bool,
}

impl LinksConfig {
    /// `None` when links never decay by time.
    pub fn decay_duration(&self) -> Result<Option<chrono::Duration>> {
        let duration = parse_duration(&self.decay_time)
            .map_err(|e| DecaylinkError::config(format!("links.decay_time: {}", e)))?;
        if duration.is_zero() {
            return Ok(None);
        }
        chrono::Duration::from_std(duration)
            .map(Some)
            .map_err(|e| DecaylinkError::config(format!("links.decay_time: {}", e)))
    }
}

impl SnapshotConfig {
    pub fn interval_duration(&self) -> Result<Duration> {
        parse_interval("snapshot.interval", &self.interval)
    }
}

impl ReaperConfig {
    pub fn interval_duration(&self) -> Result<Duration> {
        parse_interval("reaper.interval", &self.interval)
    }
}

fn parse_interval(key: &str, value: &str) -> Result<Duration> {
    let duration =
        parse_duration(value).map_err(|e| DecaylinkError::config(format!("{}: {}", key, e)))?;
    if duration.is_zero() {
        return Err(DecaylinkError::config(format!(
            "{}: interval must be greater than zero",
            key
        )));
    }
    Ok(duration)
}

// ============================================================
// Default value functions
// ============================================================

fn default_server_host() -> String {
    "localhost".to_string()
}

fn default_server_port() -> u16 {
    19589
}

fn default_cpu_count() -> usize {
    num_cpus::get()
}

fn default_endpoint() -> String {
    "submit".to_string()
}

fn default_short_bytes() -> usize {
    3
}

fn default_decay_time() -> String {
    "7d".to_string()
}

fn default_accepted_schemes() -> Vec<String> {
    vec!["https".to_string()]
}

fn default_collision_retries() -> u32 {
    3
}

fn default_task_interval() -> String {
    "1m".to_string()
}

fn default_cache_control() -> String {
    "public, max-age=60".to_string()
}

fn default_fetch_template() -> String {
    DEFAULT_FETCH_TEMPLATE.to_string()
}

fn default_submit_template() -> String {
    DEFAULT_SUBMIT_TEMPLATE.to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "text".to_string()
}

fn default_max_backups() -> u32 {
    5
}

fn default_enable_rotation() -> bool {
    true
}

fn default_log_timestamps() -> bool {
    true
}

// ============================================================
// Default implementations
// ============================================================

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_server_host(),
            port: default_server_port(),
            cpu_count: default_cpu_count(),
        }
    }
}

impl Default for LinksConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            short_bytes: default_short_bytes(),
            decay_time: default_decay_time(),
            decay_uses: 0,
            accepted_schemes: default_accepted_schemes(),
            link_prefix: String::new(),
            log_urls: false,
            collision_retries: default_collision_retries(),
        }
    }
}

impl Default for SnapshotConfig {
    fn default() -> Self {
        Self {
            path: None,
            interval: default_task_interval(),
        }
    }
}

impl Default for ReaperConfig {
    fn default() -> Self {
        Self {
            interval: default_task_interval(),
        }
    }
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            cache_control: default_cache_control(),
            fetch_template: default_fetch_template(),
            submit_template: default_submit_template(),
            redirect: false,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
            file: None,
            max_backups: default_max_backups(),
            enable_rotation: default_enable_rotation(),
            timestamps: default_log_timestamps(),
        }
    }
}
