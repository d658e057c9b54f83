use std::path::Path;

use config::{Config, Environment, File};

use super::StaticConfig;
use crate::errors::{DecaylinkError, Result};

/// Config file read when no path is given; it may be absent.
pub const DEFAULT_CONFIG_PATH: &str = "config.toml";

/// Environment prefix; `DL__SERVER__PORT=9000` sets `server.port`.
pub const ENV_PREFIX: &str = "DL";

impl StaticConfig {
    /// 从 TOML 文件和环境变量加载配置
    ///
    /// 优先级：ENV > 配置文件 > 默认值
    ///
    /// An explicitly given `path` must exist; the default `config.toml` is
    /// optional.
    pub fn load(path: Option<&str>) -> Result<Self> {
        let (path, required) = match path {
            Some(path) => (path, true),
            None => (DEFAULT_CONFIG_PATH, false),
        };

        let settings = Config::builder()
            .add_source(File::with_name(path).required(required))
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("links.accepted_schemes")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| DecaylinkError::config(format!("Failed to build config: {}", e)))?;

        settings
            .try_deserialize::<StaticConfig>()
            .map_err(|e| DecaylinkError::config(format!("Failed to deserialize config: {}", e)))
    }

    /// 生成示例 TOML 配置文件
    pub fn generate_sample_config() -> String {
        toml::to_string_pretty(&Self::default())
            .unwrap_or_else(|e| format!("Error generating sample config: {}", e))
    }

    /// 保存配置到 TOML 文件
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| DecaylinkError::serialization(format!("Failed to encode config: {}", e)))?;

        if let Some(parent) = path.as_ref().parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            std::fs::create_dir_all(parent)?;
        }

        std::fs::write(path, content)?;
        Ok(())
    }
}
