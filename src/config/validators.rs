//! 配置值验证模块
//!
//! Checks the loaded configuration once at startup so bad values fail fast
//! instead of surfacing on the first request or timer tick.

use actix_web::http::header::HeaderValue;

use super::StaticConfig;
use crate::api::render::{Renderer, ResponseFormat};
use crate::errors::{DecaylinkError, Result};
use crate::storage::token::encoded_len;
use crate::utils::MAX_TOKEN_LEN;

/// Validate every section, reporting all problems at once.
pub fn validate_static_config(config: &StaticConfig) -> Result<()> {
    let mut problems: Vec<String> = Vec::new();

    let links = &config.links;
    if links.endpoint.is_empty()
        || !links
            .endpoint
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_')
    {
        problems.push(format!(
            "links.endpoint must be a non-empty path segment of [A-Za-z0-9_-], got '{}'",
            links.endpoint
        ));
    }
    if links.short_bytes == 0 {
        problems.push("links.short_bytes must be at least 1".to_string());
    } else if encoded_len(links.short_bytes) > MAX_TOKEN_LEN {
        // 生成的 token 必须仍能被解析
        problems.push(format!(
            "links.short_bytes must be at most {}, got {}",
            MAX_TOKEN_BYTES, links.short_bytes
        ));
    }
    if links.accepted_schemes.iter().all(|s| s.trim().is_empty()) {
        problems.push("links.accepted_schemes must name at least one scheme".to_string());
    }
    if let Err(e) = links.decay_duration() {
        problems.push(e.message().to_string());
    }
    if let Err(e) = config.reaper.interval_duration() {
        problems.push(e.message().to_string());
    }
    if let Err(e) = config.snapshot.interval_duration() {
        problems.push(e.message().to_string());
    }
    if config
        .snapshot
        .path
        .as_deref()
        .is_some_and(|p| p.trim().is_empty())
    {
        problems.push("snapshot.path is set but empty".to_string());
    }

    // 模板在启动时试渲染一次
    let renderer = Renderer::from_config(&config.render);
    if let Err(e) = renderer.render_fetch(ResponseFormat::Html, SAMPLE_URL) {
        problems.push(format!("render.fetch_template: {}", e.message()));
    }
    if let Err(e) = renderer.render_submit(ResponseFormat::Html, SAMPLE_SHORT_URL, SAMPLE_URL) {
        problems.push(format!("render.submit_template: {}", e.message()));
    }
    if HeaderValue::from_str(&config.render.cache_control).is_err() {
        problems.push("render.cache_control is not a valid header value".to_string());
    }

    if config.logging.max_backups == 0 {
        problems.push("logging.max_backups must be at least 1".to_string());
    }
    match config.logging.format.as_str() {
        "text" | "json" => {}
        other => problems.push(format!(
            "logging.format must be 'text' or 'json', got '{}'",
            other
        )),
    }

    if problems.is_empty() {
        Ok(())
    } else {
        Err(DecaylinkError::config(problems.join("; ")))
    }
}

/// Largest `short_bytes` whose encoded token still fits [`MAX_TOKEN_LEN`].
const MAX_TOKEN_BYTES: usize = MAX_TOKEN_LEN / 4 * 3;

const SAMPLE_URL: &str = "https://example.com/";
const SAMPLE_SHORT_URL: &str = "https://s.example/abcd";
