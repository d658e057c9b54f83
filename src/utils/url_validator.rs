//! URL 验证模块
//!
//! Submitted URLs must be absolute, carry a host, and use one of the
//! configured schemes.

use url::Url;

/// URL 验证错误
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UrlValidationError {
    EmptyUrl,
    InvalidFormat(String),
    SchemeNotAccepted(String),
    MissingHost,
}

impl std::fmt::Display for UrlValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyUrl => write!(f, "URL cannot be empty"),
            Self::InvalidFormat(msg) => write!(f, "Invalid URL format: {}", msg),
            Self::SchemeNotAccepted(scheme) => write!(f, "Unaccepted scheme: {}", scheme),
            Self::MissingHost => write!(f, "No host in URL"),
        }
    }
}

impl std::error::Error for UrlValidationError {}

/// Parse `raw` and check it against `accepted_schemes` (case-insensitive).
pub fn validate_url(raw: &str, accepted_schemes: &[String]) -> Result<Url, UrlValidationError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(UrlValidationError::EmptyUrl);
    }

    let url = Url::parse(raw).map_err(|e| UrlValidationError::InvalidFormat(e.to_string()))?;

    // Url::parse 已将 scheme 转为小写
    if !accepted_schemes
        .iter()
        .any(|s| s.eq_ignore_ascii_case(url.scheme()))
    {
        return Err(UrlValidationError::SchemeNotAccepted(url.scheme().to_string()));
    }

    if url.host_str().is_none_or(str::is_empty) {
        return Err(UrlValidationError::MissingHost);
    }

    Ok(url)
}
