//! Response rendering
//!
//! The first media type in `Accept` picks the representation: HTML from the
//! configured templates, a small JSON object, or plain text for anything else.

use actix_web::http::StatusCode;
use actix_web::http::header;
use actix_web::{HttpRequest, HttpResponse};
use serde_json::json;

use crate::config::RenderConfig;
use crate::errors::{DecaylinkError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseFormat {
    Html,
    Json,
    PlainText,
}

impl ResponseFormat {
    /// No real negotiation: only the first entry counts, parameters ignored.
    pub fn from_accept(accept: Option<&str>) -> Self {
        let first = accept
            .and_then(|value| value.split(',').next())
            .and_then(|media| media.split(';').next())
            .map(str::trim)
            .unwrap_or_default();

        if first.eq_ignore_ascii_case("text/html") {
            Self::Html
        } else if first.eq_ignore_ascii_case("application/json") {
            Self::Json
        } else {
            Self::PlainText
        }
    }

    pub fn from_request(req: &HttpRequest) -> Self {
        Self::from_accept(
            req.headers()
                .get(header::ACCEPT)
                .and_then(|h| h.to_str().ok()),
        )
    }

    pub fn content_type(self) -> &'static str {
        match self {
            Self::Html => "text/html; charset=utf-8",
            Self::Json => "application/json",
            Self::PlainText => "text/plain; charset=utf-8",
        }
    }
}

#[derive(Debug, Clone)]
pub struct Renderer {
    cache_control: String,
    fetch_template: String,
    submit_template: String,
    redirect: bool,
}

impl Renderer {
    pub fn from_config(config: &RenderConfig) -> Self {
        Self {
            cache_control: config.cache_control.clone(),
            fetch_template: config.fetch_template.clone(),
            submit_template: config.submit_template.clone(),
            redirect: config.redirect,
        }
    }

    pub fn render_fetch(&self, format: ResponseFormat, url: &str) -> Result<String> {
        match format {
            ResponseFormat::Html => fill_template(&self.fetch_template, &[("url", url)]),
            ResponseFormat::Json => to_json_line(&json!({ "url": url })),
            ResponseFormat::PlainText => Ok(url.to_string()),
        }
    }

    pub fn render_submit(&self, format: ResponseFormat, short_url: &str, url: &str) -> Result<String> {
        match format {
            ResponseFormat::Html => fill_template(
                &self.submit_template,
                &[("shorturl", short_url), ("url", url)],
            ),
            ResponseFormat::Json => to_json_line(&json!({ "shorturl": short_url, "url": url })),
            ResponseFormat::PlainText => Ok(format!("{} <- {}", short_url, url)),
        }
    }

    /// `200` carrying a rendered body plus the caching headers.
    pub fn respond(&self, format: ResponseFormat, body: String) -> HttpResponse {
        HttpResponse::Ok()
            .insert_header((header::CONTENT_TYPE, format.content_type()))
            .insert_header((header::VARY, "Accept"))
            .insert_header((header::CACHE_CONTROL, self.cache_control.as_str()))
            .body(body)
    }

    /// Like [`respond`](Self::respond), or a `307` towards `url` when
    /// redirects are enabled.
    pub fn respond_fetch(&self, format: ResponseFormat, body: String, url: &str) -> HttpResponse {
        if !self.redirect {
            return self.respond(format, body);
        }

        HttpResponse::build(StatusCode::TEMPORARY_REDIRECT)
            .insert_header((header::LOCATION, url))
            .insert_header((header::CONTENT_TYPE, format.content_type()))
            .insert_header((header::VARY, "Accept"))
            .insert_header((header::CACHE_CONTROL, self.cache_control.as_str()))
            .body(body)
    }

    /// Bodiless error reply that must not be cached.
    pub fn failure(status: StatusCode) -> HttpResponse {
        HttpResponse::build(status)
            .insert_header((header::CACHE_CONTROL, "no-store"))
            .finish()
    }

    /// `405` naming the methods the path does accept.
    pub fn method_not_allowed(allow: &'static str) -> HttpResponse {
        HttpResponse::MethodNotAllowed()
            .insert_header((header::ALLOW, allow))
            .insert_header((header::CACHE_CONTROL, "no-store"))
            .finish()
    }
}

fn to_json_line(value: &serde_json::Value) -> Result<String> {
    let mut body = serde_json::to_string(value)
        .map_err(|e| DecaylinkError::render(format!("Failed to encode JSON: {}", e)))?;
    body.push('\n');
    Ok(body)
}

/// Substitute `{{ key }}` placeholders (`{{ .key }}` also accepted) with
/// HTML-escaped values. Unknown keys are an error.
fn fill_template(template: &str, values: &[(&str, &str)]) -> Result<String> {
    let mut out = String::with_capacity(template.len() + 64);
    let mut rest = template;

    while let Some(open) = rest.find("{{") {
        out.push_str(&rest[..open]);
        let after_open = &rest[open + 2..];
        let close = after_open
            .find("}}")
            .ok_or_else(|| DecaylinkError::render("unclosed '{{' in template"))?;

        let key = after_open[..close].trim();
        let key = key.strip_prefix('.').unwrap_or(key);
        let value = values
            .iter()
            .find(|(name, _)| *name == key)
            .map(|(_, value)| *value)
            .ok_or_else(|| DecaylinkError::render(format!("unknown placeholder '{}'", key)))?;

        out.push_str(&html_escape::encode_quoted_attribute(value));
        rest = &after_open[close + 2..];
    }

    out.push_str(rest);
    Ok(out)
}
