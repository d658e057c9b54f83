use std::sync::Arc;

use actix_web::http::StatusCode;
use actix_web::{HttpRequest, HttpResponse, web};
use chrono::{DateTime, Utc};
use tracing::{debug, error, info, warn};
use url::Url;

use crate::api::render::{Renderer, ResponseFormat};
use crate::config::LinksConfig;
use crate::errors::{DecaylinkError, Result};
use crate::storage::LinkStore;
use crate::utils::validate_url;

/// Per-request view of `[links]`, parsed once at startup.
#[derive(Debug, Clone)]
pub struct LinkSettings {
    pub endpoint: String,
    pub short_bytes: usize,
    pub decay_time: Option<chrono::Duration>,
    pub decay_uses: u32,
    pub accepted_schemes: Vec<String>,
    pub link_prefix: String,
    pub log_urls: bool,
    pub collision_retries: u32,
}

impl LinkSettings {
    pub fn from_config(config: &LinksConfig) -> Result<Self> {
        Ok(Self {
            endpoint: config.endpoint.clone(),
            short_bytes: config.short_bytes,
            decay_time: config.decay_duration()?,
            decay_uses: config.decay_uses,
            accepted_schemes: config
                .accepted_schemes
                .iter()
                .map(|s| s.trim().to_ascii_lowercase())
                .filter(|s| !s.is_empty())
                .collect(),
            link_prefix: config.link_prefix.clone(),
            log_urls: config.log_urls,
            collision_retries: config.collision_retries,
        })
    }

    /// Expiry for a link created at `now`; `None` when links never decay by time.
    pub fn expires_at(&self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        self.decay_time
            .and_then(|decay| now.checked_add_signed(decay))
    }
}

pub struct SubmitService {}

impl SubmitService {
    pub async fn handle_submit(
        req: HttpRequest,
        store: web::Data<Arc<LinkStore>>,
        settings: web::Data<LinkSettings>,
        renderer: web::Data<Renderer>,
    ) -> HttpResponse {
        let Some(raw) = Self::extract_target(&req, &settings.endpoint) else {
            warn!("Submit: undecodable target in {}", req.path());
            return Renderer::failure(StatusCode::BAD_REQUEST);
        };

        let url = match validate_url(&raw, &settings.accepted_schemes) {
            Ok(url) => url,
            Err(e) => {
                warn!("Submit: {}", e);
                return Renderer::failure(StatusCode::BAD_REQUEST);
            }
        };

        let token = match Self::submit_with_retries(&store, &settings, url.clone()) {
            Ok(token) => token,
            Err(e @ DecaylinkError::Collision(_)) => {
                error!("Submit: giving up after repeated collisions: {}", e);
                return Renderer::failure(StatusCode::SERVICE_UNAVAILABLE);
            }
            Err(e) => {
                error!("Submit: {}", e);
                return Renderer::failure(StatusCode::INTERNAL_SERVER_ERROR);
            }
        };

        if settings.log_urls {
            info!("Submit: {} <- {}", token, url);
        } else {
            info!("Submit: {}", token);
        }

        let short_url = format!("{}{}", settings.link_prefix, token);
        let format = ResponseFormat::from_request(&req);
        match renderer.render_submit(format, &short_url, url.as_str()) {
            Ok(body) => renderer.respond(format, body),
            Err(e) => {
                error!("Submit: response rendering failed: {}", e);
                Renderer::failure(StatusCode::INTERNAL_SERVER_ERROR)
            }
        }
    }

    pub async fn handle_wrong_method(req: HttpRequest) -> HttpResponse {
        info!("Submit: method {} not allowed on {}", req.method(), req.path());
        Renderer::method_not_allowed("GET, POST")
    }

    /// The submitted URL is everything after `/<endpoint>/`, percent-decoded,
    /// with the request's query string reattached.
    fn extract_target(req: &HttpRequest, endpoint: &str) -> Option<String> {
        let prefix = format!("/{}/", endpoint);
        let tail = req.uri().path().strip_prefix(&prefix)?;
        let mut target = urlencoding::decode(tail).ok()?.into_owned();

        if let Some(query) = req.uri().query() {
            target.push('?');
            target.push_str(query);
        }
        Some(target)
    }

    /// Each collision gets a fresh draw, up to `collision_retries` extra attempts.
    fn submit_with_retries(store: &LinkStore, settings: &LinkSettings, url: Url) -> Result<String> {
        let expires_at = settings.expires_at(Utc::now());
        let mut attempt = 0;

        loop {
            match store.submit(url.clone(), settings.short_bytes, expires_at, settings.decay_uses) {
                Err(e) if e.is_recoverable() && attempt < settings.collision_retries => {
                    attempt += 1;
                    debug!("Submit: collision, retrying ({}/{})", attempt, settings.collision_retries);
                }
                result => return result,
            }
        }
    }
}
