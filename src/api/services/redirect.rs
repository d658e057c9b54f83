use std::sync::Arc;

use actix_web::http::StatusCode;
use actix_web::{HttpRequest, HttpResponse, Responder, web};
use tracing::{error, info, trace};

use crate::api::render::{Renderer, ResponseFormat};
use crate::storage::LinkStore;
use crate::utils::is_valid_token;

pub struct RedirectService {}

impl RedirectService {
    pub async fn handle_fetch(
        req: HttpRequest,
        path: web::Path<String>,
        store: web::Data<Arc<LinkStore>>,
        renderer: web::Data<Renderer>,
    ) -> impl Responder {
        let token = path.into_inner();

        if !is_valid_token(&token) {
            // 非法 token，直接 404（不进锁）
            trace!("Fetch: malformed token rejected: {}", token);
            return Renderer::failure(StatusCode::NOT_FOUND);
        }

        let Some(outcome) = store.fetch(&token) else {
            info!("Fetch: not found: {}", token);
            return Renderer::failure(StatusCode::NOT_FOUND);
        };

        if outcome.was_last_use {
            info!("Fetch: decayed due to usage: {}", token);
        }

        let format = ResponseFormat::from_request(&req);
        let url = outcome.record.url.as_str();
        match renderer.render_fetch(format, url) {
            Ok(body) => {
                info!("Fetch: {} ({})", token, format.content_type());
                renderer.respond_fetch(format, body, url)
            }
            Err(e) => {
                error!("Fetch: response rendering failed for {}: {}", token, e);
                Renderer::failure(StatusCode::INTERNAL_SERVER_ERROR)
            }
        }
    }

    /// Known token path, but not a GET.
    pub async fn handle_wrong_method(req: HttpRequest) -> HttpResponse {
        info!("Fetch: method {} not allowed on {}", req.method(), req.path());
        Renderer::method_not_allowed("GET")
    }

    /// Anything the route table does not know.
    pub async fn handle_unrecognized(req: HttpRequest) -> HttpResponse {
        info!("Unrecognized request: {} {}", req.method(), req.path());
        Renderer::failure(StatusCode::BAD_REQUEST)
    }
}
