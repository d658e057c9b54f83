pub mod redirect;
pub mod submit;

pub use redirect::RedirectService;
pub use submit::{LinkSettings, SubmitService};

/// 短链路由配置
///
/// `/<endpoint>/<url...>` creates a link (POST, and GET for plain browser
/// use), `/<token>` resolves one (GET only). Other methods on those paths
/// get a `405`, and anything else is a `400`.
pub fn link_routes(endpoint: &str) -> actix_web::Scope {
    use actix_web::web;

    let submit_path = format!("/{}/{{url:.*}}", endpoint);

    web::scope("")
        .service(
            web::resource(submit_path)
                .route(web::post().to(SubmitService::handle_submit))
                .route(web::get().to(SubmitService::handle_submit))
                .default_service(web::to(SubmitService::handle_wrong_method)),
        )
        .service(
            web::resource("/{token}")
                .route(web::get().to(RedirectService::handle_fetch))
                .default_service(web::to(RedirectService::handle_wrong_method)),
        )
        .default_service(web::to(RedirectService::handle_unrecognized))
}
