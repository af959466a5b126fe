use super::http_handlers;
use actix_web::web;

/// Registers every HTTP route. Services, `UploadLimits` and the JSON
/// config are expected as app data.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/user")
            .route("", web::get().to(http_handlers::list_users))
            .route("", web::post().to(http_handlers::create_user))
            .route("/{id}", web::put().to(http_handlers::update_user))
            .route("/{id}", web::delete().to(http_handlers::delete_user)),
    )
    // Internal routes - identity provider hook
    .route(
        "/api/internal/user/oauth",
        web::post().to(http_handlers::oauth_user),
    )
    // Fixed segments must be registered before "/{id}"
    .service(
        web::scope("/api/post")
            .route("", web::post().to(http_handlers::create_post))
            .route("/_list", web::post().to(http_handlers::search_posts))
            .route("/_report", web::post().to(http_handlers::generate_report))
            .route("/file/upload", web::post().to(http_handlers::upload_posts))
            .route("/{id}", web::get().to(http_handlers::get_post))
            .route("/{id}", web::put().to(http_handlers::update_post))
            .route("/{id}", web::delete().to(http_handlers::delete_post)),
    );
}
