use axum::routing::get;
use utoipa_axum::router::OpenApiRouter;
use utoipa_axum::routes;

use crate::config::AppConfig;
use crate::handlers;
use crate::state::AppState;

pub fn routes(config: &AppConfig) -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .nest("/auth", auth_routes())
        .nest("/events", event_routes())
        .nest("/albums", album_routes(config))
        .nest("/admin", admin_routes())
        .nest("/posts", post_routes())
        .merge(file_routes())
}

fn auth_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(handlers::auth::login))
        .routes(routes!(handlers::auth::me))
}

fn event_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(
            handlers::event::list_events,
            handlers::event::create_event
        ))
        .routes(routes!(
            handlers::event::update_event,
            handlers::event::delete_event
        ))
}

fn album_routes(config: &AppConfig) -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(
            handlers::album::list_albums,
            handlers::album::upload_album,
            handlers::album::delete_album
        ))
        .layer(handlers::album::album_body_limit(
            config.server.album_upload_limit,
        ))
}

fn admin_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(handlers::admin::set_claim))
        .routes(routes!(handlers::admin::list_users))
        .routes(routes!(handlers::admin::list_admins))
        .routes(routes!(handlers::admin::bulk_create_users))
        .routes(routes!(handlers::admin::purge_users))
        .routes(routes!(handlers::admin::update_display_name))
        .routes(routes!(handlers::admin::set_profile_picture))
}

fn post_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new().routes(routes!(
        handlers::post::list_posts,
        handlers::post::create_post
    ))
}

/// Object reads for the filesystem backend. Wildcard paths are kept out of
/// the OpenAPI document.
fn file_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .route("/files/{*key}", get(handlers::files::serve_signed))
        .route("/public/{*key}", get(handlers::files::serve_public))
}
