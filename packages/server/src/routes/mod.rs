mod v1;

use axum::{Router, routing::get};
use utoipa_axum::router::OpenApiRouter;

use crate::config::AppConfig;
use crate::handlers::media;
use crate::state::AppState;

pub fn api_routes(config: &AppConfig) -> OpenApiRouter<AppState> {
    OpenApiRouter::new().nest("/v1", v1::routes(config))
}

/// Public download route for stored thumbnails.
pub fn media_routes() -> Router<AppState> {
    Router::new().route("/media/{*path}", get(media::serve_media))
}
