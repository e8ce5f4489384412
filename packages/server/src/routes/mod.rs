mod v1;

use axum::Router;
use axum::routing::get;

use crate::config::AppConfig;
use crate::handlers;
use crate::state::AppState;

pub fn api_routes(config: &AppConfig) -> Router<AppState> {
    Router::new().nest("/v1", v1::routes(config))
}

/// Stored files, served under the configured media prefix.
pub fn media_routes(config: &AppConfig) -> Router<AppState> {
    let prefix = config.storage.route_prefix();
    Router::new().route(
        &format!("{prefix}/{{*path}}"),
        get(handlers::media::serve_media),
    )
}
