use axum::{
    Router,
    routing::{MethodRouter, delete, get, post},
};

use crate::config::AppConfig;
use crate::handlers;
use crate::state::AppState;

pub fn routes(config: &AppConfig) -> Router<AppState> {
    Router::new().merge(place_routes()).merge(image_routes(config))
}

/// Register `path` with and without a trailing slash.
fn both(router: Router<AppState>, path: &str, method: MethodRouter<AppState>) -> Router<AppState> {
    router
        .route(path, method.clone())
        .route(&format!("{path}/"), method)
}

fn place_routes() -> Router<AppState> {
    let router = both(
        Router::new(),
        "/places",
        get(handlers::place::list_places).post(handlers::place::create_place),
    );
    both(
        router,
        "/places/{slug_or_id}",
        get(handlers::place::get_place)
            .put(handlers::place::update_place)
            .patch(handlers::place::update_place)
            .delete(handlers::place::delete_place),
    )
}

fn image_routes(config: &AppConfig) -> Router<AppState> {
    let crud = both(
        Router::new(),
        "/places/{slug_or_id}/update_image_order",
        post(handlers::place::update_image_order),
    );
    let crud = both(
        crud,
        "/places/{slug_or_id}/images/{image_id}",
        delete(handlers::place::delete_image),
    );

    let upload = both(
        Router::new(),
        "/places/{slug_or_id}/upload_images",
        post(handlers::place::upload_images),
    )
    .layer(handlers::place::upload_body_limit(&config.upload));

    crud.merge(upload)
}
