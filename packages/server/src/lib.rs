pub mod config;
pub mod database;
pub mod entity;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod imaging;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod service;
pub mod state;
pub mod store;
pub mod utils;

use utoipa::OpenApi;
use utoipa_scalar::{Scalar, Servable as ScalarServable};
use utoipa_swagger_ui::SwaggerUi;

use crate::state::AppState;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Places API",
        version = "1.0.0",
        description = "Travel places with ratings, reviews, and ordered photo galleries"
    ),
    paths(
        handlers::place::list_places,
        handlers::place::get_place,
        handlers::place::create_place,
        handlers::place::update_place,
        handlers::place::delete_place,
        handlers::place::upload_images,
        handlers::place::update_image_order,
        handlers::place::delete_image,
        handlers::media::serve_media,
    ),
    components(schemas(
        models::place::CreatePlaceRequest,
        models::place::UpdatePlaceRequest,
        models::place::ReorderImagesRequest,
        models::place::IdList,
        models::place::IdValue,
        models::place::PlaceResponse,
        models::place::PlaceImageResponse,
        error::ErrorBody,
    )),
    tags(
        (name = "Places", description = "Place CRUD operations"),
        (name = "Place Images", description = "Uploading, ordering, and deleting place images"),
        (name = "Media", description = "Stored image files"),
    ),
)]
pub struct ApiDoc;

/// Build the application router.
pub fn build_router(state: AppState) -> axum::Router {
    let cors = middleware::cors_layer(&state.config.server.cors);

    axum::Router::new()
        .nest("/api", routes::api_routes(&state.config))
        .merge(routes::media_routes(&state.config))
        .with_state(state)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .merge(Scalar::with_url("/scalar", ApiDoc::openapi()))
        .layer(middleware::tracing_layer())
        .layer(cors)
}
