use axum::Json;
use axum::extract::{DefaultBodyLimit, Multipart, Path, State};
use axum::extract::multipart::Field;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use tracing::instrument;

use crate::config::UploadConfig;
use crate::error::{AppError, ErrorBody};
use crate::extractors::json::AppJson;
use crate::models::place::*;
use crate::service::PlaceService;
use crate::state::AppState;
use crate::store::RawImage;

/// Multipart field carrying the image files.
const IMAGES_FIELD: &str = "images";

/// Room for a full batch of maximum-size files plus form overhead.
pub fn upload_body_limit(upload: &UploadConfig) -> DefaultBodyLimit {
    let limit = upload
        .max_file_size
        .saturating_mul(10)
        .saturating_add(1024 * 1024);
    DefaultBodyLimit::max(usize::try_from(limit).unwrap_or(usize::MAX))
}

#[utoipa::path(
    get,
    path = "/api/v1/places/",
    tag = "Places",
    operation_id = "listPlaces",
    summary = "List places",
    description = "Returns all places, newest first, each with its images in display order.",
    responses(
        (status = 200, description = "All places", body = Vec<PlaceResponse>),
        (status = 500, description = "Internal error (INTERNAL_ERROR)", body = ErrorBody),
    ),
)]
#[instrument(skip(state))]
pub async fn list_places(
    State(state): State<AppState>,
) -> Result<Json<Vec<PlaceResponse>>, AppError> {
    let places = PlaceService::from_state(&state).list_places().await?;
    Ok(Json(places))
}

#[utoipa::path(
    get,
    path = "/api/v1/places/{slug_or_id}/",
    tag = "Places",
    operation_id = "getPlace",
    summary = "Get a place",
    description = "Looks the place up by slug first; an all-digit token that matches no slug \
        is then tried as a numeric id.",
    params(("slug_or_id" = String, Path, description = "Place slug or numeric id")),
    responses(
        (status = 200, description = "Place", body = PlaceResponse),
        (status = 404, description = "Place not found (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state))]
pub async fn get_place(
    State(state): State<AppState>,
    Path(slug_or_id): Path<String>,
) -> Result<Json<PlaceResponse>, AppError> {
    let place = PlaceService::from_state(&state)
        .get_place(&slug_or_id)
        .await?;
    Ok(Json(place))
}

#[utoipa::path(
    post,
    path = "/api/v1/places/",
    tag = "Places",
    operation_id = "createPlace",
    summary = "Create a place",
    description = "Creates a place with a slug derived from its name. Names in non-Latin \
        scripts are transliterated; collisions get a numeric or random suffix.",
    request_body = CreatePlaceRequest,
    responses(
        (status = 201, description = "Place created", body = PlaceResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 409, description = "Slug could not be assigned (CONFLICT)", body = ErrorBody),
        (status = 500, description = "Internal error (INTERNAL_ERROR)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, payload), fields(name = payload.name.as_deref().unwrap_or_default()))]
pub async fn create_place(
    State(state): State<AppState>,
    AppJson(payload): AppJson<CreatePlaceRequest>,
) -> Result<impl IntoResponse, AppError> {
    validate_create_place(&payload)?;

    let place = PlaceService::from_state(&state)
        .create_place(payload)
        .await?;

    Ok((StatusCode::CREATED, Json(place)))
}

#[utoipa::path(
    method(put, patch),
    path = "/api/v1/places/{slug_or_id}/",
    tag = "Places",
    operation_id = "updatePlace",
    summary = "Update a place",
    description = "Partially updates a place. Absent fields keep their value, except `dates`, \
        which is cleared when absent. Images listed in `deleted_image_ids` (JSON array, JSON \
        string, or comma-separated string) are deleted first; ids of other places' images \
        are ignored. The slug never changes.",
    params(("slug_or_id" = String, Path, description = "Place slug or numeric id")),
    request_body = UpdatePlaceRequest,
    responses(
        (status = 200, description = "Place updated", body = PlaceResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 404, description = "Place not found (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, payload))]
pub async fn update_place(
    State(state): State<AppState>,
    Path(slug_or_id): Path<String>,
    AppJson(payload): AppJson<UpdatePlaceRequest>,
) -> Result<Json<PlaceResponse>, AppError> {
    validate_update_place(&payload)?;

    let place = PlaceService::from_state(&state)
        .update_place(&slug_or_id, payload)
        .await?;

    Ok(Json(place))
}

#[utoipa::path(
    delete,
    path = "/api/v1/places/{slug_or_id}/",
    tag = "Places",
    operation_id = "deletePlace",
    summary = "Delete a place",
    description = "Deletes the place together with all of its images and their files.",
    params(("slug_or_id" = String, Path, description = "Place slug or numeric id")),
    responses(
        (status = 204, description = "Place deleted"),
        (status = 404, description = "Place not found (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state))]
pub async fn delete_place(
    State(state): State<AppState>,
    Path(slug_or_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    PlaceService::from_state(&state)
        .delete_place(&slug_or_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    post,
    path = "/api/v1/places/{slug_or_id}/upload_images/",
    tag = "Place Images",
    operation_id = "uploadPlaceImages",
    summary = "Upload images to a place",
    description = "Accepts one or more files in the `images` multipart field. Every file is \
        checked (extension, size, decodability) before any is stored; one bad file rejects \
        the batch. Images are turned upright, downscaled to fit 1200x800, and given \
        `order` equal to their position in the batch.",
    params(("slug_or_id" = String, Path, description = "Place slug or numeric id")),
    request_body(content_type = "multipart/form-data", description = "One or more `images` files"),
    responses(
        (status = 201, description = "Images stored", body = Vec<PlaceImageResponse>),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 404, description = "Place not found (NOT_FOUND)", body = ErrorBody),
        (status = 500, description = "Internal error (INTERNAL_ERROR)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, multipart))]
pub async fn upload_images(
    State(state): State<AppState>,
    Path(slug_or_id): Path<String>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, AppError> {
    let max_size = state.config.upload.max_file_size;
    let mut uploads = Vec::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Multipart error: {e}")))?
    {
        match field.name() {
            Some(IMAGES_FIELD) | Some("images[]") => {
                let filename = field
                    .file_name()
                    .map(|s| s.to_string())
                    .ok_or_else(|| AppError::Validation("Each image must have a filename".into()))?;
                let bytes = read_field(field, &filename, max_size).await?;
                uploads.push(RawImage { filename, bytes });
            }
            _ => {} // Ignore unknown fields.
        }
    }

    if uploads.is_empty() {
        return Err(AppError::Validation("No images provided".into()));
    }

    let images = PlaceService::from_state(&state)
        .upload_images(&slug_or_id, uploads)
        .await?;

    Ok((StatusCode::CREATED, Json(images)))
}

/// Read a file field into memory, stopping as soon as it exceeds `max_size`.
async fn read_field(mut field: Field<'_>, filename: &str, max_size: u64) -> Result<Vec<u8>, AppError> {
    let mut bytes = Vec::new();
    while let Some(chunk) = field
        .chunk()
        .await
        .map_err(|e| AppError::Validation(format!("Upload read error: {e}")))?
    {
        if (bytes.len() + chunk.len()) as u64 > max_size {
            return Err(AppError::Validation(format!(
                "File {filename} is too large. Maximum size is {} MB",
                max_size / (1024 * 1024)
            )));
        }
        bytes.extend_from_slice(&chunk);
    }
    Ok(bytes)
}

#[utoipa::path(
    post,
    path = "/api/v1/places/{slug_or_id}/update_image_order/",
    tag = "Place Images",
    operation_id = "updatePlaceImageOrder",
    summary = "Reorder a place's images",
    description = "Sets each listed image's `order` to its position in `image_ids`; images not \
        listed follow in their previous order. All ids must belong to the place, otherwise \
        nothing changes. Returns all of the place's images in their new order.",
    params(("slug_or_id" = String, Path, description = "Place slug or numeric id")),
    request_body = ReorderImagesRequest,
    responses(
        (status = 200, description = "Images reordered", body = Vec<PlaceImageResponse>),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 404, description = "Place not found (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, payload))]
pub async fn update_image_order(
    State(state): State<AppState>,
    Path(slug_or_id): Path<String>,
    AppJson(payload): AppJson<ReorderImagesRequest>,
) -> Result<Json<Vec<PlaceImageResponse>>, AppError> {
    let images = PlaceService::from_state(&state)
        .reorder_images(&slug_or_id, &payload)
        .await?;
    Ok(Json(images))
}

#[utoipa::path(
    delete,
    path = "/api/v1/places/{slug_or_id}/images/{image_id}/",
    tag = "Place Images",
    operation_id = "deletePlaceImage",
    summary = "Delete one image of a place",
    params(
        ("slug_or_id" = String, Path, description = "Place slug or numeric id"),
        ("image_id" = i32, Path, description = "Image id"),
    ),
    responses(
        (status = 204, description = "Image deleted"),
        (status = 404, description = "Place or image not found (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state))]
pub async fn delete_image(
    State(state): State<AppState>,
    Path((slug_or_id, image_id)): Path<(String, i32)>,
) -> Result<impl IntoResponse, AppError> {
    PlaceService::from_state(&state)
        .delete_image(&slug_or_id, image_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
