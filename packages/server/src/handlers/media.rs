use axum::body::Body;
use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::{IntoResponse, Response};
use common::{StorageError, StorageKey};
use tokio_util::io::ReaderStream;
use tracing::instrument;

use crate::error::{AppError, ErrorBody};
use crate::state::AppState;

#[utoipa::path(
    get,
    path = "/media/{path}",
    tag = "Media",
    operation_id = "getMedia",
    summary = "Fetch a stored image",
    description = "Streams a normalized image by its storage path. Stored files never change \
        under the same path, so responses carry an ETag and may be cached.",
    params(("path" = String, Path, description = "Storage path, e.g. `places/<file>.jpg`")),
    responses(
        (status = 200, description = "Image content"),
        (status = 304, description = "Not Modified (ETag match)"),
        (status = 404, description = "File not found (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, headers))]
pub async fn serve_media(
    State(state): State<AppState>,
    Path(path): Path<String>,
    headers: HeaderMap,
) -> Result<Response, AppError> {
    let key = StorageKey::new(path).map_err(|_| AppError::NotFound("File not found".into()))?;

    let size = state.storage.size(&key).await?;
    let etag_value = etag(&key, size);

    if let Some(if_none_match) = headers.get(header::IF_NONE_MATCH)
        && let Ok(val) = if_none_match.to_str()
        && (val == etag_value || val == "*")
    {
        return Ok(StatusCode::NOT_MODIFIED.into_response());
    }

    let reader = match state.storage.get_stream(&key).await {
        Ok(reader) => reader,
        // Deleted between the size check and the open.
        Err(StorageError::NotFound(_)) => return Err(AppError::NotFound("File not found".into())),
        Err(e) => return Err(e.into()),
    };
    let body = Body::from_stream(ReaderStream::new(reader));

    let content_type = mime_guess::from_path(key.file_name())
        .first_raw()
        .unwrap_or("application/octet-stream");

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, content_type)
        .header(header::CONTENT_LENGTH, size.to_string())
        .header(header::ETAG, &etag_value)
        .header(header::CACHE_CONTROL, "public, max-age=86400")
        .body(body)
        .map_err(|e| AppError::Internal(format!("Failed to build response: {e}")))
}

/// Generated filenames are unique per upload, so name and size identify the content.
fn etag(key: &StorageKey, size: u64) -> String {
    format!("\"{}-{size:x}\"", key.file_name())
}
