use axum::{
    body::Body,
    extract::{DefaultBodyLimit, Multipart, Path, State},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use common::storage::{MediaKind, MediaPath};
use tokio_util::io::ReaderStream;
use tracing::instrument;

use crate::error::{AppError, ErrorBody};
use crate::state::AppState;

/// Multipart form field carrying the image.
pub const THUMBNAIL_FIELD: &str = "file";

/// Headroom for multipart framing on top of the configured file limit.
const MULTIPART_OVERHEAD: usize = 64 * 1024;

/// Body limit layer for thumbnail uploads.
pub fn thumbnail_body_limit(max_upload_bytes: u64) -> DefaultBodyLimit {
    let limit = usize::try_from(max_upload_bytes).unwrap_or(usize::MAX);
    DefaultBodyLimit::max(limit.saturating_add(MULTIPART_OVERHEAD))
}

/// Pull the `file` field out of a thumbnail upload and store it under
/// `<kind>/<slug>/<filename>`. Returns the stored relative path.
pub(crate) async fn store_thumbnail(
    state: &AppState,
    kind: MediaKind,
    slug: &str,
    mut multipart: Multipart,
) -> Result<String, AppError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Multipart error: {e}")))?
    {
        if field.name() != Some(THUMBNAIL_FIELD) {
            continue;
        }
        let filename = field
            .file_name()
            .map(str::to_string)
            .ok_or_else(|| AppError::field(THUMBNAIL_FIELD, "Upload must carry a filename"))?;
        let data = field.bytes().await.map_err(|e| {
            if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
                AppError::PayloadTooLarge(e.body_text())
            } else {
                AppError::Validation(format!("Failed to read upload: {}", e.body_text()))
            }
        })?;
        if data.is_empty() {
            return Err(AppError::field(THUMBNAIL_FIELD, "Uploaded file is empty"));
        }

        let path = MediaPath::new(kind, slug, &filename)?;
        state.media.put(&path, &data).await?;
        tracing::info!(path = %path, bytes = data.len(), "Thumbnail stored");
        return Ok(path.as_relative());
    }

    Err(AppError::field(
        THUMBNAIL_FIELD,
        "Multipart field 'file' is required",
    ))
}

#[utoipa::path(
    get,
    path = "/media/{path}",
    tag = "Media",
    operation_id = "getMedia",
    summary = "Download a stored thumbnail",
    description = "Streams a stored image. Paths have the form `<kind>/<slug>/<filename>` as returned in `thumbnail_url`.",
    params(("path" = String, Path, description = "Media path relative to the media root")),
    responses(
        (status = 200, description = "File content"),
        (status = 400, description = "Malformed path (VALIDATION_ERROR)", body = ErrorBody),
        (status = 404, description = "No such file (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state))]
pub async fn serve_media(
    State(state): State<AppState>,
    Path(path): Path<String>,
) -> Result<Response, AppError> {
    let media_path = MediaPath::parse(&path)?;
    let size = state.media.size(&media_path).await?;
    let reader = state.media.get_stream(&media_path).await?;

    let mime = mime_guess::from_path(media_path.filename()).first_or_octet_stream();

    Ok((
        [
            (header::CONTENT_TYPE, mime.to_string()),
            (header::CONTENT_LENGTH, size.to_string()),
        ],
        Body::from_stream(ReaderStream::new(reader)),
    )
        .into_response())
}
