//! Uploaded file serving and multipart helpers

use axum::body::Bytes;
use axum::extract::multipart::MultipartError;
use axum::extract::{Multipart, State};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::Router;
use http::{StatusCode, header};
use shared::error::{AppError, ErrorCode};

use crate::state::AppState;
use crate::validation::AppPath;

pub fn router() -> Router<AppState> {
    Router::new().route("/api/uploads/{filename}", get(serve))
}

/// GET /api/uploads/{filename}
pub async fn serve(
    State(state): State<AppState>,
    AppPath(filename): AppPath<String>,
) -> Result<impl IntoResponse, AppError> {
    let content = state.images.read(&filename).await?;
    let mime = mime_guess::from_path(&filename).first_or_octet_stream();
    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, mime.essence_str().to_string()),
            // Names are content hashes, so a file never changes
            (
                header::CACHE_CONTROL,
                "public, max-age=31536000, immutable".to_string(),
            ),
        ],
        Bytes::from(content),
    ))
}

fn multipart_error(e: MultipartError) -> AppError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::new(ErrorCode::PayloadTooLarge)
    } else {
        AppError::with_message(ErrorCode::InvalidRequest, format!("Invalid multipart request: {e}"))
    }
}

/// Read the `file` field of a multipart form: `(original filename, bytes)`
pub async fn read_file_field(multipart: &mut Multipart) -> Result<(String, Bytes), AppError> {
    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        if field.name() != Some("file") {
            continue;
        }
        let filename = field
            .file_name()
            .map(str::to_string)
            .ok_or_else(|| AppError::field("file", "filename is required"))?;
        let data = field.bytes().await.map_err(multipart_error)?;
        return Ok((filename, data));
    }
    Err(AppError::field("file", "is required"))
}
