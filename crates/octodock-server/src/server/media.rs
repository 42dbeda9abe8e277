//! `/media` handlers.

use axum::Json;
use axum::body::Body;
use axum::extract::multipart::MultipartRejection;
use axum::extract::{Multipart, Path, Query, State};
use axum::http::header::{CONTENT_LENGTH, CONTENT_TYPE};
use axum::http::{HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use futures_util::TryStreamExt;
use serde::Deserialize;
use tokio_util::io::{ReaderStream, StreamReader};
use tracing::instrument;

use crate::media::{DEFAULT_MIME_TYPE, MediaRecord, UploadContent};

use super::error::ApiError;
use super::state::AppState;

const FILE_FIELD: &str = "file";

/// `POST /media` with a multipart `file` field.
///
/// The field is streamed to disk without buffering it in memory.
#[instrument(skip_all)]
pub async fn upload_media(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<(StatusCode, Json<MediaRecord>), ApiError> {
    let mut multipart = multipart.map_err(|e| ApiError::InvalidInput(e.body_text()))?;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::InvalidInput(e.body_text()))?
    {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }
        let original_name = field.file_name().unwrap_or(FILE_FIELD).to_string();
        let mime_type = field.content_type().map(str::to_string);
        let reader = StreamReader::new(field.map_err(std::io::Error::other));

        let record = state
            .media
            .upload(
                UploadContent::Stream(Box::pin(reader)),
                &original_name,
                mime_type.as_deref(),
            )
            .await?;
        return Ok((StatusCode::CREATED, Json(record)));
    }

    Err(ApiError::InvalidInput("No file provided".into()))
}

#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
    pub page: Option<String>,
    pub limit: Option<String>,
}

/// Positive integer from a query value, else `default`.
fn positive_or(raw: Option<&str>, default: usize) -> usize {
    raw.and_then(|v| v.trim().parse::<usize>().ok())
        .filter(|&n| n >= 1)
        .unwrap_or(default)
}

/// `GET /media?page=&limit=`
pub async fn list_media(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Result<Json<Vec<MediaRecord>>, ApiError> {
    let page = positive_or(params.page.as_deref(), 1);
    let limit = positive_or(
        params.limit.as_deref(),
        state.config.media.default_page_size.max(1),
    );
    Ok(Json(state.media.list(page, limit).await?))
}

/// `GET /media/{id}`: the stored bytes with their recorded content type.
pub async fn get_media(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    let record = state.media.get_metadata(&id).await?;
    let file = state.media.open_read_stream(&id).await?;

    let content_type = HeaderValue::from_str(&record.mime_type)
        .unwrap_or_else(|_| HeaderValue::from_static(DEFAULT_MIME_TYPE));
    Ok((
        [
            (CONTENT_TYPE, content_type),
            (CONTENT_LENGTH, HeaderValue::from(record.size_bytes)),
        ],
        Body::from_stream(ReaderStream::new(file)),
    )
        .into_response())
}

/// `GET /media/{id}/meta`
pub async fn get_media_meta(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<MediaRecord>, ApiError> {
    Ok(Json(state.media.get_metadata(&id).await?))
}

/// `DELETE /media/{id}`
pub async fn delete_media(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    state.media.delete(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}
