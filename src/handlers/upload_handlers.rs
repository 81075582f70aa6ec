//! HTTP handler for `POST /upload`.
//! Buffers the multipart `file` part in memory, writes it to the configured
//! bucket through `StorageService` and answers with the object's public URL.

use crate::{
    errors::{AppError, UploadError},
    models::upload::{UploadRequest, UploadResponse},
    services::url_builder::build_url,
    state::AppState,
};
use axum::{
    Json,
    extract::{
        Multipart, State,
        multipart::{Field, MultipartRejection},
    },
    http::StatusCode,
};
use bytes::{Bytes, BytesMut};
use tracing::{Instrument, debug, info, info_span, warn};
use uuid::Uuid;

/// Multipart field carrying the file.
const FILE_FIELD: &str = "file";

/// Upload the `file` part and return its public URL.
pub async fn upload(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<UploadResponse>, AppError> {
    let request = read_upload(multipart).await?;
    let url = process_upload(&state, request).await?;
    Ok(Json(UploadResponse::success(url)))
}

/// Write one extracted upload to the store and build its URL.
///
/// Exactly one store attempt is made; failures are returned as they are.
pub async fn process_upload(state: &AppState, request: UploadRequest) -> Result<String, UploadError> {
    let span = info_span!(
        "upload",
        upload_id = %Uuid::new_v4(),
        object = %request.filename,
        size = request.content.len(),
    );

    async move {
        let UploadRequest {
            filename,
            content,
            content_type,
        } = request;

        if let Err(err) = state
            .storage
            .write(&state.bucket, &filename, content, &content_type)
            .await
        {
            warn!(error = %err, "upload failed");
            return Err(err.into());
        }

        let url = build_url(state.bucket.name(), &filename);
        info!(%url, "upload committed");
        Ok(url)
    }
    .instrument(span)
    .await
}

/// Pull the first `file` part that carries a filename out of the body.
///
/// A body that is not multipart, or breaks before such a part appears, counts
/// as a missing file. Exceeding the body limit is a read failure.
async fn read_upload(
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<UploadRequest, UploadError> {
    let mut multipart = multipart.map_err(|rejection| {
        debug!("rejected upload body: {}", rejection);
        UploadError::MissingFile
    })?;

    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => return Err(UploadError::MissingFile),
            Err(err) if err.status() == StatusCode::PAYLOAD_TOO_LARGE => {
                return Err(UploadError::Io(err));
            }
            Err(err) => {
                debug!("malformed multipart body: {}", err);
                return Err(UploadError::MissingFile);
            }
        };

        if field.name() != Some(FILE_FIELD) {
            continue;
        }
        let Some(filename) = field.file_name().filter(|name| !name.is_empty()) else {
            continue;
        };
        let filename = filename.to_string();
        let content_type = field.content_type().unwrap_or_default().to_string();
        let content = read_part(field).await?;

        return Ok(UploadRequest {
            filename,
            content,
            content_type,
        });
    }
}

/// Drain the part chunk by chunk. A single chunk is routinely shorter than
/// the part, so only end of stream finishes the read.
async fn read_part(mut field: Field<'_>) -> Result<Bytes, UploadError> {
    let mut buf = BytesMut::new();
    while let Some(chunk) = field.chunk().await.map_err(UploadError::Io)? {
        buf.extend_from_slice(&chunk);
    }
    Ok(buf.freeze())
}
