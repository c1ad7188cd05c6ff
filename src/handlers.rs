use axum::{Json, extract::{Multipart, Path, State}, http::{StatusCode, header}, response::Response};
use bytes::Bytes;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::{
    error::AppError,
    models::*,
    state::AppState,
    storage::{Storage, StorageError},
    store::{FileStore, StoreError},
    utils::{generate_share_id, get_file_extension},
};

// Share id generation is retried this many times before the upload fails.
// At ~40 bits per token a single retry is already rare.
const SHARE_ID_ATTEMPTS: u32 = 3;

/// Upload a file using multipart/form-data and hand back a share link.
pub async fn upload_file(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<UploadResponse>), AppError> {
    // Temporary holders for multipart fields
    let mut file_data: Option<Bytes> = None;
    let mut display_name: Option<String> = None;
    let mut content_type: Option<String> = None;

    // Parse multipart fields
    while let Some(field) = multipart.next_field().await.map_err(|e| {
        error!("Error parsing multipart: {}", e);
        AppError::MultipartError(format!("Failed to parse multipart form: {}", e))
    })? {
        if field.name() == Some("file") {
            display_name = field.file_name().map(|s| s.to_string());
            content_type = field.content_type().map(|s| s.to_string());
            // Read file bytes
            let data = field.bytes().await.map_err(|e| {
                error!("Error reading file bytes: {}", e);
                AppError::MultipartError(format!("Failed to read the file: {}", e))
            })?;
            file_data = Some(data);
        }
    }

    // Ensure file exists
    let file_data = file_data.ok_or_else(|| AppError::BadRequest("No file provided".into()))?;
    let display_name =
        display_name.ok_or_else(|| AppError::BadRequest("No file provided".into()))?;
    let size_bytes = file_data.len() as u64;

    // Enforce maximum file size
    if size_bytes > state.config.max_file_size {
        error!(
            "File size {} exceeds maximum limit of {} bytes",
            size_bytes, state.config.max_file_size
        );

        return Err(AppError::PayloadTooLarge(format!(
            "File size {} exceeds maximum limit of {} bytes",
            size_bytes, state.config.max_file_size
        )));
    }

    // Validate file extension
    let extension = get_file_extension(&display_name)
        .ok_or_else(|| AppError::BadRequest("Invalid file extension".into()))?;

    if !state.config.allowed_extensions.contains(&extension) {
        error!("File extension .{} is not allowed", extension);

        return Err(AppError::UnSupportedMediaType(format!(
            "File extension .{} is not allowed",
            extension
        )));
    }

    let content_type = content_type.unwrap_or_else(|| "application/octet-stream".into());

    // Write the bytes to the blob store under a fresh storage key
    let storage_key = format!("{}.{}", Uuid::new_v4(), extension);
    state
        .blobs
        .upload(&storage_key, file_data)
        .await
        .map_err(|e| {
            error!("Error storing file bytes: {}", e);
            AppError::InternalServerError("Failed to store file".into())
        })?;

    // Register the metadata record, retrying with a fresh share id on the
    // off chance the generated token collides with an existing one.
    let mut attempt = 0;
    let record = loop {
        let draft = FileDraft {
            storage_key: storage_key.clone(),
            display_name: display_name.clone(),
            content_type: content_type.clone(),
            size_bytes: size_bytes as i64,
            share_id: generate_share_id(),
        };
        match state.store.create(draft).await {
            Ok(record) => break record,
            Err(StoreError::DuplicateShareId(share_id)) if attempt < SHARE_ID_ATTEMPTS => {
                attempt += 1;
                warn!("Share id {} collided, retrying ({})", share_id, attempt);
            }
            Err(e) => {
                // Orphaned blob: the bytes were written but never got a
                // record. Remove them on the way out.
                let _ = state.blobs.delete(&storage_key).await;
                return Err(e.into());
            }
        }
    };

    info!(
        "File uploaded: {} as /api/files/{} ({} bytes)",
        record.id, record.share_id, record.size_bytes
    );

    Ok((
        StatusCode::CREATED,
        Json(UploadResponse {
            id: record.id,
            share_url: format!("/api/files/{}", record.share_id),
            share_id: record.share_id,
            display_name: record.display_name,
            size_bytes: record.size_bytes,
            content_type: record.content_type,
        }),
    ))
}

/// Public metadata view for a shared file. Counts as a view.
pub async fn get_file(
    State(state): State<AppState>,
    Path(share_id): Path<String>,
) -> Result<Json<FileResponse>, AppError> {
    let file = state
        .store
        .get_by_share_id(&share_id)
        .await?
        .ok_or_else(|| AppError::NotFound("File not found".to_string()))?;

    state.store.increment_views(file.id).await?;

    Ok(Json(FileResponse::from(file)))
}

/// Download a shared file as an attachment. Counts as a download.
pub async fn download_file(
    State(state): State<AppState>,
    Path(share_id): Path<String>,
) -> Result<Response, AppError> {
    let file = state
        .store
        .get_by_share_id(&share_id)
        .await?
        .ok_or_else(|| AppError::NotFound("File not found".to_string()))?;

    state.store.increment_downloads(file.id).await?;

    let content = fetch_blob(&state, &file).await?;
    serve_bytes(content, &file, true)
}

/// Serve a shared file inline, for in-browser previews. Does not touch
/// either counter.
pub async fn preview_file(
    State(state): State<AppState>,
    Path(share_id): Path<String>,
) -> Result<Response, AppError> {
    let file = state
        .store
        .get_by_share_id(&share_id)
        .await?
        .ok_or_else(|| AppError::NotFound("File not found".to_string()))?;

    let content = fetch_blob(&state, &file).await?;
    serve_bytes(content, &file, false)
}

/// Read a record's bytes from the blob store. A record whose blob has gone
/// missing surfaces as not-found rather than a server error.
async fn fetch_blob(state: &AppState, file: &FileRecord) -> Result<Bytes, AppError> {
    state
        .blobs
        .download(&file.storage_key)
        .await
        .map_err(|e| match e {
            StorageError::NotFound(key) => {
                error!("Record {} points at missing blob {}", file.id, key);
                AppError::NotFound("File content not found".to_string())
            }
            other => {
                error!("Error reading blob {}: {}", file.storage_key, other);
                AppError::InternalServerError("Failed to read file".to_string())
            }
        })
}

/// Build a binary response carrying the stored content type, optionally
/// forcing a download with the original filename.
fn serve_bytes(content: Bytes, file: &FileRecord, attachment: bool) -> Result<Response, AppError> {
    let mut response = Response::new(content.into());

    // Set Content-Type so the browser knows the file type
    response.headers_mut().insert(
        header::CONTENT_TYPE,
        header::HeaderValue::from_str(&file.content_type)
            .unwrap_or_else(|_| header::HeaderValue::from_static("application/octet-stream")),
    );

    // Content-Disposition distinguishes the download path (attachment with
    // the uploader's filename) from the inline preview path. Quotes and
    // backslashes in the name must be escaped inside the quoted-string.
    let disposition = if attachment {
        let safe_name = file.display_name.replace('\\', "\\\\").replace('"', "\\\"");
        format!("attachment; filename=\"{}\"", safe_name)
    } else {
        "inline".to_string()
    };
    response.headers_mut().insert(
        header::CONTENT_DISPOSITION,
        header::HeaderValue::from_str(&disposition)
            .unwrap_or_else(|_| header::HeaderValue::from_static("attachment")),
    );

    Ok(response)
}

/// Admin: list every stored file, most recent first.
pub async fn list_files(
    State(state): State<AppState>,
) -> Result<Json<Vec<FileResponse>>, AppError> {
    let files = state.store.get_all().await?;
    Ok(Json(files.into_iter().map(FileResponse::from).collect()))
}

/// Admin: aggregate statistics over the current live set.
pub async fn get_stats(State(state): State<AppState>) -> Result<Json<StoreStats>, AppError> {
    Ok(Json(state.store.compute_stats().await?))
}

/// Admin: delete a file and its stored bytes.
///
/// Blob deletion runs first, so a failure between the two steps can only
/// leave a leaked blob behind, never a record whose downloads 404 forever.
/// A blob-store failure is logged and does not block the metadata delete.
pub async fn delete_file(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, AppError> {
    let file = state
        .store
        .get(id)
        .await?
        .ok_or_else(|| AppError::NotFound("File not found".to_string()))?;

    if let Err(e) = state.blobs.delete(&file.storage_key).await {
        warn!("Failed to delete blob {}: {:?}", file.storage_key, e);
    }

    state.store.delete(id).await?;

    info!("File Deleted: {}", id);

    // 204 No Content indicates successful deletion with no response body
    Ok(StatusCode::NO_CONTENT)
}
