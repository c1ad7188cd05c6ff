use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::prelude::FromRow;

/// A stored file's metadata. Immutable after creation except for the two
/// counters; `id` is assigned by the store and never reused.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct FileRecord {
    pub id: i64,
    /// Opaque key addressing the raw bytes in the blob store.
    pub storage_key: String,
    /// Name the uploader supplied, used for download headers.
    pub display_name: String,
    pub content_type: String,
    pub size_bytes: i64,
    /// Public lookup token, unique across the store.
    pub share_id: String,
    pub created_at: DateTime<Utc>,
    pub view_count: i64,
    pub download_count: i64,
}

/// Caller-supplied fields for `FileStore::create`. The store fills in
/// `id`, `created_at`, and zeroed counters.
#[derive(Debug, Clone)]
pub struct FileDraft {
    pub storage_key: String,
    pub display_name: String,
    pub content_type: String,
    pub size_bytes: i64,
    pub share_id: String,
}

/// Aggregates over the current live record set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct StoreStats {
    pub total_files: i64,
    pub total_views: i64,
    pub total_downloads: i64,
    pub total_size: i64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UploadResponse {
    pub id: i64,
    pub share_id: String,
    pub share_url: String,
    pub display_name: String,
    pub size_bytes: i64,
    pub content_type: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct FileResponse {
    pub id: i64,
    pub share_id: String,
    pub display_name: String,
    pub content_type: String,
    pub size_bytes: i64,
    pub created_at: DateTime<Utc>,
    pub view_count: i64,
    pub download_count: i64,
    pub download_url: String,
    pub preview_url: String,
}

impl From<FileRecord> for FileResponse {
    fn from(file: FileRecord) -> Self {
        FileResponse {
            download_url: format!("/api/files/{}/download", file.share_id),
            preview_url: format!("/api/files/{}/preview", file.share_id),
            id: file.id,
            share_id: file.share_id,
            display_name: file.display_name,
            content_type: file.content_type,
            size_bytes: file.size_bytes,
            created_at: file.created_at,
            view_count: file.view_count,
            download_count: file.download_count,
        }
    }
}
