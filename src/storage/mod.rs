mod local;

pub use local::LocalStorage;

use async_trait::async_trait;
use bytes::Bytes;
use thiserror::Error;

// Blob store error types
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Blob not found: {0}")]
    NotFound(String), // Returned when no blob exists under a storage key

    #[error("Io Error: {0}")]
    IoError(#[from] std::io::Error), // Wraps standard I/O errors
}

// Async blob store trait
//
// The metadata store only records storage keys; everything that actually
// touches bytes goes through this trait. Keys are opaque relative paths
// generated at upload time.
#[async_trait]
pub trait Storage: Send + Sync {
    /// Write the blob under the given storage key, verbatim.
    async fn upload(&self, storage_key: &str, content: Bytes) -> Result<(), StorageError>;

    /// Read the blob back, unmodified.
    async fn download(&self, storage_key: &str) -> Result<Bytes, StorageError>;

    /// Delete the blob. Missing key is a no-op.
    async fn delete(&self, storage_key: &str) -> Result<(), StorageError>;
}
