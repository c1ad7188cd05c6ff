use std::path::{Path, PathBuf};

use async_trait::async_trait;
use bytes::Bytes;
use tokio::{fs, io::AsyncWriteExt};

use super::{Storage, StorageError};

// Local filesystem blob store
#[derive(Clone)]
pub struct LocalStorage {
    base_path: PathBuf, // Base directory where blobs are stored
}

impl LocalStorage {
    /// Creates a new LocalStorage instance and ensures the base directory exists.
    pub async fn new(base_path: impl AsRef<Path>) -> Result<Self, StorageError> {
        fs::create_dir_all(&base_path).await?;
        Ok(Self {
            base_path: base_path.as_ref().to_path_buf(),
        })
    }

    /// Returns the full path of a blob relative to the base directory.
    fn full_path(&self, storage_key: &str) -> PathBuf {
        self.base_path.join(storage_key)
    }
}

#[async_trait]
impl Storage for LocalStorage {
    async fn upload(&self, storage_key: &str, content: Bytes) -> Result<(), StorageError> {
        let full_path = self.full_path(storage_key);

        // Ensure parent directories exist
        if let Some(parent) = full_path.parent() {
            fs::create_dir_all(parent).await?;
        }

        let mut file = fs::File::create(&full_path).await?;
        file.write_all(&content).await?;

        tracing::info!("Saved blob at {:?}", full_path);
        Ok(())
    }

    async fn download(&self, storage_key: &str) -> Result<Bytes, StorageError> {
        let full_path = self.full_path(storage_key);

        if !full_path.exists() {
            return Err(StorageError::NotFound(storage_key.to_string()));
        }

        let content = fs::read(&full_path).await?;
        Ok(Bytes::from(content))
    }

    async fn delete(&self, storage_key: &str) -> Result<(), StorageError> {
        let full_path = self.full_path(storage_key);

        if full_path.exists() {
            fs::remove_file(&full_path).await?;
        }
        Ok(())
    }
}
