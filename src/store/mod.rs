// Submodules for the in-memory store and the Postgres-backed store
mod memory;
mod postgres;

pub use memory::MemStore;
pub use postgres::PgStore;

use anyhow::Context;
use async_trait::async_trait;
use thiserror::Error;
use tracing::info;

use crate::config::Config;
use crate::models::{FileDraft, FileRecord, StoreStats};

// Metadata store error types
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Duplicate share id: {0}")]
    DuplicateShareId(String), // A record with this share id already exists

    #[error(transparent)]
    DatabaseError(#[from] sqlx::Error), // Wraps Postgres backend errors

    #[error(transparent)]
    MigrateError(#[from] sqlx::migrate::MigrateError),
}

/// Async metadata store trait.
///
/// Every lookup miss is an `Ok(None)` or a silent no-op, never an error;
/// the only error path a caller has to handle on the happy path is a
/// duplicate share id at `create`.
#[async_trait]
pub trait FileStore: Send + Sync {
    /// Persist a new record. Assigns the next id (never reused, strictly
    /// increasing), stamps `created_at`, and zeroes both counters.
    async fn create(&self, draft: FileDraft) -> Result<FileRecord, StoreError>;

    /// Look up a record by its internal id.
    async fn get(&self, id: i64) -> Result<Option<FileRecord>, StoreError>;

    /// Look up a record by its public share id.
    async fn get_by_share_id(&self, share_id: &str) -> Result<Option<FileRecord>, StoreError>;

    /// All live records, most recently created first. Ties in `created_at`
    /// break by reverse insertion order.
    async fn get_all(&self) -> Result<Vec<FileRecord>, StoreError>;

    /// Bump the view counter by one. No-op if the id is not live.
    async fn increment_views(&self, id: i64) -> Result<(), StoreError>;

    /// Bump the download counter by one. No-op if the id is not live.
    async fn increment_downloads(&self, id: i64) -> Result<(), StoreError>;

    /// Remove a record. No-op if the id is not live. Does not touch the
    /// blob store; callers delete the underlying bytes themselves.
    async fn delete(&self, id: i64) -> Result<(), StoreError>;

    /// Aggregates over the current live set, recomputed on every call.
    async fn compute_stats(&self) -> Result<StoreStats, StoreError>;
}

// Enum to represent metadata store backends
#[derive(Clone)]
pub enum StoreBackend {
    Memory(MemStore),   // Process-lifetime in-memory table
    Postgres(PgStore),  // Durable Postgres table
}

// Implement FileStore for StoreBackend enum
// Delegates calls to the chosen backend
#[async_trait]
impl FileStore for StoreBackend {
    async fn create(&self, draft: FileDraft) -> Result<FileRecord, StoreError> {
        match self {
            StoreBackend::Memory(s) => s.create(draft).await,
            StoreBackend::Postgres(s) => s.create(draft).await,
        }
    }

    async fn get(&self, id: i64) -> Result<Option<FileRecord>, StoreError> {
        match self {
            StoreBackend::Memory(s) => s.get(id).await,
            StoreBackend::Postgres(s) => s.get(id).await,
        }
    }

    async fn get_by_share_id(&self, share_id: &str) -> Result<Option<FileRecord>, StoreError> {
        match self {
            StoreBackend::Memory(s) => s.get_by_share_id(share_id).await,
            StoreBackend::Postgres(s) => s.get_by_share_id(share_id).await,
        }
    }

    async fn get_all(&self) -> Result<Vec<FileRecord>, StoreError> {
        match self {
            StoreBackend::Memory(s) => s.get_all().await,
            StoreBackend::Postgres(s) => s.get_all().await,
        }
    }

    async fn increment_views(&self, id: i64) -> Result<(), StoreError> {
        match self {
            StoreBackend::Memory(s) => s.increment_views(id).await,
            StoreBackend::Postgres(s) => s.increment_views(id).await,
        }
    }

    async fn increment_downloads(&self, id: i64) -> Result<(), StoreError> {
        match self {
            StoreBackend::Memory(s) => s.increment_downloads(id).await,
            StoreBackend::Postgres(s) => s.increment_downloads(id).await,
        }
    }

    async fn delete(&self, id: i64) -> Result<(), StoreError> {
        match self {
            StoreBackend::Memory(s) => s.delete(id).await,
            StoreBackend::Postgres(s) => s.delete(id).await,
        }
    }

    async fn compute_stats(&self) -> Result<StoreStats, StoreError> {
        match self {
            StoreBackend::Memory(s) => s.compute_stats().await,
            StoreBackend::Postgres(s) => s.compute_stats().await,
        }
    }
}

// Initialize the metadata store backend based on config
pub async fn init_store(config: &Config) -> anyhow::Result<StoreBackend> {
    if config.use_postgres {
        let database_url = config
            .database_url
            .as_deref()
            .context("DATABASE_URL must be set when STORE_BACKEND=postgres")?;
        info!("Initializing Postgres file store");
        Ok(StoreBackend::Postgres(PgStore::connect(database_url).await?))
    } else {
        info!("Initializing in-memory file store");
        Ok(StoreBackend::Memory(MemStore::new()))
    }
}
