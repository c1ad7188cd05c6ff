use async_trait::async_trait;
use sqlx::postgres::{PgPool, PgPoolOptions};
use tracing::info;

use super::{FileStore, StoreError};
use crate::models::{FileDraft, FileRecord, StoreStats};

const RECORD_COLUMNS: &str = "id, storage_key, display_name, content_type, size_bytes, \
     share_id, created_at, view_count, download_count";

// Postgres-backed metadata store
//
// Same contract as the in-memory store: ids come from a sequence that
// never rolls back, share id uniqueness is enforced by the UNIQUE
// constraint, and counter bumps or deletes on a missing id are no-ops.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    /// Connect to the database and run pending migrations.
    pub async fn connect(database_url: &str) -> Result<Self, StoreError> {
        info!("Connecting to database...");

        let pool = PgPoolOptions::new()
            .max_connections(5)
            .connect(database_url)
            .await?;
        sqlx::migrate!().run(&pool).await?;

        info!("Database connection established");
        Ok(Self { pool })
    }
}

#[async_trait]
impl FileStore for PgStore {
    async fn create(&self, draft: FileDraft) -> Result<FileRecord, StoreError> {
        let query = format!(
            "INSERT INTO files (storage_key, display_name, content_type, size_bytes, share_id) \
             VALUES ($1, $2, $3, $4, $5) RETURNING {RECORD_COLUMNS}"
        );
        sqlx::query_as::<_, FileRecord>(&query)
            .bind(&draft.storage_key)
            .bind(&draft.display_name)
            .bind(&draft.content_type)
            .bind(draft.size_bytes)
            .bind(&draft.share_id)
            .fetch_one(&self.pool)
            .await
            .map_err(|err| match err {
                sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
                    StoreError::DuplicateShareId(draft.share_id.clone())
                }
                other => StoreError::DatabaseError(other),
            })
    }

    async fn get(&self, id: i64) -> Result<Option<FileRecord>, StoreError> {
        let query = format!("SELECT {RECORD_COLUMNS} FROM files WHERE id = $1");
        Ok(sqlx::query_as::<_, FileRecord>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn get_by_share_id(&self, share_id: &str) -> Result<Option<FileRecord>, StoreError> {
        let query = format!(
            "SELECT {RECORD_COLUMNS} FROM files WHERE share_id = $1 ORDER BY id LIMIT 1"
        );
        Ok(sqlx::query_as::<_, FileRecord>(&query)
            .bind(share_id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn get_all(&self) -> Result<Vec<FileRecord>, StoreError> {
        let query = format!(
            "SELECT {RECORD_COLUMNS} FROM files ORDER BY created_at DESC, id DESC"
        );
        Ok(sqlx::query_as::<_, FileRecord>(&query)
            .fetch_all(&self.pool)
            .await?)
    }

    async fn increment_views(&self, id: i64) -> Result<(), StoreError> {
        sqlx::query("UPDATE files SET view_count = view_count + 1 WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn increment_downloads(&self, id: i64) -> Result<(), StoreError> {
        sqlx::query("UPDATE files SET download_count = download_count + 1 WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn delete(&self, id: i64) -> Result<(), StoreError> {
        sqlx::query("DELETE FROM files WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn compute_stats(&self) -> Result<StoreStats, StoreError> {
        // SUM over BIGINT widens to NUMERIC in Postgres; cast back down.
        Ok(sqlx::query_as::<_, StoreStats>(
            "SELECT COUNT(*)::BIGINT AS total_files, \
                    COALESCE(SUM(view_count), 0)::BIGINT AS total_views, \
                    COALESCE(SUM(download_count), 0)::BIGINT AS total_downloads, \
                    COALESCE(SUM(size_bytes), 0)::BIGINT AS total_size \
             FROM files",
        )
        .fetch_one(&self.pool)
        .await?)
    }
}
