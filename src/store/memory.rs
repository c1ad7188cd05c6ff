use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::Utc;

use super::{FileStore, StoreError};
use crate::models::{FileDraft, FileRecord, StoreStats};

// In-memory metadata store
//
// A single mutex guards both maps and the id counter, so every operation
// is atomic with respect to every other; the lock is never held across an
// await point.
#[derive(Clone, Default)]
pub struct MemStore {
    inner: Arc<Mutex<Tables>>,
}

#[derive(Default)]
struct Tables {
    records: HashMap<i64, FileRecord>,
    // Secondary index: share id -> internal id, kept in lockstep with
    // `records` by create/delete.
    share_index: HashMap<String, i64>,
    // Last assigned id. Advances on every create and never rolls back,
    // so ids are not recycled after deletion.
    last_id: i64,
}

impl MemStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Tables> {
        // A poisoned lock means a panic mid-mutation; the table may be
        // inconsistent and the process is already going down.
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl FileStore for MemStore {
    async fn create(&self, draft: FileDraft) -> Result<FileRecord, StoreError> {
        let mut tables = self.lock();

        if tables.share_index.contains_key(&draft.share_id) {
            return Err(StoreError::DuplicateShareId(draft.share_id));
        }

        tables.last_id += 1;
        let record = FileRecord {
            id: tables.last_id,
            storage_key: draft.storage_key,
            display_name: draft.display_name,
            content_type: draft.content_type,
            size_bytes: draft.size_bytes,
            share_id: draft.share_id,
            created_at: Utc::now(),
            view_count: 0,
            download_count: 0,
        };

        tables.share_index.insert(record.share_id.clone(), record.id);
        tables.records.insert(record.id, record.clone());
        Ok(record)
    }

    async fn get(&self, id: i64) -> Result<Option<FileRecord>, StoreError> {
        Ok(self.lock().records.get(&id).cloned())
    }

    async fn get_by_share_id(&self, share_id: &str) -> Result<Option<FileRecord>, StoreError> {
        let tables = self.lock();
        Ok(tables
            .share_index
            .get(share_id)
            .and_then(|id| tables.records.get(id))
            .cloned())
    }

    async fn get_all(&self) -> Result<Vec<FileRecord>, StoreError> {
        let mut records: Vec<FileRecord> = self.lock().records.values().cloned().collect();
        // Most recent first; equal timestamps fall back to reverse
        // insertion order via the id.
        records.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| b.id.cmp(&a.id))
        });
        Ok(records)
    }

    async fn increment_views(&self, id: i64) -> Result<(), StoreError> {
        if let Some(record) = self.lock().records.get_mut(&id) {
            record.view_count += 1;
        }
        Ok(())
    }

    async fn increment_downloads(&self, id: i64) -> Result<(), StoreError> {
        if let Some(record) = self.lock().records.get_mut(&id) {
            record.download_count += 1;
        }
        Ok(())
    }

    async fn delete(&self, id: i64) -> Result<(), StoreError> {
        let mut tables = self.lock();
        if let Some(record) = tables.records.remove(&id) {
            tables.share_index.remove(&record.share_id);
        }
        Ok(())
    }

    async fn compute_stats(&self) -> Result<StoreStats, StoreError> {
        let tables = self.lock();
        let stats = tables
            .records
            .values()
            .fold(StoreStats::default(), |mut acc, record| {
                acc.total_files += 1;
                acc.total_views += record.view_count;
                acc.total_downloads += record.download_count;
                acc.total_size += record.size_bytes;
                acc
            });
        Ok(stats)
    }
}
