use crate::config::Config;
use crate::storage::LocalStorage;
use crate::store::StoreBackend;

/// Central application state shared across all Axum handlers.
#[derive(Clone)]
pub struct AppState {
    /// Metadata store backend (in-memory or Postgres).
    pub store: StoreBackend,

    /// Blob store holding the raw uploaded bytes, addressed by storage key.
    pub blobs: LocalStorage,

    /// Application configuration loaded from environment variables or `.env`.
    pub config: Config,
}
