//! Named, versioned cache stores.
//!
//! A store maps a request key (method + URL) to a response snapshot. Several
//! stores exist at once, one per [`StoreKind`], and their names carry the
//! deployment version so that a version bump leaves the old stores behind
//! for activation to purge.
//!
//! Two backends implement [`CacheStorage`]:
//!
//! - [`CacheDb`], persistent SQLite via tokio-rusqlite with WAL mode and
//!   schema migrations
//! - [`MemoryStorage`], process-local maps used by tests and ephemeral runs

pub mod connection;
pub mod hash;
pub mod memory;
pub mod migrations;
pub mod names;
pub mod response;
pub mod stores;

use std::sync::Arc;

use async_trait::async_trait;

pub use crate::Error;
use crate::config::{AppConfig, StorageBackend};

pub use connection::CacheDb;
pub use hash::RequestKey;
pub use memory::MemoryStorage;
pub use names::{StoreKind, StoreSet};
pub use response::{ResponseSnapshot, TIMESTAMP_HEADER};

/// Process-wide set of named stores shared by every request handler.
///
/// Writes are scoped to a single (store, key) pair and overwrite whatever was
/// there; no operation spans more than one key, so concurrent handlers never
/// need to coordinate.
#[async_trait]
pub trait CacheStorage: Send + Sync {
    /// Names of all existing stores, oldest first.
    async fn store_names(&self) -> Result<Vec<String>, Error>;

    async fn has_store(&self, store: &str) -> Result<bool, Error>;

    /// Delete a store with all of its entries. Returns false if it did not exist.
    async fn delete_store(&self, store: &str) -> Result<bool, Error>;

    /// Look a request up across every store, oldest store first.
    async fn match_any(&self, key: &RequestKey) -> Result<Option<ResponseSnapshot>, Error>;

    /// Look a request up in a single store.
    async fn match_in(&self, store: &str, key: &RequestKey) -> Result<Option<ResponseSnapshot>, Error>;

    /// Insert or overwrite an entry, creating the store on first write.
    async fn put(&self, store: &str, key: &RequestKey, response: &ResponseSnapshot) -> Result<(), Error>;

    async fn entry_count(&self, store: &str) -> Result<u64, Error>;

    /// Entry count per store, oldest store first.
    async fn entry_counts(&self) -> Result<Vec<(String, u64)>, Error> {
        let mut counts = Vec::new();
        for name in self.store_names().await? {
            let count = self.entry_count(&name).await?;
            counts.push((name, count));
        }
        Ok(counts)
    }

    /// Delete every store. Returns how many were removed.
    async fn clear_all(&self) -> Result<usize, Error> {
        let mut deleted = 0;
        for name in self.store_names().await? {
            if self.delete_store(&name).await? {
                deleted += 1;
            }
        }
        Ok(deleted)
    }
}

/// Open the backend selected by `config.storage`.
pub async fn open_storage(config: &AppConfig) -> Result<Arc<dyn CacheStorage>, Error> {
    match config.storage {
        StorageBackend::Sqlite => {
            tracing::debug!(path = %config.db_path.display(), "opening sqlite cache storage");
            Ok(Arc::new(CacheDb::open(&config.db_path).await?))
        }
        StorageBackend::Memory => Ok(Arc::new(MemoryStorage::new())),
    }
}
