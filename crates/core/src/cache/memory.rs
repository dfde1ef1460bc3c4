//! In-memory store backend.
//!
//! Uses a Vec of named maps behind a tokio RwLock so that store creation
//! order is preserved for [`CacheStorage::match_any`].

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{CacheStorage, RequestKey, ResponseSnapshot};
use crate::Error;

struct NamedStore {
    name: String,
    entries: HashMap<String, ResponseSnapshot>,
}

/// Process-local [`CacheStorage`]. Contents are lost when dropped.
#[derive(Clone, Default)]
pub struct MemoryStorage {
    stores: Arc<RwLock<Vec<NamedStore>>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CacheStorage for MemoryStorage {
    async fn store_names(&self) -> Result<Vec<String>, Error> {
        let stores = self.stores.read().await;
        Ok(stores.iter().map(|s| s.name.clone()).collect())
    }

    async fn has_store(&self, store: &str) -> Result<bool, Error> {
        let stores = self.stores.read().await;
        Ok(stores.iter().any(|s| s.name == store))
    }

    async fn delete_store(&self, store: &str) -> Result<bool, Error> {
        let mut stores = self.stores.write().await;
        let before = stores.len();
        stores.retain(|s| s.name != store);
        Ok(stores.len() < before)
    }

    async fn match_any(&self, key: &RequestKey) -> Result<Option<ResponseSnapshot>, Error> {
        let stores = self.stores.read().await;
        Ok(stores.iter().find_map(|s| s.entries.get(&key.hash).cloned()))
    }

    async fn match_in(&self, store: &str, key: &RequestKey) -> Result<Option<ResponseSnapshot>, Error> {
        let stores = self.stores.read().await;
        Ok(stores
            .iter()
            .find(|s| s.name == store)
            .and_then(|s| s.entries.get(&key.hash).cloned()))
    }

    async fn put(&self, store: &str, key: &RequestKey, response: &ResponseSnapshot) -> Result<(), Error> {
        let mut stores = self.stores.write().await;
        let index = match stores.iter().position(|s| s.name == store) {
            Some(index) => index,
            None => {
                stores.push(NamedStore { name: store.to_string(), entries: HashMap::new() });
                stores.len() - 1
            }
        };
        stores[index].entries.insert(key.hash.clone(), response.clone());
        Ok(())
    }

    async fn entry_count(&self, store: &str) -> Result<u64, Error> {
        let stores = self.stores.read().await;
        Ok(stores
            .iter()
            .find(|s| s.name == store)
            .map_or(0, |s| s.entries.len() as u64))
    }
}
