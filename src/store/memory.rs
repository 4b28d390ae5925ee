//! In-memory store, used by tests and ephemeral hosts.

use async_trait::async_trait;
use color_eyre::Result;
use std::collections::{BTreeMap, HashMap};
use tokio::sync::Mutex;

use super::traits::{CacheStore, CachedResponse};

/// In-memory implementation of the versioned store.
#[derive(Default)]
pub struct MemoryStore {
  stores: Mutex<BTreeMap<String, HashMap<String, CachedResponse>>>,
}

impl MemoryStore {
  pub fn new() -> Self {
    Self::default()
  }
}

#[async_trait]
impl CacheStore for MemoryStore {
  async fn create_store(&self, name: &str) -> Result<()> {
    self
      .stores
      .lock()
      .await
      .entry(name.to_string())
      .or_default();
    Ok(())
  }

  async fn get(&self, store: &str, key: &str) -> Result<Option<CachedResponse>> {
    Ok(
      self
        .stores
        .lock()
        .await
        .get(store)
        .and_then(|entries| entries.get(key))
        .cloned(),
    )
  }

  async fn put(&self, store: &str, key: &str, entry: CachedResponse) -> Result<()> {
    self
      .stores
      .lock()
      .await
      .entry(store.to_string())
      .or_default()
      .insert(key.to_string(), entry);
    Ok(())
  }

  async fn keys(&self, store: &str) -> Result<Vec<String>> {
    Ok(
      self
        .stores
        .lock()
        .await
        .get(store)
        .map(|entries| entries.keys().cloned().collect())
        .unwrap_or_default(),
    )
  }

  async fn list_stores(&self) -> Result<Vec<String>> {
    Ok(self.stores.lock().await.keys().cloned().collect())
  }

  async fn delete_store(&self, name: &str) -> Result<bool> {
    Ok(self.stores.lock().await.remove(name).is_some())
  }
}
