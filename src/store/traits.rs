//! The abstract versioned response store.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use color_eyre::Result;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::fetch::{Response, ResponseKind};

/// A captured response at rest in a versioned store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CachedResponse {
  pub status: u16,
  pub headers: BTreeMap<String, String>,
  pub body: Vec<u8>,
  pub url: String,
  pub kind: ResponseKind,
  pub cached_at: DateTime<Utc>,
}

impl CachedResponse {
  /// Capture a response for storage, consuming it. When the original must
  /// also reach the network caller, duplicate it first
  /// (`Response::duplicate`) - response bodies are single-read streams.
  pub fn capture(response: Response) -> Self {
    Self {
      status: response.status,
      headers: response.headers,
      body: response.body,
      url: response.url,
      kind: response.kind,
      cached_at: Utc::now(),
    }
  }

  pub fn into_response(self) -> Response {
    Response {
      status: self.status,
      headers: self.headers,
      body: self.body,
      url: self.url,
      kind: self.kind,
    }
  }
}

/// Backend holding one named store per deployed cache version.
///
/// Entries are replace-or-insert only; nothing deletes a single entry.
/// Whole stores are deleted when a newer version supersedes them.
#[async_trait]
pub trait CacheStore: Send + Sync {
  /// Create the named store if it does not exist yet.
  async fn create_store(&self, name: &str) -> Result<()>;

  /// Exact-match lookup by store key.
  async fn get(&self, store: &str, key: &str) -> Result<Option<CachedResponse>>;

  /// Replace-or-insert an entry. Creates the store if absent.
  async fn put(&self, store: &str, key: &str, entry: CachedResponse) -> Result<()>;

  /// All entry keys in a store.
  async fn keys(&self, store: &str) -> Result<Vec<String>>;

  /// Names of every store, current or stale.
  async fn list_stores(&self) -> Result<Vec<String>>;

  /// Delete a whole store and its entries. Returns whether it existed.
  async fn delete_store(&self, name: &str) -> Result<bool>;
}
