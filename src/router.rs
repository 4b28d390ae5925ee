//! Request routing: cache-first with network fallback, opportunistic store
//! population, and the offline document for failed navigations.

use color_eyre::{eyre::eyre, Result};
use std::sync::Arc;
use tokio::task::JoinSet;
use tracing::{debug, warn};
use url::Url;

use crate::config::Config;
use crate::fetch::{Network, Request, Response};
use crate::store::{CacheStore, CachedResponse};

/// Which source satisfied an intercepted request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServedFrom {
  Cache,
  Network,
  OfflineFallback,
}

/// Terminal outcome of routing one request.
#[derive(Debug)]
pub enum FetchOutcome {
  /// The worker produced a response
  Served {
    response: Response,
    source: ServedFrom,
  },
  /// Non-GET request; the host performs its default fetch untouched
  PassThrough,
}

/// Decides cache-first vs network per intercepted request and populates the
/// current store opportunistically.
pub struct Router {
  cache_name: String,
  offline_fallback: String,
  origin: Url,
}

impl Router {
  pub fn new(config: &Config) -> Result<Self> {
    Ok(Self {
      cache_name: config.cache_name.clone(),
      offline_fallback: config.offline_fallback.clone(),
      origin: config.origin_url()?,
    })
  }

  /// Route one intercepted request.
  ///
  /// Decision order: exact store match wins (never revalidated), then the
  /// network. A cacheable network response is duplicated before anything
  /// reads it; the duplicate goes to a detached store write on `pending`
  /// whose failure never fails the response to the caller. A network error
  /// yields the offline document for navigations and propagates for
  /// everything else.
  pub async fn route(
    &self,
    request: Request,
    store: Arc<dyn CacheStore>,
    network: Arc<dyn Network>,
    pending: &mut JoinSet<()>,
  ) -> Result<FetchOutcome> {
    if !request.method.is_cacheable() {
      debug!(method = %request.method, url = %request.url, "passing through");
      return Ok(FetchOutcome::PassThrough);
    }

    let key = request.store_key(&self.origin)?;

    if let Some(entry) = store.get(&self.cache_name, &key).await? {
      debug!(url = %request.url, "serving from cache");
      return Ok(FetchOutcome::Served {
        response: entry.into_response(),
        source: ServedFrom::Cache,
      });
    }

    match network.fetch(&request).await {
      Ok(response) => {
        if response.is_cacheable() {
          // Duplicate before the caller consumes the body; the write runs
          // detached and its failure is only logged.
          let entry = CachedResponse::capture(response.duplicate());
          let cache_name = self.cache_name.clone();
          let url = request.url.clone();
          pending.spawn(async move {
            if let Err(error) = store.put(&cache_name, &key, entry).await {
              warn!(url = %url, %error, "failed to cache response");
            }
          });
        }
        Ok(FetchOutcome::Served {
          response,
          source: ServedFrom::Network,
        })
      }
      Err(error) => {
        if !request.destination.is_navigation() {
          return Err(error);
        }

        debug!(url = %request.url, "network failed, serving offline document");
        let fallback_key = Request::get(self.offline_fallback.clone()).store_key(&self.origin)?;
        match store.get(&self.cache_name, &fallback_key).await? {
          Some(entry) => Ok(FetchOutcome::Served {
            response: entry.into_response(),
            source: ServedFrom::OfflineFallback,
          }),
          None => Err(eyre!(
            "Offline document {} missing from store {}: {}",
            self.offline_fallback,
            self.cache_name,
            error
          )),
        }
      }
    }
  }
}
