//! Versioned cache lifecycle: install, activation cleanup, and handoff
//! from an old controller instance to a new one.

use color_eyre::{eyre::eyre, Result};
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::fetch::{Network, Request};
use crate::store::{CacheStore, CachedResponse};

/// Where the controller is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
  /// Not installed; the host must (re)try the install
  Idle,
  Installing,
  /// Shell precached, ready to supersede the active controller
  Installed,
  Activating,
  /// Controlling fetches
  Active,
}

impl std::fmt::Display for Phase {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    match self {
      Phase::Idle => write!(f, "idle"),
      Phase::Installing => write!(f, "installing"),
      Phase::Installed => write!(f, "installed"),
      Phase::Activating => write!(f, "activating"),
      Phase::Active => write!(f, "active"),
    }
  }
}

/// Owns cache-version identity: creates the current store on install,
/// deletes superseded stores on activation.
pub struct Lifecycle {
  phase: Phase,
  skip_waiting: bool,
  clients_claimed: bool,
}

impl Lifecycle {
  pub fn new() -> Self {
    Self {
      phase: Phase::Idle,
      skip_waiting: false,
      clients_claimed: false,
    }
  }

  pub fn phase(&self) -> Phase {
    self.phase
  }

  /// Whether this controller asked to replace the active one without
  /// waiting for existing clients to release it.
  pub fn skip_waiting_requested(&self) -> bool {
    self.skip_waiting
  }

  pub fn controls_clients(&self) -> bool {
    self.clients_claimed
  }

  /// Precache the application shell into the current versioned store.
  ///
  /// All-or-nothing: every manifest descriptor is fetched fresh from the
  /// network first, and the store is only created and populated once all of
  /// them resolved. Any failure leaves no store behind and the phase at
  /// `Idle` so the host retries the install later.
  pub async fn install(
    &mut self,
    config: &Config,
    network: &dyn Network,
    store: &dyn CacheStore,
  ) -> Result<()> {
    self.phase = Phase::Installing;
    info!(cache = %config.cache_name, "installing");

    let origin = config.origin_url()?;

    let fetches = config.precache.iter().map(|path| {
      let request = Request::get(path.clone());
      let origin = origin.clone();
      async move {
        let response = network.fetch(&request).await?;
        if !response.is_success() {
          return Err(eyre!(
            "Precache fetch for {} returned status {}",
            request.url,
            response.status
          ));
        }
        let key = request.store_key(&origin)?;
        Ok((key, CachedResponse::capture(response)))
      }
    });

    let entries = match futures::future::try_join_all(fetches).await {
      Ok(entries) => entries,
      Err(error) => {
        self.phase = Phase::Idle;
        return Err(eyre!("Failed to precache application shell: {}", error));
      }
    };

    store.create_store(&config.cache_name).await?;
    for (key, entry) in entries {
      if let Err(error) = store.put(&config.cache_name, &key, entry).await {
        // No partial store is ever considered ready
        let _ = store.delete_store(&config.cache_name).await;
        self.phase = Phase::Idle;
        return Err(eyre!("Failed to populate store: {}", error));
      }
    }

    self.phase = Phase::Installed;
    self.skip_waiting = true;
    info!(
      cache = %config.cache_name,
      entries = config.precache.len(),
      "install complete, ready to supersede the active controller"
    );

    Ok(())
  }

  /// Delete every store not named by the current identifier, then take
  /// control of open clients.
  ///
  /// This is the only garbage-collection mechanism; stale versions are
  /// never cleaned up opportunistically.
  pub async fn activate(&mut self, config: &Config, store: &dyn CacheStore) -> Result<()> {
    self.phase = Phase::Activating;
    info!(cache = %config.cache_name, "activating");

    for name in store.list_stores().await? {
      if name != config.cache_name {
        info!(stale = %name, "deleting superseded store");
        store.delete_store(&name).await?;
      }
    }

    self.phase = Phase::Active;

    if config.claim_on_activate {
      self.clients_claimed = true;
      warn!(
        "claiming open clients immediately; tabs loaded against an older cache \
         version keep their in-memory code until the next navigation"
      );
    } else {
      debug!("leaving open clients with their current controller");
    }

    Ok(())
  }

  /// Force immediate supersession, bypassing the deferred takeover the
  /// host would otherwise apply while old clients remain open.
  pub fn request_skip_waiting(&mut self) {
    self.skip_waiting = true;
    info!("skip-waiting requested, superseding active controller");
  }
}

impl Default for Lifecycle {
  fn default() -> Self {
    Self::new()
  }
}
