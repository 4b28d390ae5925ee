use color_eyre::{eyre::eyre, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use url::Url;

/// Worker configuration, fixed at deploy time and injected at construction.
///
/// The cache name is the version identifier: bumping it on deploy is what
/// retires the previous store on the next activation.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
  /// Versioned store name, e.g. "pathpatrol-v1.0.0"
  pub cache_name: String,
  /// Origin every relative descriptor resolves against
  pub origin: String,
  /// Core application shell, precached in order at install time
  pub precache: Vec<String>,
  /// Document served for failed navigations; must be in `precache`
  pub offline_fallback: String,
  /// The one deferred-sync tag this worker recognizes
  #[serde(default = "default_sync_tag")]
  pub sync_tag: String,
  /// Take control of open clients immediately on activation. Serves the
  /// newest assets at the cost of version skew in already-open tabs.
  #[serde(default = "default_true")]
  pub claim_on_activate: bool,
  #[serde(default)]
  pub notifications: NotificationConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NotificationConfig {
  #[serde(default = "default_title")]
  pub title: String,
  /// Body used when a push event carries no payload
  #[serde(default = "default_body")]
  pub default_body: String,
  #[serde(default = "default_icon")]
  pub icon: String,
  #[serde(default = "default_badge")]
  pub badge: String,
}

impl Default for NotificationConfig {
  fn default() -> Self {
    Self {
      title: default_title(),
      default_body: default_body(),
      icon: default_icon(),
      badge: default_badge(),
    }
  }
}

fn default_sync_tag() -> String {
  "sync-complaints".to_string()
}

fn default_true() -> bool {
  true
}

fn default_title() -> String {
  "PathPatrol".to_string()
}

fn default_body() -> String {
  "New update available".to_string()
}

fn default_icon() -> String {
  "/static/icons/icon-192x192.png".to_string()
}

fn default_badge() -> String {
  "/static/icons/icon-72x72.png".to_string()
}

impl Config {
  /// Load configuration from file.
  ///
  /// Search order:
  /// 1. Explicit path if provided
  /// 2. ./pathpatrol-worker.yaml (current directory)
  /// 3. $XDG_CONFIG_HOME/pathpatrol/worker.yaml
  pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
    let path = if let Some(p) = explicit_path {
      if p.exists() {
        Some(p.to_path_buf())
      } else {
        return Err(eyre!("Config file not found: {}", p.display()));
      }
    } else {
      Self::find_config_file()
    };

    match path {
      Some(p) => Self::load_from_path(&p),
      None => Err(eyre!(
        "No configuration file found. Create one at ~/.config/pathpatrol/worker.yaml"
      )),
    }
  }

  fn find_config_file() -> Option<PathBuf> {
    // Check current directory
    let local = PathBuf::from("pathpatrol-worker.yaml");
    if local.exists() {
      return Some(local);
    }

    // Check XDG config directory
    if let Some(config_dir) = dirs::config_dir() {
      let xdg_path = config_dir.join("pathpatrol").join("worker.yaml");
      if xdg_path.exists() {
        return Some(xdg_path);
      }
    }

    None
  }

  fn load_from_path(path: &Path) -> Result<Self> {
    let contents = std::fs::read_to_string(path)
      .map_err(|e| eyre!("Failed to read config file {}: {}", path.display(), e))?;

    let config: Config = serde_yaml::from_str(&contents)
      .map_err(|e| eyre!("Failed to parse config file {}: {}", path.display(), e))?;

    config.validate()?;
    Ok(config)
  }

  /// Reject configurations the worker cannot honor at runtime.
  pub fn validate(&self) -> Result<()> {
    if self.cache_name.is_empty() {
      return Err(eyre!("cache_name must not be empty"));
    }

    self.origin_url()?;

    if self.precache.is_empty() {
      return Err(eyre!("precache must list at least the offline fallback"));
    }

    if !self.precache.contains(&self.offline_fallback) {
      return Err(eyre!(
        "offline_fallback {} must be part of the precache list",
        self.offline_fallback
      ));
    }

    Ok(())
  }

  /// The configured origin as a parsed URL.
  pub fn origin_url(&self) -> Result<Url> {
    Url::parse(&self.origin).map_err(|e| eyre!("Invalid origin {}: {}", self.origin, e))
  }
}
