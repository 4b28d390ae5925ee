//! Push notification construction, presentation, and click handling.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use color_eyre::Result;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::NotificationConfig;

pub const ACTION_VIEW: &str = "view";
pub const ACTION_CLOSE: &str = "close";

/// Vibration pattern for every notification: buzz, pause, buzz (ms).
const VIBRATE_PATTERN: [u32; 3] = [100, 50, 100];

/// Metadata attached to every notification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationData {
  /// Receipt timestamp of the push event
  pub date_of_arrival: DateTime<Utc>,
  /// Static identifier, always 1
  pub primary_key: u32,
}

/// A named button on a notification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationAction {
  pub action: String,
  pub title: String,
  pub icon: String,
}

/// A notification built from one push event; never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
  pub title: String,
  pub body: String,
  pub icon: String,
  pub badge: String,
  pub vibrate: Vec<u32>,
  pub data: NotificationData,
  pub actions: Vec<NotificationAction>,
}

impl Notification {
  /// Build a notification from an optional push payload. The payload text
  /// becomes the body; without one, the configured default is used.
  pub fn from_push(config: &NotificationConfig, payload: Option<&str>) -> Self {
    Self {
      title: config.title.clone(),
      body: payload.unwrap_or(&config.default_body).to_string(),
      icon: config.icon.clone(),
      badge: config.badge.clone(),
      vibrate: VIBRATE_PATTERN.to_vec(),
      data: NotificationData {
        date_of_arrival: Utc::now(),
        primary_key: 1,
      },
      actions: vec![
        NotificationAction {
          action: ACTION_VIEW.to_string(),
          title: "View".to_string(),
          icon: config.badge.clone(),
        },
        NotificationAction {
          action: ACTION_CLOSE.to_string(),
          title: "Close".to_string(),
          icon: config.badge.clone(),
        },
      ],
    }
  }
}

/// Host surface the presenter drives: showing and dismissing notifications
/// and opening application windows.
#[async_trait]
pub trait NotificationGateway: Send + Sync {
  async fn show(&self, notification: &Notification) -> Result<()>;

  /// Dismiss the notification the user interacted with.
  async fn dismiss(&self) -> Result<()>;

  /// Open a window at the given application path.
  async fn open_window(&self, path: &str) -> Result<()>;
}

/// Handle user interaction with a presented notification.
///
/// The notification is always dismissed first. A `view` action or a plain
/// tap opens the application root; `close` (or anything else) does nothing
/// further.
pub async fn handle_click(gateway: &dyn NotificationGateway, action: Option<&str>) -> Result<()> {
  gateway.dismiss().await?;

  match action {
    None | Some(ACTION_VIEW) => gateway.open_window("/").await,
    Some(other) => {
      debug!(action = %other, "no further action for notification click");
      Ok(())
    }
  }
}
