//! Fake collaborators shared by the unit tests: a programmable network, a
//! recording notification gateway, and a counting sync outbox.

use async_trait::async_trait;
use color_eyre::{eyre::eyre, Result};
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use crate::config::Config;
use crate::fetch::{Network, Request, Response, ResponseKind};
use crate::notify::{Notification, NotificationGateway};
use crate::sync::ComplaintOutbox;

pub(crate) fn test_config() -> Config {
  Config {
    cache_name: "pathpatrol-v1.0.0".to_string(),
    origin: "https://pathpatrol.example".to_string(),
    precache: vec![
      "/".to_string(),
      "/offline.html".to_string(),
      "/static/manifest.json".to_string(),
      "/static/icons/icon-192x192.png".to_string(),
      "/static/icons/icon-512x512.png".to_string(),
    ],
    offline_fallback: "/offline.html".to_string(),
    sync_tag: "sync-complaints".to_string(),
    claim_on_activate: true,
    notifications: Default::default(),
  }
}

pub(crate) fn basic_response(url: &str, body: &[u8]) -> Response {
  Response {
    status: 200,
    headers: BTreeMap::new(),
    body: body.to_vec(),
    url: url.to_string(),
    kind: ResponseKind::Basic,
  }
}

pub(crate) fn status_response(url: &str, status: u16) -> Response {
  Response {
    status,
    ..basic_response(url, b"")
  }
}

pub(crate) fn opaque_response(url: &str, body: &[u8]) -> Response {
  Response {
    kind: ResponseKind::Opaque,
    ..basic_response(url, body)
  }
}

/// Programmable network: requests to unknown URLs fail like a disconnect.
#[derive(Default)]
pub(crate) struct FakeNetwork {
  routes: Mutex<HashMap<String, Response>>,
  calls: Mutex<Vec<String>>,
}

impl FakeNetwork {
  pub fn new() -> Self {
    Self::default()
  }

  /// Serve `response` for requests to `url`.
  pub fn on(&self, url: &str, response: Response) {
    self.routes.lock().unwrap().insert(url.to_string(), response);
  }

  /// Drop the route so requests to `url` fail again.
  pub fn disconnect(&self, url: &str) {
    self.routes.lock().unwrap().remove(url);
  }

  pub fn call_count(&self) -> usize {
    self.calls.lock().unwrap().len()
  }
}

#[async_trait]
impl Network for FakeNetwork {
  async fn fetch(&self, request: &Request) -> Result<Response> {
    self.calls.lock().unwrap().push(request.url.clone());
    self
      .routes
      .lock()
      .unwrap()
      .get(&request.url)
      .cloned()
      .ok_or_else(|| eyre!("connection refused: {}", request.url))
  }
}

/// Records every presentation, dismissal, and window open.
#[derive(Default)]
pub(crate) struct FakeGateway {
  pub shown: Mutex<Vec<Notification>>,
  pub dismissals: AtomicUsize,
  pub opened: Mutex<Vec<String>>,
  pub fail_show: bool,
}

impl FakeGateway {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn failing() -> Self {
    Self {
      fail_show: true,
      ..Self::default()
    }
  }
}

#[async_trait]
impl NotificationGateway for FakeGateway {
  async fn show(&self, notification: &Notification) -> Result<()> {
    if self.fail_show {
      return Err(eyre!("presentation rejected by host"));
    }
    self.shown.lock().unwrap().push(notification.clone());
    Ok(())
  }

  async fn dismiss(&self) -> Result<()> {
    self.dismissals.fetch_add(1, Ordering::SeqCst);
    Ok(())
  }

  async fn open_window(&self, path: &str) -> Result<()> {
    self.opened.lock().unwrap().push(path.to_string());
    Ok(())
  }
}

/// Counts resync invocations, optionally failing them.
#[derive(Default)]
pub(crate) struct FakeOutbox {
  pub resyncs: AtomicUsize,
  pub fail: bool,
}

impl FakeOutbox {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn failing() -> Self {
    Self {
      fail: true,
      ..Self::default()
    }
  }

  pub fn resync_count(&self) -> usize {
    self.resyncs.load(Ordering::SeqCst)
  }
}

#[async_trait]
impl ComplaintOutbox for FakeOutbox {
  async fn resync(&self) -> Result<()> {
    self.resyncs.fetch_add(1, Ordering::SeqCst);
    if self.fail {
      return Err(eyre!("backend unreachable"));
    }
    Ok(())
  }
}
