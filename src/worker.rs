//! The offline worker controller.
//!
//! Ties the lifecycle manager, request router, notification presenter, and
//! sync dispatcher together behind a single event dispatch table, driven by
//! the host's event loop. Detached side effects (opportunistic cache
//! writes) are tracked so the host's extend-lifetime contract can await
//! them before tearing the worker down.

use color_eyre::Result;
use serde_json::Value;
use std::sync::Arc;
use tokio::task::JoinSet;
use tracing::{debug, warn};

use crate::config::Config;
use crate::event::{EventHandler, WorkerEvent, MSG_SKIP_WAITING};
use crate::fetch::Network;
use crate::lifecycle::{Lifecycle, Phase};
use crate::notify::{self, Notification, NotificationGateway};
use crate::router::Router;
use crate::store::CacheStore;
use crate::sync::{ComplaintOutbox, SyncDispatcher};

/// The controller reacting to host events.
pub struct Worker {
  config: Config,
  lifecycle: Lifecycle,
  router: Router,
  sync: SyncDispatcher,
  store: Arc<dyn CacheStore>,
  network: Arc<dyn Network>,
  gateway: Arc<dyn NotificationGateway>,
  outbox: Arc<dyn ComplaintOutbox>,
  /// Detached side effects still owed to the extend-lifetime contract
  pending: JoinSet<()>,
}

impl Worker {
  pub fn new(
    config: Config,
    store: Arc<dyn CacheStore>,
    network: Arc<dyn Network>,
    gateway: Arc<dyn NotificationGateway>,
    outbox: Arc<dyn ComplaintOutbox>,
  ) -> Result<Self> {
    config.validate()?;
    let router = Router::new(&config)?;
    let sync = SyncDispatcher::new(config.sync_tag.clone());

    Ok(Self {
      config,
      lifecycle: Lifecycle::new(),
      router,
      sync,
      store,
      network,
      gateway,
      outbox,
      pending: JoinSet::new(),
    })
  }

  pub fn phase(&self) -> Phase {
    self.lifecycle.phase()
  }

  /// Dispatch one host event to its handler. The handler's completion is
  /// the event's completion signal.
  pub async fn handle_event(&mut self, event: WorkerEvent) -> Result<()> {
    match event {
      WorkerEvent::Install => {
        self
          .lifecycle
          .install(&self.config, self.network.as_ref(), self.store.as_ref())
          .await
      }
      WorkerEvent::Activate => self.lifecycle.activate(&self.config, self.store.as_ref()).await,
      WorkerEvent::Fetch {
        request,
        respond_to,
      } => {
        let outcome = self
          .router
          .route(
            request,
            Arc::clone(&self.store),
            Arc::clone(&self.network),
            &mut self.pending,
          )
          .await;
        // The client may have navigated away; its loss is not ours
        let _ = respond_to.send(outcome);
        Ok(())
      }
      WorkerEvent::Push { payload } => self.handle_push(payload.as_deref()).await,
      WorkerEvent::NotificationClick { action } => {
        notify::handle_click(self.gateway.as_ref(), action.as_deref()).await
      }
      WorkerEvent::Sync { tag } => self.sync.handle(&tag, self.outbox.as_ref()).await,
      WorkerEvent::Message { payload } => {
        self.handle_message(&payload);
        Ok(())
      }
    }
  }

  /// Present a push payload; awaited so the host keeps the worker alive
  /// until the notification is actually on screen.
  async fn handle_push(&self, payload: Option<&str>) -> Result<()> {
    let notification = Notification::from_push(&self.config.notifications, payload);
    self.gateway.show(&notification).await
  }

  fn handle_message(&mut self, payload: &Value) {
    match payload.get("type").and_then(Value::as_str) {
      Some(MSG_SKIP_WAITING) => self.lifecycle.request_skip_waiting(),
      _ => debug!("ignoring unrecognized control message"),
    }
  }

  /// Await every detached side effect (the extend-lifetime contract).
  pub async fn settle(&mut self) {
    while let Some(result) = self.pending.join_next().await {
      if let Err(error) = result {
        warn!(%error, "detached task failed");
      }
    }
  }

  /// Drive the worker from the host event channel until it closes, then
  /// settle outstanding work.
  pub async fn run(&mut self, events: &mut EventHandler) -> Result<()> {
    while let Some(event) = events.next().await {
      if let Err(error) = self.handle_event(event).await {
        warn!(%error, "event handler failed");
      }
    }
    self.settle().await;
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::event;
  use crate::fetch::Request;
  use crate::router::{FetchOutcome, ServedFrom};
  use crate::store::MemoryStore;
  use crate::testutil::{basic_response, test_config, FakeGateway, FakeNetwork, FakeOutbox};
  use serde_json::json;

  struct Fixture {
    worker: Worker,
    store: Arc<MemoryStore>,
    network: Arc<FakeNetwork>,
    gateway: Arc<FakeGateway>,
    outbox: Arc<FakeOutbox>,
  }

  impl Fixture {
    fn new() -> Self {
      Self::with_gateway(FakeGateway::new())
    }

    fn with_gateway(gateway: FakeGateway) -> Self {
      let config = test_config();
      let store = Arc::new(MemoryStore::new());
      let network = Arc::new(FakeNetwork::new());
      let gateway = Arc::new(gateway);
      let outbox = Arc::new(FakeOutbox::new());
      for path in &config.precache {
        network.on(path, basic_response(path, format!("shell {}", path).as_bytes()));
      }

      let worker = Worker::new(
        config,
        Arc::clone(&store) as Arc<dyn CacheStore>,
        Arc::clone(&network) as Arc<dyn Network>,
        Arc::clone(&gateway) as Arc<dyn NotificationGateway>,
        Arc::clone(&outbox) as Arc<dyn ComplaintOutbox>,
      )
      .unwrap();

      Self {
        worker,
        store,
        network,
        gateway,
        outbox,
      }
    }

    async fn fetch(&mut self, request: Request) -> Result<FetchOutcome> {
      let (event, rx) = WorkerEvent::fetch(request);
      self.worker.handle_event(event).await.unwrap();
      rx.await.unwrap()
    }
  }

  #[tokio::test]
  async fn install_then_activate_serves_the_shell_offline() {
    let mut fx = Fixture::new();

    fx.worker.handle_event(WorkerEvent::Install).await.unwrap();
    assert_eq!(fx.worker.phase(), Phase::Installed);

    fx.worker.handle_event(WorkerEvent::Activate).await.unwrap();
    assert_eq!(fx.worker.phase(), Phase::Active);

    // Simulated disconnect: the shell still resolves from the store
    for path in &test_config().precache {
      fx.network.disconnect(path);
    }
    let outcome = fx.fetch(Request::navigate("/")).await.unwrap();
    match outcome {
      FetchOutcome::Served { response, source } => {
        assert_eq!(source, ServedFrom::Cache);
        assert_eq!(response.body, b"shell /");
      }
      FetchOutcome::PassThrough => panic!("expected a served response"),
    }
  }

  #[tokio::test]
  async fn activation_retires_older_stores() {
    let mut fx = Fixture::new();
    fx.store.create_store("pathpatrol-v0.9.0").await.unwrap();

    fx.worker.handle_event(WorkerEvent::Install).await.unwrap();
    fx.worker.handle_event(WorkerEvent::Activate).await.unwrap();

    assert_eq!(
      fx.store.list_stores().await.unwrap(),
      vec!["pathpatrol-v1.0.0".to_string()]
    );
  }

  #[tokio::test]
  async fn push_presents_a_notification_with_the_payload() {
    let mut fx = Fixture::new();

    fx.worker
      .handle_event(WorkerEvent::Push {
        payload: Some("Road hazard reported".to_string()),
      })
      .await
      .unwrap();

    let shown = fx.gateway.shown.lock().unwrap();
    assert_eq!(shown.len(), 1);
    assert_eq!(shown[0].body, "Road hazard reported");
  }

  #[tokio::test]
  async fn failed_presentation_fails_the_push_event() {
    let mut fx = Fixture::with_gateway(FakeGateway::failing());

    let result = fx
      .worker
      .handle_event(WorkerEvent::Push { payload: None })
      .await;
    assert!(result.is_err());
  }

  #[tokio::test]
  async fn sync_event_awaits_the_outbox() {
    let mut fx = Fixture::new();

    fx.worker
      .handle_event(WorkerEvent::Sync {
        tag: "sync-complaints".to_string(),
      })
      .await
      .unwrap();
    assert_eq!(fx.outbox.resync_count(), 1);

    fx.worker
      .handle_event(WorkerEvent::Sync {
        tag: "other-tag".to_string(),
      })
      .await
      .unwrap();
    assert_eq!(fx.outbox.resync_count(), 1);
  }

  #[tokio::test]
  async fn skip_waiting_message_forces_supersession() {
    let mut fx = Fixture::new();

    fx.worker
      .handle_event(WorkerEvent::Message {
        payload: json!({"type": "SKIP_WAITING"}),
      })
      .await
      .unwrap();

    assert!(fx.worker.lifecycle.skip_waiting_requested());
  }

  #[tokio::test]
  async fn unrecognized_messages_are_ignored() {
    let mut fx = Fixture::new();

    fx.worker
      .handle_event(WorkerEvent::Message {
        payload: json!({"type": "REFRESH"}),
      })
      .await
      .unwrap();
    fx.worker
      .handle_event(WorkerEvent::Message {
        payload: json!("not even an object"),
      })
      .await
      .unwrap();

    assert!(!fx.worker.lifecycle.skip_waiting_requested());
  }

  #[tokio::test]
  async fn run_drains_the_host_channel_and_settles() {
    let fx = Fixture::new();
    let mut worker = fx.worker;
    let (tx, mut events) = event::channel();

    let driver = tokio::spawn(async move {
      worker.run(&mut events).await.unwrap();
      worker
    });

    tx.send(WorkerEvent::Install).unwrap();
    tx.send(WorkerEvent::Activate).unwrap();
    let (fetch, rx) = WorkerEvent::fetch(Request::get("/"));
    tx.send(fetch).unwrap();
    drop(tx);

    let outcome = rx.await.unwrap().unwrap();
    assert!(matches!(
      outcome,
      FetchOutcome::Served {
        source: ServedFrom::Cache,
        ..
      }
    ));

    let worker = driver.await.unwrap();
    assert_eq!(worker.phase(), Phase::Active);
  }

  #[tokio::test]
  async fn handler_failure_does_not_stop_the_loop() {
    let fx = Fixture::new();
    // No routes at all: install will fail
    for path in &test_config().precache {
      fx.network.disconnect(path);
    }
    let mut worker = fx.worker;
    let (tx, mut events) = event::channel();

    let driver = tokio::spawn(async move {
      worker.run(&mut events).await.unwrap();
      worker
    });

    tx.send(WorkerEvent::Install).unwrap();
    tx.send(WorkerEvent::Sync {
      tag: "sync-complaints".to_string(),
    })
    .unwrap();
    drop(tx);

    let worker = driver.await.unwrap();
    assert_eq!(worker.phase(), Phase::Idle);
    assert_eq!(fx.outbox.resync_count(), 1);
  }
}
