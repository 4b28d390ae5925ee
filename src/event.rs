//! Host event contract and the channel driver feeding the worker.

use color_eyre::Result;
use serde_json::Value;
use tokio::sync::{mpsc, oneshot};

use crate::fetch::Request;
use crate::router::FetchOutcome;

/// Control message type that forces immediate version takeover.
pub const MSG_SKIP_WAITING: &str = "SKIP_WAITING";

/// Events the host dispatches into the worker. The worker only reacts to
/// these; it never initiates work on its own.
pub enum WorkerEvent {
  Install,
  Activate,
  /// Intercepted resource request; the outcome is sent back on `respond_to`
  Fetch {
    request: Request,
    respond_to: oneshot::Sender<Result<FetchOutcome>>,
  },
  /// Inbound push with an optional text payload
  Push { payload: Option<String> },
  /// User interaction with a presented notification
  NotificationClick { action: Option<String> },
  /// Deferred-sync trigger raised once connectivity is restored
  Sync { tag: String },
  /// Structured control message from a client
  Message { payload: Value },
}

impl WorkerEvent {
  /// Build a fetch event plus the receiver for its outcome.
  pub fn fetch(request: Request) -> (Self, oneshot::Receiver<Result<FetchOutcome>>) {
    let (tx, rx) = oneshot::channel();
    (
      WorkerEvent::Fetch {
        request,
        respond_to: tx,
      },
      rx,
    )
  }
}

/// Receiving half of the host event channel.
///
/// The worker loop ends once every sender is dropped.
pub struct EventHandler {
  rx: mpsc::UnboundedReceiver<WorkerEvent>,
}

/// Create the host event channel: the sender side stays with the host, the
/// handler drives the worker.
pub fn channel() -> (mpsc::UnboundedSender<WorkerEvent>, EventHandler) {
  let (tx, rx) = mpsc::unbounded_channel();
  (tx, EventHandler { rx })
}

impl EventHandler {
  /// Receive the next event.
  pub async fn next(&mut self) -> Option<WorkerEvent> {
    self.rx.recv().await
  }
}
