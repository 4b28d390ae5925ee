//! Deferred synchronization of complaint submissions captured offline.

use async_trait::async_trait;
use color_eyre::Result;
use tracing::{debug, info};

/// The application's offline-submission queue. Reading queued complaints
/// and replaying them against the backend happens behind this trait.
#[async_trait]
pub trait ComplaintOutbox: Send + Sync {
  /// Replay queued offline submissions against the backend.
  async fn resync(&self) -> Result<()>;
}

/// Routes deferred-sync triggers to the outbox.
pub struct SyncDispatcher {
  tag: String,
}

impl SyncDispatcher {
  pub fn new(tag: impl Into<String>) -> Self {
    Self { tag: tag.into() }
  }

  /// Handle one sync trigger. The recognized tag awaits the outbox so the
  /// host only marks the event complete once the resync settled (and can
  /// retry it on failure); every other tag is a silent no-op.
  pub async fn handle(&self, tag: &str, outbox: &dyn ComplaintOutbox) -> Result<()> {
    if tag != self.tag {
      debug!(tag = %tag, "ignoring unrecognized sync tag");
      return Ok(());
    }

    info!(tag = %tag, "resyncing offline complaint submissions");
    outbox.resync().await
  }
}
