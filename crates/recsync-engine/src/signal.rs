//! Cursor override signaling.
//!
//! A single-slot, latest-wins mailbox. Senders may post at any time;
//! the orchestrator consumes only at well-defined checkpoints (entry to
//! `Paginating` or `Draining`), so an override can never tear an in-flight
//! fetch/sync pair. Multiple posts between checkpoints coalesce: only the
//! most recent cursor is retained.

use std::sync::{Arc, Mutex};
use tokio::sync::Notify;

use recsync_core::record::Cursor;

/// Shared handle to an instance's override mailbox.
#[derive(Debug, Clone, Default)]
pub struct OverrideMailbox {
    inner: Arc<MailboxInner>,
}

#[derive(Debug, Default)]
struct MailboxInner {
    slot: Mutex<Option<Cursor>>,
    notify: Notify,
}

impl OverrideMailbox {
    /// Create an empty mailbox.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Post a cursor override, replacing any unconsumed one.
    ///
    /// Fire-and-forget: there is no acknowledgement. A permit is stored so
    /// a drain sleep that starts after this post still wakes promptly.
    pub fn post(&self, cursor: Cursor) {
        let mut slot = self.inner.slot.lock().unwrap_or_else(|e| e.into_inner());
        *slot = Some(cursor);
        drop(slot);
        self.inner.notify.notify_one();
    }

    /// Consume the pending override, if any.
    pub fn take(&self) -> Option<Cursor> {
        self.inner
            .slot
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .take()
    }

    /// Whether an override is pending.
    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.inner
            .slot
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .is_some()
    }

    /// Wait until a post arrives.
    ///
    /// May complete spuriously if a post was already consumed through
    /// [`take`](Self::take); callers must re-check the slot.
    pub async fn notified(&self) {
        self.inner.notify.notified().await;
    }
}

/// Cooperative cancellation flag.
///
/// Cloned into both the orchestrator and its external handle. Once tripped
/// it never resets; the orchestrator observes it at suspension points only.
#[derive(Debug, Clone)]
pub struct StopSignal {
    tx: Arc<tokio::sync::watch::Sender<bool>>,
}

impl Default for StopSignal {
    fn default() -> Self {
        Self::new()
    }
}

impl StopSignal {
    /// Create an untripped signal.
    #[must_use]
    pub fn new() -> Self {
        let (tx, _) = tokio::sync::watch::channel(false);
        Self { tx: Arc::new(tx) }
    }

    /// Request cancellation. Idempotent.
    pub fn stop(&self) {
        self.tx.send_replace(true);
    }

    /// Whether cancellation has been requested.
    #[must_use]
    pub fn is_stopped(&self) -> bool {
        *self.tx.borrow()
    }

    /// Wait until cancellation is requested. Completes immediately if it
    /// already was.
    pub async fn stopped(&self) {
        let mut rx = self.tx.subscribe();
        // The sender half lives in self, so this cannot error.
        let _ = rx.wait_for(|stopped| *stopped).await;
    }
}
