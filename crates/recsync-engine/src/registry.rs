//! Per-target singleton instance registry.
//!
//! At most one live orchestrator exists per instance key. Starting a target
//! that is already running is reported as a distinct, non-error outcome so
//! schedulers can blindly re-submit targets on every tick. Total concurrency
//! is bounded by a semaphore sized at construction.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use thiserror::Error;
use tokio::sync::{watch, Semaphore};
use tokio::task::JoinHandle;
use tracing::{info, instrument, warn};

use recsync_core::config::SyncSettings;
use recsync_core::error::SyncError;
use recsync_core::record::Cursor;
use recsync_core::target::{InstanceKey, SyncTarget};
use recsync_core::traits::{CursorStore, DestinationSink, SourceFetcher};

use crate::orchestrator::Orchestrator;
use crate::signal::{OverrideMailbox, StopSignal};
use crate::status::InstanceState;

/// Errors starting a sync instance.
///
/// A duplicate start is not an error; see [`StartOutcome::AlreadyRunning`].
#[derive(Debug, Error)]
pub enum StartError {
    /// All concurrency slots are occupied.
    #[error("Sync capacity exhausted: {limit} instances already running")]
    CapacityExhausted {
        /// Configured instance limit.
        limit: usize,
    },

    /// The supplied settings failed validation.
    #[error("Invalid sync settings: {0}")]
    InvalidSettings(String),
}

/// Result of a start request.
#[derive(Debug)]
pub enum StartOutcome {
    /// A new instance was launched.
    Started(InstanceHandle),
    /// A live instance already exists for this target; nothing was launched.
    AlreadyRunning,
}

/// External handle to one running instance.
///
/// Dropping the handle does not stop the instance; the registry keeps its
/// signal channels alive until the instance finishes.
#[derive(Debug)]
pub struct InstanceHandle {
    key: InstanceKey,
    target: SyncTarget,
    mailbox: OverrideMailbox,
    stop: StopSignal,
    state: watch::Receiver<InstanceState>,
    join: JoinHandle<Result<(), SyncError>>,
}

impl InstanceHandle {
    /// The instance key this handle controls.
    #[must_use]
    pub fn key(&self) -> &InstanceKey {
        &self.key
    }

    /// The target being synced.
    #[must_use]
    pub fn target(&self) -> SyncTarget {
        self.target
    }

    /// Post a cursor override; latest-wins, consumed at the next checkpoint.
    pub fn update_cursor(&self, cursor: Cursor) {
        self.mailbox.post(cursor);
    }

    /// Request graceful cancellation.
    pub fn stop(&self) {
        self.stop.stop();
    }

    /// Snapshot of the current lifecycle state.
    #[must_use]
    pub fn state(&self) -> InstanceState {
        self.state.borrow().clone()
    }

    /// Subscribe to lifecycle state changes.
    #[must_use]
    pub fn watch_state(&self) -> watch::Receiver<InstanceState> {
        self.state.clone()
    }

    /// Wait for the instance to finish.
    ///
    /// Returns `Ok(())` on graceful stop, the terminal error otherwise.
    pub async fn wait(self) -> Result<(), SyncError> {
        match self.join.await {
            Ok(result) => result,
            Err(err) => Err(SyncError::unknown(format!("sync task panicked: {err}"))),
        }
    }
}

struct InstanceEntry {
    mailbox: OverrideMailbox,
    stop: StopSignal,
    state: watch::Receiver<InstanceState>,
}

impl InstanceEntry {
    fn is_finished(&self) -> bool {
        // A closed channel means the task is gone without publishing a
        // terminal state (a collaborator panicked); the key must still be
        // restartable.
        self.state.has_changed().is_err() || self.state.borrow().is_terminal()
    }
}

/// Launches and tracks orchestrator instances.
pub struct SyncRegistry {
    fetcher: Arc<dyn SourceFetcher>,
    sink: Arc<dyn DestinationSink>,
    store: Arc<dyn CursorStore>,
    limit: usize,
    slots: Arc<Semaphore>,
    instances: Mutex<HashMap<InstanceKey, InstanceEntry>>,
}

impl SyncRegistry {
    /// Create a registry running at most `max_instances` syncs at once.
    pub fn new(
        fetcher: Arc<dyn SourceFetcher>,
        sink: Arc<dyn DestinationSink>,
        store: Arc<dyn CursorStore>,
        max_instances: usize,
    ) -> Self {
        Self {
            fetcher,
            sink,
            store,
            limit: max_instances,
            slots: Arc::new(Semaphore::new(max_instances)),
            instances: Mutex::new(HashMap::new()),
        }
    }

    /// Start a sync instance for `target` unless one is already live.
    ///
    /// `initial_cursor` seeds the loop directly; when absent the instance
    /// reads its starting cursor from the store.
    #[instrument(skip(self, settings, initial_cursor), fields(key = %target.instance_key()))]
    pub fn start(
        &self,
        target: SyncTarget,
        settings: SyncSettings,
        initial_cursor: Option<Cursor>,
    ) -> Result<StartOutcome, StartError> {
        settings.validate().map_err(StartError::InvalidSettings)?;
        let key = target.instance_key();

        let mut instances = self.instances.lock().unwrap_or_else(|e| e.into_inner());
        instances.retain(|_, entry| !entry.is_finished());

        if instances.contains_key(&key) {
            info!(sync_target = %target, "sync already running, skipping start");
            return Ok(StartOutcome::AlreadyRunning);
        }

        let permit = Arc::clone(&self.slots)
            .try_acquire_owned()
            .map_err(|_| StartError::CapacityExhausted { limit: self.limit })?;

        let mut orchestrator = Orchestrator::new(
            target,
            settings,
            Arc::clone(&self.fetcher),
            Arc::clone(&self.sink),
            Arc::clone(&self.store),
        );
        if let Some(cursor) = initial_cursor {
            orchestrator = orchestrator.with_initial_cursor(cursor);
        }

        let mailbox = orchestrator.mailbox();
        let stop = orchestrator.stop_signal();
        let state = orchestrator.state();
        instances.insert(
            key.clone(),
            InstanceEntry {
                mailbox: mailbox.clone(),
                stop: stop.clone(),
                state: state.clone(),
            },
        );
        drop(instances);

        info!(sync_target = %target, "launching sync instance");
        let join = tokio::spawn(async move {
            let result = orchestrator.run().await;
            drop(permit);
            result
        });

        Ok(StartOutcome::Started(InstanceHandle {
            key,
            target,
            mailbox,
            stop,
            state,
            join,
        }))
    }

    /// Post a cursor override to the live instance for `target`.
    ///
    /// Returns false when no live instance exists; the override is dropped,
    /// not queued for a future instance.
    pub fn update_cursor(&self, target: &SyncTarget, cursor: Cursor) -> bool {
        let instances = self.instances.lock().unwrap_or_else(|e| e.into_inner());
        match instances.get(&target.instance_key()) {
            Some(entry) if !entry.is_finished() => {
                entry.mailbox.post(cursor);
                true
            }
            _ => {
                warn!(sync_target = %target, "cursor override dropped, no live instance");
                false
            }
        }
    }

    /// Request graceful cancellation of the live instance for `target`.
    ///
    /// Returns false when no live instance exists.
    pub fn stop(&self, target: &SyncTarget) -> bool {
        let instances = self.instances.lock().unwrap_or_else(|e| e.into_inner());
        match instances.get(&target.instance_key()) {
            Some(entry) if !entry.is_finished() => {
                entry.stop.stop();
                true
            }
            _ => false,
        }
    }

    /// Request cancellation of every live instance.
    pub fn stop_all(&self) {
        let instances = self.instances.lock().unwrap_or_else(|e| e.into_inner());
        for entry in instances.values() {
            entry.stop.stop();
        }
    }

    /// Snapshot of the lifecycle state for `target`, if tracked.
    #[must_use]
    pub fn state(&self, target: &SyncTarget) -> Option<InstanceState> {
        let instances = self.instances.lock().unwrap_or_else(|e| e.into_inner());
        instances
            .get(&target.instance_key())
            .map(|entry| entry.state.borrow().clone())
    }

    /// Whether a live instance exists for `target`.
    #[must_use]
    pub fn is_running(&self, target: &SyncTarget) -> bool {
        let instances = self.instances.lock().unwrap_or_else(|e| e.into_inner());
        instances
            .get(&target.instance_key())
            .is_some_and(|entry| !entry.is_finished())
    }

    /// Number of live instances.
    #[must_use]
    pub fn running_count(&self) -> usize {
        let instances = self.instances.lock().unwrap_or_else(|e| e.into_inner());
        instances
            .values()
            .filter(|entry| !entry.is_finished())
            .count()
    }
}

impl std::fmt::Debug for SyncRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyncRegistry")
            .field("limit", &self.limit)
            .field("running", &self.running_count())
            .finish()
    }
}
