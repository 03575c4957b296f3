//! The sync orchestrator state machine.
//!
//! One orchestrator runs per sync target as a single logically sequential
//! loop: fetch a page, push it to the destination, checkpoint the cursor,
//! and on exhaustion sleep until the next poll. The persisted cursor is the
//! only durable state; after a crash a new instance reconstructs itself
//! entirely from the cursor store.
//!
//! Ordering invariant: the cursor for a page is written only after the
//! destination sync for that page has returned success. A crash between
//! sync and checkpoint re-fetches and re-syncs one page (safe, the sink is
//! idempotent); the reverse order could checkpoint records that never
//! landed, which would silently lose data.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tracing::{debug, error, info, instrument, warn};

use recsync_core::config::SyncSettings;
use recsync_core::error::{SyncError, SyncResult};
use recsync_core::record::{Cursor, Page, Record};
use recsync_core::retry::Disposition;
use recsync_core::target::SyncTarget;
use recsync_core::traits::{CursorStore, DestinationSink, SourceFetcher};

use crate::signal::{OverrideMailbox, StopSignal};
use crate::status::InstanceState;

/// Outcome of one orchestrated step after local retry handling.
enum StepOutcome<T> {
    /// The step succeeded.
    Done(T),
    /// Cancellation was requested while waiting; no further calls are made.
    Stopped,
    /// The step failed terminally (non-retryable or attempts exhausted).
    Failed(SyncError),
}

/// The per-target sync state machine.
pub struct Orchestrator {
    target: SyncTarget,
    settings: SyncSettings,
    fetcher: Arc<dyn SourceFetcher>,
    sink: Arc<dyn DestinationSink>,
    store: Arc<dyn CursorStore>,
    mailbox: OverrideMailbox,
    stop: StopSignal,
    status: watch::Sender<InstanceState>,
    initial_cursor: Option<Cursor>,
}

impl Orchestrator {
    /// Create an orchestrator for one target.
    pub fn new(
        target: SyncTarget,
        settings: SyncSettings,
        fetcher: Arc<dyn SourceFetcher>,
        sink: Arc<dyn DestinationSink>,
        store: Arc<dyn CursorStore>,
    ) -> Self {
        let (status, _) = watch::channel(InstanceState::Initializing);
        Self {
            target,
            settings,
            fetcher,
            sink,
            store,
            mailbox: OverrideMailbox::new(),
            stop: StopSignal::new(),
            status,
            initial_cursor: None,
        }
    }

    /// Start from an explicit cursor instead of the stored one.
    #[must_use]
    pub fn with_initial_cursor(mut self, cursor: Cursor) -> Self {
        self.initial_cursor = Some(cursor);
        self
    }

    /// Handle for posting cursor overrides to this instance.
    #[must_use]
    pub fn mailbox(&self) -> OverrideMailbox {
        self.mailbox.clone()
    }

    /// Handle for requesting cancellation.
    ///
    /// Cancellation takes effect at the next suspension point; an in-flight
    /// destination sync is never interrupted.
    #[must_use]
    pub fn stop_signal(&self) -> StopSignal {
        self.stop.clone()
    }

    /// Subscribe to lifecycle state changes.
    #[must_use]
    pub fn state(&self) -> watch::Receiver<InstanceState> {
        self.status.subscribe()
    }

    /// Run the sync loop until cancellation or a terminal failure.
    ///
    /// Returns `Ok(())` on graceful stop; the terminal error otherwise.
    #[instrument(skip(self), fields(key = %self.target.instance_key()))]
    pub async fn run(mut self) -> Result<(), SyncError> {
        self.set_state(InstanceState::Initializing);

        let mut current: Option<Cursor> = match self.initial_cursor.take() {
            Some(cursor) => Some(cursor),
            None => match self.read_cursor_step().await {
                StepOutcome::Done(cursor) => cursor,
                StepOutcome::Stopped => return self.finish_stopped(),
                StepOutcome::Failed(err) => return self.finish_failed(err),
            },
        };
        info!(
            sync_target = %self.target,
            cursor = current.as_ref().map(Cursor::as_str),
            "sync instance starting"
        );

        loop {
            // Overrides are consumed only here and at drain entry/wake,
            // never mid-sync.
            if let Some(cursor) = self.mailbox.take() {
                info!(sync_target = %self.target, cursor = %cursor, "adopting cursor override");
                current = Some(cursor);
            }
            if self.stop.is_stopped() {
                return self.finish_stopped();
            }

            self.set_state(InstanceState::Paginating);
            let page = match self.fetch_step(current.as_ref()).await {
                StepOutcome::Done(page) => page,
                StepOutcome::Stopped => return self.finish_stopped(),
                StepOutcome::Failed(err) => return self.finish_failed(err),
            };

            if page.is_empty() && page.next_cursor.is_none() {
                debug!(sync_target = %self.target, "no records available, draining");
            } else {
                if !page.records.is_empty() {
                    self.set_state(InstanceState::Syncing);
                    match self.sync_step(&page.records).await {
                        StepOutcome::Done(()) => {}
                        StepOutcome::Stopped => return self.finish_stopped(),
                        StepOutcome::Failed(err) => return self.finish_failed(err),
                    }
                }

                match page.next_cursor {
                    Some(next) => {
                        self.set_state(InstanceState::Checkpointing);
                        match self.checkpoint_step(&next).await {
                            StepOutcome::Done(()) => {}
                            StepOutcome::Stopped => return self.finish_stopped(),
                            StepOutcome::Failed(err) => return self.finish_failed(err),
                        }
                        current = Some(next);
                        if page.has_more {
                            continue;
                        }
                    }
                    None => {
                        // Fetcher contract violation. The batch was synced
                        // but not checkpointed, so it is simply re-fetched
                        // and re-synced next cycle.
                        warn!(
                            sync_target = %self.target,
                            records = page.records.len(),
                            "fetcher returned records without a cursor, skipping checkpoint"
                        );
                    }
                }
            }

            self.set_state(InstanceState::Draining);
            if let Some(cursor) = self.mailbox.take() {
                info!(sync_target = %self.target, cursor = %cursor, "adopting cursor override");
                current = Some(cursor);
                continue;
            }
            if self.pause(self.settings.poll_interval(), true).await {
                return self.finish_stopped();
            }
            match self.mailbox.take() {
                Some(cursor) => {
                    info!(sync_target = %self.target, cursor = %cursor, "adopting cursor override");
                    current = Some(cursor);
                }
                None => {
                    // Pick up out-of-band cursor changes before the next cycle.
                    current = match self.read_cursor_step().await {
                        StepOutcome::Done(cursor) => cursor,
                        StepOutcome::Stopped => return self.finish_stopped(),
                        StepOutcome::Failed(err) => return self.finish_failed(err),
                    };
                }
            }
        }
    }

    fn set_state(&self, state: InstanceState) {
        debug!(sync_target = %self.target, state = %state, "state transition");
        self.status.send_replace(state);
    }

    fn finish_stopped(&self) -> Result<(), SyncError> {
        info!(sync_target = %self.target, "sync instance stopped");
        self.set_state(InstanceState::Stopped);
        Ok(())
    }

    fn finish_failed(&self, err: SyncError) -> Result<(), SyncError> {
        error!(
            sync_target = %self.target,
            kind = %err.kind(),
            error = %err,
            "sync instance failed"
        );
        self.set_state(InstanceState::failed(&err));
        Err(err)
    }

    async fn fetch_step(&self, cursor: Option<&Cursor>) -> StepOutcome<Page> {
        let fetcher = Arc::clone(&self.fetcher);
        let target = self.target;
        let limit = self.settings.batch_size;
        let cursor = cursor.cloned();
        self.run_step("fetch", Some(self.settings.fetch_timeout()), move || {
            let fetcher = Arc::clone(&fetcher);
            let cursor = cursor.clone();
            async move { fetcher.fetch(&target, cursor.as_ref(), limit).await }
        })
        .await
    }

    async fn sync_step(&self, records: &[Record]) -> StepOutcome<()> {
        let sink = Arc::clone(&self.sink);
        let target = self.target;
        let records: Arc<[Record]> = records.into();
        self.run_step("sync", Some(self.settings.sync_timeout()), move || {
            let sink = Arc::clone(&sink);
            let records = Arc::clone(&records);
            async move { sink.sync(&target, &records).await }
        })
        .await
    }

    async fn checkpoint_step(&self, cursor: &Cursor) -> StepOutcome<()> {
        let store = Arc::clone(&self.store);
        let target = self.target;
        let cursor = cursor.clone();
        self.run_step("checkpoint", None, move || {
            let store = Arc::clone(&store);
            let cursor = cursor.clone();
            async move { store.set(&target, &cursor).await }
        })
        .await
    }

    async fn read_cursor_step(&self) -> StepOutcome<Option<Cursor>> {
        let store = Arc::clone(&self.store);
        let target = self.target;
        self.run_step("read cursor", None, move || {
            let store = Arc::clone(&store);
            async move { store.get(&target).await }
        })
        .await
    }

    /// Execute one step with local recovery.
    ///
    /// Rate limits wait the fixed cooldown and retry the same call without
    /// consuming an attempt. Retryable failures back off per the policy with
    /// a per-step attempt counter. Non-retryable failures and exhausted
    /// attempts are terminal.
    async fn run_step<T, F, Fut>(
        &self,
        step: &'static str,
        timeout: Option<Duration>,
        mut op: F,
    ) -> StepOutcome<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = SyncResult<T>>,
    {
        let mut attempts: u32 = 0;
        let mut cooldowns: u32 = 0;
        loop {
            if self.stop.is_stopped() {
                return StepOutcome::Stopped;
            }

            let result = match timeout {
                Some(limit) => match tokio::time::timeout(limit, op()).await {
                    Ok(result) => result,
                    Err(_) => Err(SyncError::network(format!(
                        "{step} call exceeded {}s timeout",
                        limit.as_secs()
                    ))),
                },
                None => op().await,
            };

            let err = match result {
                Ok(value) => return StepOutcome::Done(value),
                Err(err) => err,
            };

            match self.settings.retry.classify(err.kind()) {
                Disposition::RateLimit => {
                    cooldowns += 1;
                    if let Some(max) = self.settings.max_rate_limit_waits {
                        if cooldowns > max {
                            warn!(
                                sync_target = %self.target,
                                step,
                                cooldowns,
                                "rate-limit wait budget exhausted"
                            );
                            return StepOutcome::Failed(err);
                        }
                    }
                    let cooldown = self.settings.rate_limit_cooldown();
                    warn!(
                        sync_target = %self.target,
                        step,
                        cooldown_secs = cooldown.as_secs(),
                        "rate limited, cooling down"
                    );
                    if self.pause(cooldown, false).await {
                        return StepOutcome::Stopped;
                    }
                }
                Disposition::NonRetryable => return StepOutcome::Failed(err),
                Disposition::Retryable => {
                    cooldowns = 0;
                    attempts += 1;
                    if !self.settings.retry.should_retry(attempts) {
                        warn!(
                            sync_target = %self.target,
                            step,
                            attempts,
                            error = %err,
                            "attempts exhausted"
                        );
                        return StepOutcome::Failed(err);
                    }
                    let delay = self.settings.retry.backoff_delay(attempts - 1);
                    warn!(
                        sync_target = %self.target,
                        step,
                        attempt = attempts,
                        delay_ms = delay.as_millis() as u64,
                        error = %err,
                        "retrying after failure"
                    );
                    if self.pause(delay, false).await {
                        return StepOutcome::Stopped;
                    }
                }
            }
        }
    }

    /// Sleep, returning early on cancellation or (optionally) an override
    /// post. Returns true when cancellation was requested.
    ///
    /// A stale notify permit from an override that was already consumed at
    /// a previous checkpoint is absorbed by re-checking the slot; only a
    /// pending override cuts the sleep short.
    async fn pause(&self, duration: Duration, wake_on_override: bool) -> bool {
        let mailbox = self.mailbox.clone();
        let stop = self.stop.clone();
        let deadline = tokio::time::Instant::now() + duration;
        loop {
            tokio::select! {
                () = tokio::time::sleep_until(deadline) => break,
                () = mailbox.notified(), if wake_on_override => {
                    if mailbox.is_pending() {
                        break;
                    }
                }
                () = stop.stopped() => break,
            }
        }
        self.stop.is_stopped()
    }
}
