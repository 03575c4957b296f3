//! # recsync engine
//!
//! Durable, resumable synchronization of paginated records.
//!
//! The engine runs one [`orchestrator::Orchestrator`] per sync target. Each
//! instance pulls pages from a [`recsync_core::traits::SourceFetcher`],
//! pushes them through an idempotent
//! [`recsync_core::traits::DestinationSink`], and checkpoints its position
//! in a [`recsync_core::traits::CursorStore`] only after the push succeeds.
//! A crashed instance loses at most one uncheckpointed page, which the
//! idempotent sink absorbs on re-sync.
//!
//! The [`registry::SyncRegistry`] enforces a single live instance per
//! target and bounds total concurrency; the [`signal::OverrideMailbox`]
//! lets operators reposition a running instance without restarting it.
//!
//! ## Crate Organization
//!
//! - [`orchestrator`] - The per-target sync state machine
//! - [`registry`] - Singleton enforcement and instance handles
//! - [`signal`] - Cursor override mailbox and cancellation
//! - [`status`] - Published lifecycle states
//! - [`store`] - Cursor store implementations (memory, Postgres)

pub mod orchestrator;
pub mod registry;
pub mod signal;
pub mod status;
pub mod store;

/// Prelude module for convenient imports.
///
/// ```
/// use recsync_engine::prelude::*;
/// ```
pub mod prelude {
    pub use crate::orchestrator::Orchestrator;
    pub use crate::registry::{InstanceHandle, StartError, StartOutcome, SyncRegistry};
    pub use crate::signal::{OverrideMailbox, StopSignal};
    pub use crate::status::InstanceState;
    pub use crate::store::{MemoryCursorStore, PgCursorStore};

    pub use recsync_core::prelude::*;
}
