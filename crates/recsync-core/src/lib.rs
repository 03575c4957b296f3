//! # recsync core
//!
//! Leaf types and consumed interfaces for the recsync orchestrator.
//!
//! This crate defines everything the sync engine composes but does not
//! implement itself: identifiers, targets, cursors and pages, the shared
//! error taxonomy, the retry policy engine, and the collaborator traits
//! (source fetcher, destination sink, cursor store).
//!
//! ## Crate Organization
//!
//! - [`ids`] - Type-safe identifiers (`SourceId`, `AccountId`)
//! - [`target`] - `SyncTarget` and instance keys
//! - [`record`] - `Record`, `Cursor`, `Page`
//! - [`error`] - `ErrorKind` taxonomy and `SyncError`
//! - [`retry`] - `RetryPolicy` classification and backoff
//! - [`config`] - Per-instance `SyncSettings`
//! - [`traits`] - Collaborator interfaces

pub mod config;
pub mod error;
pub mod ids;
pub mod record;
pub mod retry;
pub mod target;
pub mod traits;

/// Prelude module for convenient imports.
///
/// ```
/// use recsync_core::prelude::*;
/// ```
pub mod prelude {
    pub use crate::config::SyncSettings;
    pub use crate::error::{ErrorKind, SyncError, SyncResult};
    pub use crate::ids::{AccountId, SourceId};
    pub use crate::record::{Cursor, Page, Record};
    pub use crate::retry::{Disposition, RetryPolicy};
    pub use crate::target::{InstanceKey, SyncTarget};
    pub use crate::traits::{CursorStore, DestinationSink, SourceFetcher};
}

// Re-export async_trait for collaborator implementors
pub use async_trait::async_trait;

#[cfg(test)]
mod tests {
    use super::prelude::*;

    #[test]
    fn test_prelude_imports() {
        let target = SyncTarget::new(SourceId::new(), AccountId::new());
        let _key = target.instance_key();
        let _cursor = Cursor::new("c1");
        let _page = Page::empty();
        let _policy = RetryPolicy::default();
        let _settings = SyncSettings::default();
        let _err = SyncError::network("unreachable");
    }
}
