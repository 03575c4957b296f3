//! Consumed collaborator interfaces.
//!
//! The orchestrator composes three collaborators behind these traits. Each
//! implementation is responsible for classifying its own raw failures into
//! the [`crate::error::ErrorKind`] taxonomy before returning them.

use async_trait::async_trait;

use crate::error::SyncResult;
use crate::record::{Cursor, Page, Record};
use crate::target::SyncTarget;

/// Fetches one page of records for a target at a cursor position.
#[async_trait]
pub trait SourceFetcher: Send + Sync {
    /// Fetch up to `limit` records after `cursor`.
    ///
    /// `None` means start of stream. The returned page's `next_cursor` is
    /// the checkpoint covering its records; implementations must set it
    /// whenever records are returned, and must set `has_more` when another
    /// page is immediately available.
    async fn fetch(
        &self,
        target: &SyncTarget,
        cursor: Option<&Cursor>,
        limit: u32,
    ) -> SyncResult<Page>;
}

/// Pushes a batch of records to the destination.
///
/// Implementations must be idempotent: receiving the same batch twice must
/// not duplicate stored records (keyed upsert or equivalent). The
/// orchestrator relies on this to make re-sync after a missed checkpoint
/// safe.
#[async_trait]
pub trait DestinationSink: Send + Sync {
    /// Write a batch of records for the target.
    async fn sync(&self, target: &SyncTarget, records: &[Record]) -> SyncResult<()>;
}

/// Durable get/set of the last-synced cursor per target.
///
/// Contract: `set` is an idempotent upsert, durable before returning, and a
/// `get` immediately after a successful `set` observes the new value. The
/// orchestrator treats transient store failures as retryable.
#[async_trait]
pub trait CursorStore: Send + Sync {
    /// Read the persisted cursor for a target, if any.
    async fn get(&self, target: &SyncTarget) -> SyncResult<Option<Cursor>>;

    /// Persist the cursor for a target.
    async fn set(&self, target: &SyncTarget, cursor: &Cursor) -> SyncResult<()>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SyncError;
    use crate::ids::{AccountId, SourceId};
    use serde_json::json;

    // Minimal scripted fetcher used to exercise the trait surface.
    struct OnePageFetcher;

    #[async_trait]
    impl SourceFetcher for OnePageFetcher {
        async fn fetch(
            &self,
            _target: &SyncTarget,
            cursor: Option<&Cursor>,
            _limit: u32,
        ) -> SyncResult<Page> {
            match cursor {
                None => Ok(Page::with_records(vec![Record::new("r-1", json!({}))])
                    .with_cursor("c1")),
                Some(c) if c.as_str() == "c1" => Ok(Page::empty()),
                Some(c) => Err(SyncError::invalid_input(format!("unknown cursor {c}"))),
            }
        }
    }

    #[tokio::test]
    async fn test_fetcher_contract() {
        let target = SyncTarget::new(SourceId::new(), AccountId::new());
        let fetcher = OnePageFetcher;

        let first = fetcher.fetch(&target, None, 50).await.unwrap();
        assert_eq!(first.records.len(), 1);
        let cursor = first.next_cursor.unwrap();

        let second = fetcher.fetch(&target, Some(&cursor), 50).await.unwrap();
        assert!(second.is_empty());
        assert!(second.next_cursor.is_none());

        let err = fetcher
            .fetch(&target, Some(&Cursor::new("bogus")), 50)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::InvalidInput);
    }
}
