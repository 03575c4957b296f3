//! In-memory cursor store for tests and single-process deployments.

use std::collections::HashMap;

use tokio::sync::RwLock;

use async_trait::async_trait;

use recsync_core::error::SyncResult;
use recsync_core::record::Cursor;
use recsync_core::target::SyncTarget;
use recsync_core::traits::CursorStore;

/// Non-durable [`CursorStore`] backed by a map.
#[derive(Debug, Default)]
pub struct MemoryCursorStore {
    cursors: RwLock<HashMap<SyncTarget, Cursor>>,
}

impl MemoryCursorStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a cursor outside the orchestrated path.
    pub async fn seed(&self, target: SyncTarget, cursor: Cursor) {
        self.cursors.write().await.insert(target, cursor);
    }

    /// Number of targets with a persisted cursor.
    pub async fn len(&self) -> usize {
        self.cursors.read().await.len()
    }

    /// Whether no cursor has been persisted yet.
    pub async fn is_empty(&self) -> bool {
        self.cursors.read().await.is_empty()
    }
}

#[async_trait]
impl CursorStore for MemoryCursorStore {
    async fn get(&self, target: &SyncTarget) -> SyncResult<Option<Cursor>> {
        Ok(self.cursors.read().await.get(target).cloned())
    }

    async fn set(&self, target: &SyncTarget, cursor: &Cursor) -> SyncResult<()> {
        self.cursors.write().await.insert(*target, cursor.clone());
        Ok(())
    }
}
