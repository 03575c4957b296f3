//! Postgres-backed cursor store.
//!
//! Expected schema:
//!
//! ```sql
//! CREATE TABLE IF NOT EXISTS sync_cursors (
//!     source_id  UUID        NOT NULL,
//!     account_id UUID        NOT NULL,
//!     cursor     TEXT        NOT NULL,
//!     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
//!     PRIMARY KEY (source_id, account_id)
//! );
//! ```

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use tracing::instrument;

use async_trait::async_trait;

use recsync_core::error::{SyncError, SyncResult};
use recsync_core::record::Cursor;
use recsync_core::target::SyncTarget;
use recsync_core::traits::CursorStore;

/// Durable [`CursorStore`] keyed by `(source_id, account_id)`.
#[derive(Debug, Clone)]
pub struct PgCursorStore {
    pool: PgPool,
}

impl PgCursorStore {
    /// Create a store over an existing pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create the backing table when migrations are not managed externally.
    pub async fn ensure_schema(&self) -> SyncResult<()> {
        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS sync_cursors (
                source_id  UUID        NOT NULL,
                account_id UUID        NOT NULL,
                cursor     TEXT        NOT NULL,
                updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
                PRIMARY KEY (source_id, account_id)
            )
            ",
        )
        .execute(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("create sync_cursors table", e))?;

        Ok(())
    }

    /// Delete the persisted cursor, forcing a full resync on next start.
    #[instrument(skip(self))]
    pub async fn reset(&self, target: &SyncTarget) -> SyncResult<bool> {
        let result = sqlx::query(
            r"
            DELETE FROM sync_cursors
            WHERE source_id = $1 AND account_id = $2
            ",
        )
        .bind(target.source_id.as_uuid())
        .bind(target.account_id.as_uuid())
        .execute(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("reset cursor", e))?;

        Ok(result.rows_affected() > 0)
    }

    /// When the cursor for a target was last written, if ever.
    #[instrument(skip(self))]
    pub async fn last_updated(&self, target: &SyncTarget) -> SyncResult<Option<DateTime<Utc>>> {
        let updated_at = sqlx::query_scalar::<_, DateTime<Utc>>(
            r"
            SELECT updated_at
            FROM sync_cursors
            WHERE source_id = $1 AND account_id = $2
            ",
        )
        .bind(target.source_id.as_uuid())
        .bind(target.account_id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("read cursor age", e))?;

        Ok(updated_at)
    }
}

#[async_trait]
impl CursorStore for PgCursorStore {
    #[instrument(skip(self))]
    async fn get(&self, target: &SyncTarget) -> SyncResult<Option<Cursor>> {
        let value = sqlx::query_scalar::<_, String>(
            r"
            SELECT cursor
            FROM sync_cursors
            WHERE source_id = $1 AND account_id = $2
            ",
        )
        .bind(target.source_id.as_uuid())
        .bind(target.account_id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("read cursor", e))?;

        Ok(value.map(Cursor::new))
    }

    #[instrument(skip(self))]
    async fn set(&self, target: &SyncTarget, cursor: &Cursor) -> SyncResult<()> {
        sqlx::query(
            r"
            INSERT INTO sync_cursors (source_id, account_id, cursor)
            VALUES ($1, $2, $3)
            ON CONFLICT (source_id, account_id) DO UPDATE SET
                cursor = EXCLUDED.cursor,
                updated_at = NOW()
            ",
        )
        .bind(target.source_id.as_uuid())
        .bind(target.account_id.as_uuid())
        .bind(cursor.as_str())
        .execute(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("persist cursor", e))?;

        Ok(())
    }
}

/// Classify a database failure into the shared taxonomy.
///
/// Connection-level failures are retryable network errors; the database
/// rejecting a statement is a server error.
fn map_sqlx_error(context: &str, err: sqlx::Error) -> SyncError {
    match err {
        sqlx::Error::Io(_)
        | sqlx::Error::PoolTimedOut
        | sqlx::Error::PoolClosed
        | sqlx::Error::WorkerCrashed => {
            SyncError::network(format!("{context}: {err}")).with_source(err)
        }
        sqlx::Error::Database(_) => SyncError::server(format!("{context}: {err}")).with_source(err),
        _ => SyncError::unknown(format!("{context}: {err}")).with_source(err),
    }
}
