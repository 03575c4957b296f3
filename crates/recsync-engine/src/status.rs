//! Instance lifecycle states, published for operator visibility.

use serde::{Deserialize, Serialize};

use recsync_core::error::{ErrorKind, SyncError};

/// Current state of one orchestrator instance.
///
/// Published through a `tokio::sync::watch` channel; observers see the
/// latest state without being able to influence the loop.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum InstanceState {
    /// Reading the starting cursor and registering the signal handler.
    Initializing,
    /// Fetching a page from the source.
    Paginating,
    /// Pushing a batch to the destination.
    Syncing,
    /// Persisting the cursor for a completed batch.
    Checkpointing,
    /// Stream exhausted; sleeping until the next poll.
    Draining,
    /// Stopped gracefully by external cancellation.
    Stopped,
    /// Terminal failure; no further collaborator calls are made.
    Failed {
        /// Classification of the triggering error.
        kind: ErrorKind,
        /// Message recorded for the operator.
        message: String,
    },
}

impl InstanceState {
    /// Build the terminal failure state from the triggering error.
    #[must_use]
    pub fn failed(err: &SyncError) -> Self {
        Self::Failed {
            kind: err.kind(),
            message: err.message().to_string(),
        }
    }

    /// Whether the instance has stopped for good.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Stopped | Self::Failed { .. })
    }

    /// Convert to string representation.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Initializing => "initializing",
            Self::Paginating => "paginating",
            Self::Syncing => "syncing",
            Self::Checkpointing => "checkpointing",
            Self::Draining => "draining",
            Self::Stopped => "stopped",
            Self::Failed { .. } => "failed",
        }
    }
}

impl std::fmt::Display for InstanceState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
