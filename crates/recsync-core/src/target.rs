//! Sync targets and instance keys.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::ids::{AccountId, SourceId};

/// One synchronization stream: a single account on a single source.
///
/// Immutable for the lifetime of an orchestrator instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SyncTarget {
    /// The external record source.
    pub source_id: SourceId,
    /// The account within that source.
    pub account_id: AccountId,
}

impl SyncTarget {
    /// Create a new sync target.
    #[must_use]
    pub fn new(source_id: SourceId, account_id: AccountId) -> Self {
        Self {
            source_id,
            account_id,
        }
    }

    /// Derive the globally unique instance key for this target.
    ///
    /// The key is deterministic, so two start requests for the same target
    /// always collide in the instance registry.
    #[must_use]
    pub fn instance_key(&self) -> InstanceKey {
        InstanceKey(format!("sync-{}-{}", self.source_id, self.account_id))
    }
}

impl fmt::Display for SyncTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.source_id, self.account_id)
    }
}

/// Deterministic key identifying the single live instance for a target.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InstanceKey(String);

impl InstanceKey {
    /// View the key as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for InstanceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
