//! Records, cursors, and pages.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque pagination token marking "synced up to here".
///
/// The orchestrator never inspects the contents; the token is handed back
/// verbatim to the fetcher. Different sources use different formats: page
/// cursors, sequence numbers, timestamps.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Cursor(String);

impl Cursor {
    /// Create a cursor from a token value.
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// View the token as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Cursor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for Cursor {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for Cursor {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// A single record pulled from the source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    /// Identifier of the record in the source system.
    pub external_id: String,
    /// Record payload as reported by the source.
    pub attributes: serde_json::Value,
    /// When the source last modified the record, if reported.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub modified_at: Option<chrono::DateTime<chrono::Utc>>,
}

impl Record {
    /// Create a new record.
    pub fn new(external_id: impl Into<String>, attributes: serde_json::Value) -> Self {
        Self {
            external_id: external_id.into(),
            attributes,
            modified_at: None,
        }
    }

    /// Set the source-reported modification time.
    #[must_use]
    pub fn with_modified_at(mut self, at: chrono::DateTime<chrono::Utc>) -> Self {
        self.modified_at = Some(at);
        self
    }
}

/// One page of records returned by a fetcher.
///
/// `next_cursor` is the checkpoint for the records in this page: persisting
/// it marks everything up to and including this page as synced. `has_more`
/// tells the orchestrator whether another page is immediately available or
/// the stream is drained for now.
///
/// A page with records but no `next_cursor` violates the fetcher contract;
/// the orchestrator tolerates it by syncing without checkpointing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page {
    /// Records in source pagination order.
    pub records: Vec<Record>,
    /// Checkpoint cursor covering this page, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_cursor: Option<Cursor>,
    /// Whether more pages are immediately available.
    pub has_more: bool,
}

impl Page {
    /// A page with no records and nothing more to fetch.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            records: Vec::new(),
            next_cursor: None,
            has_more: false,
        }
    }

    /// A page of records.
    #[must_use]
    pub fn with_records(records: Vec<Record>) -> Self {
        Self {
            records,
            next_cursor: None,
            has_more: false,
        }
    }

    /// Set the checkpoint cursor for this page.
    #[must_use]
    pub fn with_cursor(mut self, cursor: impl Into<Cursor>) -> Self {
        self.next_cursor = Some(cursor.into());
        self
    }

    /// Indicate that another page is immediately available.
    #[must_use]
    pub fn with_more(mut self) -> Self {
        self.has_more = true;
        self
    }

    /// Whether the page carries no records.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_cursor_is_opaque_string() {
        let cursor = Cursor::new("eyJwYWdlIjoyfQ==");
        assert_eq!(cursor.as_str(), "eyJwYWdlIjoyfQ==");
        assert_eq!(cursor.to_string(), "eyJwYWdlIjoyfQ==");
    }

    #[test]
    fn test_empty_page() {
        let page = Page::empty();
        assert!(page.is_empty());
        assert!(page.next_cursor.is_none());
        assert!(!page.has_more);
    }

    #[test]
    fn test_page_builders() {
        let page = Page::with_records(vec![Record::new("r-1", json!({"name": "a"}))])
            .with_cursor("c1")
            .with_more();

        assert!(!page.is_empty());
        assert_eq!(page.next_cursor, Some(Cursor::new("c1")));
        assert!(page.has_more);
    }

    #[test]
    fn test_page_serialization_omits_absent_cursor() {
        let page = Page::empty();
        let json = serde_json::to_value(&page).unwrap();
        assert!(json.get("next_cursor").is_none());
    }
}
