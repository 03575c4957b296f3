//! Error taxonomy shared by all collaborators.
//!
//! Collaborators (fetcher, sink, cursor store) classify raw transport and
//! protocol failures into an [`ErrorKind`] before raising them. The
//! orchestrator branches only on the kind tag, never on transport details.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Classification tag attached to every collaborator failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// The source or destination asked us to slow down.
    RateLimit,
    /// Credentials rejected or expired.
    AuthError,
    /// The request itself was malformed.
    InvalidInput,
    /// Other 4xx-class rejection.
    ClientError,
    /// 5xx-class failure in the remote system.
    ServerError,
    /// Transport-level failure (connect, timeout, reset).
    NetworkError,
    /// Anything the collaborator could not classify.
    Unknown,
}

impl ErrorKind {
    /// Convert to string representation.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::RateLimit => "rate_limit",
            ErrorKind::AuthError => "auth_error",
            ErrorKind::InvalidInput => "invalid_input",
            ErrorKind::ClientError => "client_error",
            ErrorKind::ServerError => "server_error",
            ErrorKind::NetworkError => "network_error",
            ErrorKind::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for ErrorKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "rate_limit" => Ok(ErrorKind::RateLimit),
            "auth_error" => Ok(ErrorKind::AuthError),
            "invalid_input" => Ok(ErrorKind::InvalidInput),
            "client_error" => Ok(ErrorKind::ClientError),
            "server_error" => Ok(ErrorKind::ServerError),
            "network_error" => Ok(ErrorKind::NetworkError),
            "unknown" => Ok(ErrorKind::Unknown),
            _ => Err(format!("Unknown error kind: {s}")),
        }
    }
}

/// A classified failure raised by a collaborator.
#[derive(Debug, Error)]
#[error("{kind}: {message}")]
pub struct SyncError {
    kind: ErrorKind,
    message: String,
    #[source]
    source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl SyncError {
    /// Create an error with an explicit kind.
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            source: None,
        }
    }

    /// Attach the underlying cause.
    #[must_use]
    pub fn with_source(
        mut self,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    /// Create a rate-limit error.
    pub fn rate_limit(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::RateLimit, message)
    }

    /// Create an authentication error.
    pub fn auth(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::AuthError, message)
    }

    /// Create an invalid-input error.
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidInput, message)
    }

    /// Create a client error.
    pub fn client(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::ClientError, message)
    }

    /// Create a server error.
    pub fn server(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::ServerError, message)
    }

    /// Create a network error.
    pub fn network(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::NetworkError, message)
    }

    /// Create an unclassified error.
    pub fn unknown(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Unknown, message)
    }

    /// The classification tag.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// The human-readable message, for operator visibility.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Whether this is a rate-limit condition.
    #[must_use]
    pub fn is_rate_limit(&self) -> bool {
        self.kind == ErrorKind::RateLimit
    }
}

/// Result type for collaborator calls.
pub type SyncResult<T> = Result<T, SyncError>;
