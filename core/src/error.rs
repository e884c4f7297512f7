//! Error types for the Accounts API client.
//!
//! # Design
//! The three status-driven variants (`Duplicate`, `NotFound`,
//! `UnexpectedStatus`) render the exact messages callers match on. Transport
//! failures keep the underlying `reqwest::Error`, while deadline expiry and
//! caller cancellation get their own variants so they can be told apart from a
//! network fault. Configuration problems are reported only at construction,
//! through `ConfigError`; once a client exists they cannot occur.

use std::fmt;
use std::time::Duration;

/// The client operation an error belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Create,
    Fetch,
    Delete,
}

impl Operation {
    /// Past-tense verb used in log lines and error messages.
    pub fn past_tense(self) -> &'static str {
        match self {
            Operation::Create => "created",
            Operation::Fetch => "fetched",
            Operation::Delete => "deleted",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operation::Create => write!(f, "create"),
            Operation::Fetch => write!(f, "fetch"),
            Operation::Delete => write!(f, "delete"),
        }
    }
}

/// Errors returned by `AccountClient` operations.
#[derive(Debug, thiserror::Error)]
pub enum AccountError {
    /// The server answered `409 Conflict` to a create.
    #[error("account {id} already exists")]
    Duplicate { id: String },

    /// The server answered `404 Not Found` to a fetch or delete.
    #[error("account {id} not found")]
    NotFound { id: String },

    /// Any status the operation does not expect. `body` is the raw response.
    #[error("account {id} not {}. response: {body}", .operation.past_tense())]
    UnexpectedStatus {
        id: String,
        operation: Operation,
        status: u16,
        body: String,
    },

    /// The operation budget ran out before the response was fully read.
    #[error("operation deadline of {0:?} exceeded")]
    DeadlineExceeded(Duration),

    /// The caller's context was cancelled.
    #[error("operation cancelled by caller")]
    Cancelled,

    #[error(transparent)]
    Transport(#[from] reqwest::Error),

    /// The request payload could not be serialized to JSON.
    #[error("serialization failed: {0}")]
    Serialization(#[source] serde_json::Error),

    /// The response body could not be deserialized into the envelope.
    #[error("deserialization failed: {0}")]
    Deserialization(#[source] serde_json::Error),
}

/// Construction-time failures. These are programmer errors: a client with a
/// bad base URL or timeout is never handed out.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid base URL {url:?}: {source}")]
    InvalidBaseUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("unsupported scheme {0:?}, expected http or https")]
    UnsupportedScheme(String),

    #[error("base URL {0:?} cannot carry a resource path")]
    NotABase(String),

    #[error("API version must not be empty")]
    EmptyVersion,

    #[error("timeout must be greater than zero")]
    ZeroTimeout,

    #[error("failed to build HTTP client: {0}")]
    HttpClient(#[source] reqwest::Error),

    #[error("invalid value {value:?} for {name}")]
    InvalidEnv { name: &'static str, value: String },
}
