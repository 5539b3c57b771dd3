//! Transport errors (§7 `TransportError`: "session dropped; reconnect with backoff").

// Layer 1: Standard library imports
use std::error::Error as StdError;

// Layer 2: Third-party crate imports
use thiserror::Error;

/// Errors raised by the transport adapter (§4.2) and its registry.
#[derive(Debug, Error)]
pub enum TransportError {
    /// No implementation is bound for this URL's scheme.
    #[error("no transport registered for scheme {scheme:?}")]
    UnknownScheme { scheme: String },

    /// A second, different implementation tried to bind an already-bound URL.
    #[error("url {url:?} is already bound to a different transport implementation")]
    BindConflict { url: String },

    /// Broker connect failed.
    #[error("failed to connect to broker {url:?}: {source}")]
    ConnectFailed {
        url: String,
        #[source]
        source: Box<dyn StdError + Send + Sync>,
    },

    /// Declaring or deleting a queue/exchange failed.
    #[error("failed to declare queue {name:?}: {source}")]
    DeclareFailed {
        name: String,
        #[source]
        source: Box<dyn StdError + Send + Sync>,
    },

    /// Sending an envelope failed.
    #[error("failed to send to {destination}: {source}")]
    SendFailed {
        destination: String,
        #[source]
        source: Box<dyn StdError + Send + Sync>,
    },

    /// Fetch/search failed for a reason other than a plain timeout.
    #[error("fetch failed: {source}")]
    FetchFailed {
        #[source]
        source: Box<dyn StdError + Send + Sync>,
    },

    /// The endpoint session is closed; callers should reconnect with backoff.
    #[error("endpoint session is closed")]
    SessionClosed,
}

impl TransportError {
    /// `true` when the caller should back off and retry (§7).
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            TransportError::ConnectFailed { .. }
                | TransportError::SessionClosed
                | TransportError::FetchFailed { .. }
        )
    }
}
