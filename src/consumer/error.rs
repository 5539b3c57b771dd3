//! Request consumer errors.

// Layer 2: Third-party crate imports
use thiserror::Error;

// Layer 3: Internal module imports
use crate::pending::PendingError;
use crate::pool::PoolError;
use crate::transport::TransportError;

/// Errors raised by [`super::RequestConsumer`] (§4.6).
#[derive(Debug, Error)]
pub enum ConsumerError {
    /// `start()` called on a consumer that is not `Created`.
    #[error("consumer is not in a startable state")]
    AlreadyStarted,

    /// `stop()` called on a consumer that was never started.
    #[error("consumer was never started")]
    NotRunning,

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error(transparent)]
    Pending(#[from] PendingError),

    #[error(transparent)]
    Pool(#[from] PoolError),
}
