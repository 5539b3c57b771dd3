//! Thread pool errors.

// Layer 2: Third-party crate imports
use thiserror::Error;

/// Errors raised by [`super::ThreadPool`].
#[derive(Debug, Error)]
pub enum PoolError {
    /// `submit` was called after `stop()` — the pool no longer accepts work.
    #[error("thread pool is no longer accepting work")]
    Stopped,

    /// Workers did not join within the shutdown deadline.
    #[error("thread pool did not join within the shutdown deadline")]
    JoinTimedOut,
}
