//! Crate-wide error aggregation.
//!
//! Every subsystem defines its own `thiserror` enum (`envelope::EnvelopeError`,
//! `transport::TransportError`, `pending::PendingError`, `dispatcher::DispatchError`,
//! `consumer::ConsumerError`, `client::ClientError`, `plugin::PluginError`,
//! `config::ConfigError`, `auth::AuthError`). This enum exists only for callers
//! that want one `Error` type to propagate with `?` across subsystem boundaries —
//! internal code keeps using the precise per-module type.

// Layer 1: Standard library imports
// (none)

// Layer 2: Third-party crate imports
use thiserror::Error;

// Layer 3: Internal module imports
use crate::auth::AuthError;
use crate::client::ClientError;
use crate::config::ConfigError;
use crate::consumer::ConsumerError;
use crate::dispatcher::DispatchError;
use crate::envelope::EnvelopeError;
use crate::pending::PendingError;
use crate::plugin::PluginError;
use crate::transport::TransportError;

/// Unified error type for `fleetrpc`.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Envelope(#[from] EnvelopeError),

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error(transparent)]
    Pending(#[from] PendingError),

    #[error(transparent)]
    Dispatch(#[from] DispatchError),

    #[error(transparent)]
    Consumer(#[from] ConsumerError),

    #[error(transparent)]
    Client(#[from] ClientError),

    #[error(transparent)]
    Plugin(#[from] PluginError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Auth(#[from] AuthError),
}
