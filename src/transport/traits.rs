//! Transport adapter contract (§4.2).
//!
//! The core dispatcher, pending store, and consumer depend only on
//! these traits — never on a concrete AMQP client. Wiring a real broker
//! (connection, channel, session, broker ssl) is out of scope (§1); the
//! [`crate::transport::memory`] module ships a reference implementation
//! that satisfies the same contract in-process, for tests and demos.

// Layer 1: Standard library imports
use std::time::Duration;

// Layer 2: Third-party crate imports
use async_trait::async_trait;
use parking_lot::ReentrantMutex;
use serde::{Deserialize, Serialize};

// Layer 3: Internal module imports
use super::error::TransportError;
use super::model::{Destination, QueueSpec};
use crate::envelope::Envelope;
use crate::util::Sn;

/// Broker-side TLS configuration (§4.2 "settable ssl config").
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SslConfig {
    pub cacert: Option<String>,
    pub clientcert: Option<String>,
    pub host_validation: bool,
}

/// The broker connection itself.
#[async_trait]
pub trait Broker: Send + Sync {
    fn set_ssl(&mut self, ssl: SslConfig);
    async fn connect(&self) -> Result<(), TransportError>;
    async fn close(&self) -> Result<(), TransportError>;
}

/// A declared (or declarable) queue.
#[async_trait]
pub trait Queue: Send + Sync {
    async fn declare(&self) -> Result<(), TransportError>;
    /// `drain`: consume and discard any remaining messages before deleting.
    async fn delete(&self, drain: bool) -> Result<(), TransportError>;
    fn destination(&self) -> Destination;
    fn spec(&self) -> &QueueSpec;
}

/// Sends envelopes to a [`Destination`].
#[async_trait]
pub trait Producer: Send + Sync {
    /// Send `envelope` to `destination`, returning its `sn`.
    async fn send(&self, destination: &Destination, envelope: Envelope) -> Result<Sn, TransportError>;
    async fn close(&self) -> Result<(), TransportError>;
}

/// Pulls envelopes off a queue, by arrival or by `sn` (§4.2, §4.7
/// "Reader.search" used by the synchronous client policy).
#[async_trait]
pub trait Reader: Send + Sync {
    async fn fetch(&self, timeout: Duration) -> Result<Option<Envelope>, TransportError>;
    async fn search(&self, sn: Sn, timeout: Duration) -> Result<Option<Envelope>, TransportError>;
    async fn ack(&self) -> Result<(), TransportError>;
    async fn close(&self) -> Result<(), TransportError>;
}

/// Shared open/closed bookkeeping mixed into every endpoint
/// (producer or reader) — the base mixin of §4.2's `Endpoint`.
///
/// Uses a reentrant lock because `close()` may be called recursively
/// from within a method that already holds it (e.g. a `Drop` impl
/// calling `close` after an explicit `close` already ran).
pub struct EndpointState {
    open: ReentrantMutex<std::cell::Cell<bool>>,
}

impl EndpointState {
    pub fn new() -> Self {
        Self {
            open: ReentrantMutex::new(std::cell::Cell::new(false)),
        }
    }

    pub fn mark_open(&self) {
        self.open.lock().set(true);
    }

    pub fn mark_closed(&self) {
        self.open.lock().set(false);
    }

    pub fn is_open(&self) -> bool {
        self.open.lock().get()
    }

    /// Returns [`TransportError::SessionClosed`] if the endpoint is not open.
    pub fn require_open(&self) -> Result<(), TransportError> {
        if self.is_open() {
            Ok(())
        } else {
            Err(TransportError::SessionClosed)
        }
    }
}

impl Default for EndpointState {
    fn default() -> Self {
        Self::new()
    }
}
