//! Transport-level addressing and queue shape (§3 "Destination", "Queue").

// Layer 1: Standard library imports
use std::fmt;
use std::str::FromStr;

// Layer 2: Third-party crate imports
use serde::{Deserialize, Serialize};

/// `(exchange, routing_key)` pair that resolves to an AMQP address.
///
/// Two agents sharing the same uuid-derived routing key resolve to the
/// same [`Destination`] — intentional, per §3: "broadcast by
/// re-addressing".
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Destination {
    pub exchange: String,
    pub routing_key: String,
}

impl Destination {
    pub fn new(exchange: impl Into<String>, routing_key: impl Into<String>) -> Self {
        Self {
            exchange: exchange.into(),
            routing_key: routing_key.into(),
        }
    }

    /// The well-known direct exchange bound to a single routing key,
    /// the common case for an agent's own queue (§4.2 "Exchange.direct").
    pub fn direct(routing_key: impl Into<String>) -> Self {
        Self::new("amq.direct", routing_key)
    }
}

impl fmt::Display for Destination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.exchange, self.routing_key)
    }
}

/// Error returned when a `replyto` address string cannot be parsed
/// back into a [`Destination`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("malformed destination address: {0:?}")]
pub struct DestinationParseError(pub String);

impl FromStr for Destination {
    type Err = DestinationParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.split_once('/')
            .map(|(exchange, routing_key)| Destination::new(exchange, routing_key))
            .ok_or_else(|| DestinationParseError(s.to_string()))
    }
}

/// A durable (or not) AMQP queue's declared shape (§3 "Queue").
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueSpec {
    pub name: String,
    pub durable: bool,
    pub auto_delete: bool,
    /// `true`: agent-owned, deleted on detach. `false`: broker-owned,
    /// left in place.
    pub managed: bool,
    pub destination: Destination,
}

impl QueueSpec {
    pub fn new(name: impl Into<String>, destination: Destination) -> Self {
        let name = name.into();
        Self {
            destination,
            name,
            durable: true,
            auto_delete: false,
            managed: true,
        }
    }

    pub fn transient(name: impl Into<String>, destination: Destination) -> Self {
        let name = name.into();
        Self {
            destination,
            name,
            durable: false,
            auto_delete: true,
            managed: true,
        }
    }
}
