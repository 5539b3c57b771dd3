//! Prelude module for convenient imports.
//!
//! ```rust
//! use fleetrpc::prelude::*;
//! ```
//!
//! # What's Included
//!
//! ## Wire model
//! - [`Envelope`], [`Request`], [`Routing`], [`Window`] - the envelope
//!   shape and its execution window
//!
//! ## Transport
//! - [`TransportFactory`], [`Producer`], [`Reader`] - the adapter
//!   contract
//! - [`InMemoryTransportFactory`] - the in-process reference transport
//! - [`Destination`] - `(exchange, routing_key)` addressing
//!
//! ## Agent side
//! - [`Dispatcher`], [`Remote`], [`RemoteCollector`], [`Return`] -
//!   class/method routing
//! - [`ProgressReporter`], [`NullProgressReporter`] - intermediate
//!   progress reports from a dispatched method
//! - [`ThreadPool`] - the bounded FIFO worker pool
//! - [`RequestConsumer`] - the per-plugin receive loop
//! - [`Plugin`], [`PluginDescriptor`], [`PluginLoader`] - plugin
//!   lifecycle
//! - [`ActionScheduler`], [`Period`] - periodic jobs
//!
//! ## Client side
//! - [`Stub`], [`CallOptions`] - the message-builder call surface
//!
//! ## Shared
//! - [`Sn`], [`AgentId`] - identifiers
//! - [`Error`] - the crate-wide error aggregation

// Wire model
pub use crate::envelope::{Envelope, Request, Routing, Window};

// Transport
pub use crate::transport::{Destination, InMemoryTransportFactory, Producer, Reader, TransportFactory};

// Dispatch
pub use crate::dispatcher::{
    Dispatcher, NullProgressReporter, ProgressReporter, Remote, RemoteCollector, RemoteConstraints, RemoteFn, Return,
};

// Pool
pub use crate::pool::ThreadPool;

// Consumer
pub use crate::consumer::RequestConsumer;

// Plugin
pub use crate::plugin::{Plugin, PluginDescriptor, PluginLoader};

// Actions
pub use crate::action::{ActionScheduler, Period};

// Client
pub use crate::client::{CallOptions, Stub};

// Utilities
pub use crate::util::{AgentId, Sn};

// Errors
pub use crate::error::Error;
