//! # fleetrpc - RMI-over-AMQP messaging fabric
//!
//! A remote-method-invocation fabric built over an AMQP-shaped message
//! bus: agents expose plugins of callable remotes, clients address them
//! through envelopes carrying a routing pair, an optional execution
//! window, and a correlated reply.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use fleetrpc::prelude::*;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let factory = InMemoryTransportFactory::new();
//!     let dispatcher = Arc::new(Dispatcher::new());
//!     dispatcher.register(
//!         "Calc",
//!         "square",
//!         Arc::new(RemoteFn::new(|args, _kws, _progress| async move {
//!             let n = args[0].as_i64().unwrap_or(0);
//!             Return::success(serde_json::json!(n * n))
//!         })),
//!         RemoteConstraints::default(),
//!     )?;
//!     Ok(())
//! }
//! ```
//!
//! # Module Organization
//!
//! ## Wire model
//! - [`envelope`] - the request/reply envelope and its execution window
//! - [`transport`] - broker/queue/producer/reader traits plus an
//!   in-memory reference transport
//! - [`auth`] - optional signature/verify hook on every envelope
//!
//! ## Agent side
//! - [`pending`] - on-disk store and scheduler for future-windowed
//!   requests
//! - [`pool`] - bounded FIFO worker pool used by each plugin
//! - [`dispatcher`] - class/method routing table
//! - [`consumer`] - the per-plugin receive loop (component C6)
//! - [`plugin`] - descriptor loading, dependency ordering, lifecycle
//! - [`action`] - periodic in-process jobs attached to a plugin
//! - [`config`] - typed INI-style config reading
//!
//! ## Client side
//! - [`client`] - the stub, its synchronous/asynchronous calling
//!   policies, and the reply watchdog
//!
//! ## Shared
//! - [`util`] - identifiers (`Sn`, `AgentId`) and duration parsing
//! - [`error`] - the crate-wide error aggregation

pub mod action;
pub mod auth;
pub mod client;
pub mod config;
pub mod consumer;
pub mod dispatcher;
pub mod envelope;
pub mod error;
pub mod pending;
pub mod plugin;
pub mod pool;
pub mod prelude;
pub mod transport;
pub mod util;

pub use error::Error;

pub use action::{ActionError, ActionScheduler, ActionTask, Period};
pub use auth::{AuthError, Authenticator, SharedSecretAuthenticator};
pub use client::{CallOptions, ClientError, Deferred, ProgressReport, Stub, Timeout, TimeoutPhase, Watchdog};
pub use config::{Config, ConfigError, Graph};
pub use consumer::{ConsumerError, ConsumerState, RequestConsumer};
pub use dispatcher::{
    DispatchError, Dispatcher, NullProgressReporter, ProgressReporter, Remote, RemoteCollector, RemoteConstraints,
    RemoteException, Return,
};
pub use envelope::{Envelope, EnvelopeError, Request, Routing, Window};
pub use pending::{PendingError, PendingScheduler, PendingStore};
pub use plugin::{ModuleRegistry, Plugin, PluginDescriptor, PluginError, PluginLoader, PluginModule};
pub use pool::{PoolError, ThreadPool};
pub use transport::{Destination, InMemoryTransportFactory, Producer, Reader, TransportError, TransportFactory, TransportRegistry};
pub use util::{AgentId, Sn};
