//! Transport adapter (§4.2, component C2).
//!
//! The rest of the crate depends only on the traits in [`traits`]; a
//! real AMQP binding is out of scope (§1). [`memory`] ships an
//! in-process reference implementation, and [`registry`] is the
//! URL-scheme factory that binds a URL to exactly one implementation.

pub mod error;
pub mod memory;
pub mod model;
pub mod registry;
pub mod traits;

pub use error::TransportError;
pub use memory::InMemoryTransportFactory;
pub use model::{Destination, QueueSpec};
pub use registry::{TransportFactory, TransportRegistry};
pub use traits::{Broker, EndpointState, Producer, Queue, Reader, SslConfig};
