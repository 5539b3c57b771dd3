//! Client-side call surface (§4.7, component C7): the stub, its
//! synchronous/asynchronous calling policies, and the watchdog that
//! backs asynchronous replies.

pub mod error;
pub mod model;
pub mod policy;
pub mod stub;
pub mod watchdog;

pub use error::{ClientError, TimeoutPhase};
pub use model::Timeout;
pub use policy::{Asynchronous, Deferred, ProgressReport, Synchronous, Trigger};
pub use stub::{CallOptions, Stub};
pub use watchdog::Watchdog;
