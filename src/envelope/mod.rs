//! Envelope model (§3, §6): the single message shape carried on every
//! queue, independent of whether it is a request, a progress update, or
//! a terminal reply.

pub mod error;
pub mod model;
pub mod window;

pub use error::EnvelopeError;
pub use model::{Cntr, Envelope, ReplyResult, Request, Routing, Status, SUPPORTED_VERSION};
pub use window::Window;
