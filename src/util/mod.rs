//! Small cross-cutting utilities shared by every other module.
//!
//! Mirrors the teacher crate's `util` module: identifiers live in
//! [`ids`], time/duration parsing helpers live in [`time`].

pub mod ids;
pub mod time;

pub use ids::{AgentId, Sn};
pub use time::parse_duration;
