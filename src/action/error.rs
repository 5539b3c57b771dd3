//! Action scheduler errors (§4.9).

// Layer 1: Standard library imports
use std::error::Error as StdError;

// Layer 2: Third-party crate imports
use thiserror::Error;

/// An action's own failure, captured and logged by the scheduler —
/// never propagated (§4.9 "exceptions from an action are logged; the
/// action continues to be scheduled").
#[derive(Debug, Error)]
#[error("action {name} failed: {source}")]
pub struct ActionError {
    pub name: String,
    #[source]
    pub source: Box<dyn StdError + Send + Sync>,
}

impl ActionError {
    pub fn new(name: impl Into<String>, source: impl Into<Box<dyn StdError + Send + Sync>>) -> Self {
        Self { name: name.into(), source: source.into() }
    }
}
