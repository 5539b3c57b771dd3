//! Config/Graph errors (§4.10).

// Layer 1: Standard library imports
use std::path::PathBuf;

// Layer 2: Third-party crate imports
use thiserror::Error;

/// Errors raised parsing, merging, or validating an INI-style descriptor.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path:?}: {source}")]
    Read { path: PathBuf, #[source] source: std::io::Error },

    #[error("malformed line {line} in {path:?}: {text:?}")]
    Malformed { path: PathBuf, line: usize, text: String },

    #[error("schema violation: section [{section}] is required but missing")]
    MissingSection { section: String },

    #[error("schema violation: [{section}].{key} is required but missing")]
    MissingKey { section: String, key: String },

    #[error("[{section}].{key} = {value:?} is not a valid bool")]
    InvalidBool { section: String, key: String, value: String },

    #[error("[{section}].{key} = {value:?} is not a valid integer")]
    InvalidInt { section: String, key: String, value: String },
}

impl ConfigError {
    /// Schema violations and bad values abort loading the one
    /// descriptor that carries them; they are never process-fatal
    /// (§4.8 "entries that fail parsing are logged and skipped").
    pub fn is_fatal(&self) -> bool {
        false
    }
}
