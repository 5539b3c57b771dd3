//! Pending-store errors.

// Layer 1: Standard library imports
use std::io;
use std::path::PathBuf;

// Layer 2: Third-party crate imports
use thiserror::Error;

// Layer 3: Internal module imports
use crate::util::Sn;

/// Errors raised by the on-disk window scheduler (§4.3).
#[derive(Debug, Error)]
pub enum PendingError {
    #[error("failed to open pending store at {path:?}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to append to pending store at {path:?}: {source}")]
    Append {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to serialize pending-store record: {source}")]
    Serialize {
        #[source]
        source: serde_json::Error,
    },

    /// A log line could not be parsed. Per §4.3 "crash safety", this is
    /// only ever fatal when it occurs somewhere other than the final
    /// line of the log — a trailing partial write is discarded silently.
    #[error("corrupt pending-store record: {detail}")]
    CorruptRecord { detail: String },

    /// Replay found the entry's window already in the past (§4.3
    /// "Expiration"); the caller turns this into a `WindowMissed` reply.
    #[error("entry {sn} missed its window on replay")]
    WindowMissed { sn: Sn },
}
