//! Envelope errors (§7).

// Layer 1: Standard library imports
// (none)

// Layer 2: Third-party crate imports
use thiserror::Error;

// Layer 3: Internal module imports
use crate::util::Sn;

/// Errors raised while building, serializing, or validating an [`crate::envelope::Envelope`].
#[derive(Debug, Error)]
pub enum EnvelopeError {
    /// JSON (de)serialization failed.
    #[error("malformed envelope: {0}")]
    Malformed(#[from] serde_json::Error),

    /// §6 invariant: exactly one of `{request, result, status}` must be present.
    #[error("envelope must carry exactly one of request/result/status, found {found}")]
    AmbiguousKind { found: usize },

    /// §3 invariant: a terminal envelope cannot also carry `status in {started, progress}`.
    #[error("envelope {sn} carries both a terminal result and a non-terminal status")]
    ResultAndStatusBothPresent { sn: Sn },

    /// Detached-signature verification failed (see [`crate::auth`]).
    #[error("signature verification failed for envelope {sn:?}")]
    SignatureInvalid { sn: Option<Sn> },
}

impl EnvelopeError {
    /// Per §7 propagation policy, malformed-on-the-wire / signature failures
    /// are per-envelope and never fatal to the consumer loop.
    pub fn is_per_envelope(&self) -> bool {
        true
    }
}
