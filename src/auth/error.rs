//! Errors raised by [`super::Authenticator`] implementations.

// Layer 1: Standard library imports
use std::error::Error as StdError;

// Layer 2: Third-party crate imports
use thiserror::Error;

/// Errors raised while signing or verifying an envelope body (§4.1).
#[derive(Debug, Error)]
pub enum AuthError {
    /// Signing the outbound body failed.
    #[error("failed to sign envelope body: {source}")]
    SignFailed {
        #[source]
        source: Box<dyn StdError + Send + Sync>,
    },

    /// The signature did not match the body it was presented with.
    /// A consumer turns this into an `AuthFailure` rejection reply
    /// rather than propagating it (§4.1, §4.6 step 3).
    #[error("envelope signature is invalid")]
    VerifyFailed,
}

impl AuthError {
    /// `true` when the consumer loop should answer with a rejection
    /// reply rather than treat the failure as its own.
    pub fn is_rejection(&self) -> bool {
        matches!(self, AuthError::VerifyFailed)
    }
}
