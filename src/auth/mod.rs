//! Authenticator hook (§4.1, component C11).
//!
//! An [`Authenticator`] signs the canonicalized (unsigned) body of an
//! outbound envelope and verifies it on the way in. It never sees an
//! [`crate::envelope::Envelope`] directly — only raw bytes — so that
//! `envelope` can depend on `auth` without a cycle back the other way.

pub mod error;

pub use error::AuthError;

// Layer 2: Third-party crate imports
use sha2::{Digest, Sha256};

/// Pluggable detached-signature scheme for envelope bodies.
///
/// Installed per [`crate::plugin::Plugin`]; a [`crate::consumer::RequestConsumer`]
/// calls [`Authenticator::verify`] on every inbound envelope that carries a
/// `signature`, and a [`crate::client::Stub`] calls [`Authenticator::sign`] before
/// sending if one is configured.
pub trait Authenticator: Send + Sync {
    /// Produce a detached signature over `body`.
    fn sign(&self, body: &[u8]) -> Result<String, AuthError>;

    /// Verify that `signature` was produced over `body` by this authenticator.
    fn verify(&self, body: &[u8], signature: &str) -> Result<(), AuthError>;
}

/// A reference [`Authenticator`] keying a SHA-256 digest with a shared
/// secret. Adequate for tests and single-process demos; production
/// deployments are expected to bring their own (e.g. an HSM-backed or
/// asymmetric scheme) — the transport/broker wiring is out of scope
/// here just as it is for the rest of the transport layer (§1).
pub struct SharedSecretAuthenticator {
    secret: Vec<u8>,
}

impl SharedSecretAuthenticator {
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into().into_bytes(),
        }
    }

    fn digest(&self, body: &[u8]) -> String {
        let mut hasher = Sha256::new();
        hasher.update(&self.secret);
        hasher.update(body);
        let bytes = hasher.finalize();
        bytes.iter().map(|b| format!("{b:02x}")).collect()
    }
}

impl Authenticator for SharedSecretAuthenticator {
    fn sign(&self, body: &[u8]) -> Result<String, AuthError> {
        Ok(self.digest(body))
    }

    fn verify(&self, body: &[u8], signature: &str) -> Result<(), AuthError> {
        if self.digest(body) == signature {
            Ok(())
        } else {
            Err(AuthError::VerifyFailed)
        }
    }
}
