//! Client-side errors. Per §7 "Client-side exceptions escape to the
//! caller unchanged" — these propagate straight out of `call`/`wait`,
//! they are never captured the way dispatcher-side exceptions are.

// Layer 2: Third-party crate imports
use thiserror::Error;

// Layer 3: Internal module imports
use crate::transport::TransportError;
use crate::util::Sn;

/// `phase` distinguishes which wait timed out (§7 `RequestTimeout(sn, phase)`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeoutPhase {
    StartedMissing = 0,
    ReplyMissing = 1,
}

/// Errors raised by the client-side stub and its policies (§4.7).
#[derive(Debug, Error)]
pub enum ClientError {
    /// Neither a `started` nor a terminal reply arrived within budget.
    #[error("request {sn} timed out waiting for {phase:?}")]
    RequestTimeout { sn: Sn, phase: TimeoutPhase },

    /// The remote call raised; reconstructed from the reply's `result`.
    #[error("remote exception {xclass:?}: {exval}")]
    RemoteException {
        sn: Sn,
        exval: String,
        xclass: Option<String>,
        xmodule: Option<String>,
        xargs: Option<serde_json::Value>,
    },

    /// A [`crate::client::Trigger`] fired a second time.
    #[error("trigger for {sn} has already fired")]
    TriggerAlreadyFired { sn: Sn },

    /// [`crate::client::Stub::call_async`] called without first attaching
    /// a watchdog via [`crate::client::Stub::with_watchdog`].
    #[error("call_async requires Stub::with_watchdog to be called first")]
    WatchdogMissing,

    #[error(transparent)]
    Transport(#[from] TransportError),
}
