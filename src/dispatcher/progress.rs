//! Progress reporting hook for a call in flight (§3, §4.6, §8 scenario 5
//! "a `@remote` method emits progress reports").
//!
//! A [`Remote`](super::Remote) implementation that wants to emit
//! intermediate progress reports — rather than only a single terminal
//! [`Return`](super::Return) — calls [`ProgressReporter::report`] as
//! many times as it likes before returning. The consumer supplies the
//! concrete reporter that turns each call into a `progress` envelope
//! addressed back to the caller; tests and anything that doesn't care
//! about progress pass [`NullProgressReporter`].

// Layer 2: Third-party crate imports
use async_trait::async_trait;
use serde_json::Value;

/// Sink a dispatched method reports intermediate progress to.
#[async_trait]
pub trait ProgressReporter: Send + Sync {
    /// `completed`/`total` should be monotonically non-decreasing
    /// across calls for the same invocation (§8 "monotonically
    /// non-decreasing `completed`").
    async fn report(&self, completed: u64, total: Option<u64>, details: Option<Value>);
}

/// Discards every report; used by callers and tests with no interest
/// in progress (e.g. a dispatch run outside of a live consumer).
pub struct NullProgressReporter;

#[async_trait]
impl ProgressReporter for NullProgressReporter {
    async fn report(&self, _completed: u64, _total: Option<u64>, _details: Option<Value>) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn null_reporter_accepts_any_report() {
        NullProgressReporter.report(1, Some(3), None).await;
    }
}
