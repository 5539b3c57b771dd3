//! The `Remote` trait: one callable method exposed by a plugin class.

// Layer 1: Standard library imports
use std::collections::BTreeMap;

// Layer 2: Third-party crate imports
use async_trait::async_trait;
use serde_json::Value;

// Layer 3: Internal module imports
use super::model::Return;
use super::progress::ProgressReporter;

/// A single callable bound under `classname.method` (§4.4).
///
/// Implementors never propagate a Rust panic across `invoke` — any
/// failure the plugin wants the caller to see must come back as
/// [`Return::Exception`], matching the "all user exceptions are
/// captured, never propagated" policy of §7. A method that wants to
/// report progress before its terminal result calls
/// `progress.report(...)` any number of times (§8 scenario 5).
#[async_trait]
pub trait Remote: Send + Sync {
    /// `(min, max)` accepted positional argument count. `max = None`
    /// means unbounded.
    fn arity(&self) -> (usize, Option<usize>) {
        (0, None)
    }

    async fn invoke(&self, args: &[Value], kws: &BTreeMap<String, Value>, progress: &dyn ProgressReporter) -> Return;
}

/// Adapts a plain async closure into a [`Remote`] with unconstrained
/// arity, for the common case of a stateless function-style method.
pub struct RemoteFn<F> {
    arity: (usize, Option<usize>),
    f: F,
}

impl<F, Fut> RemoteFn<F>
where
    F: Fn(&[Value], &BTreeMap<String, Value>, &dyn ProgressReporter) -> Fut + Send + Sync,
    Fut: std::future::Future<Output = Return> + Send,
{
    pub fn new(f: F) -> Self {
        Self { arity: (0, None), f }
    }

    pub fn with_arity(mut self, arity: (usize, Option<usize>)) -> Self {
        self.arity = arity;
        self
    }
}

#[async_trait]
impl<F, Fut> Remote for RemoteFn<F>
where
    F: Fn(&[Value], &BTreeMap<String, Value>, &dyn ProgressReporter) -> Fut + Send + Sync,
    Fut: std::future::Future<Output = Return> + Send,
{
    fn arity(&self) -> (usize, Option<usize>) {
        self.arity
    }

    async fn invoke(&self, args: &[Value], kws: &BTreeMap<String, Value>, progress: &dyn ProgressReporter) -> Return {
        (self.f)(args, kws, progress).await
    }
}
