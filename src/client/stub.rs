//! The client-side call surface (§4.7, component C7).
//!
//! Exposed as an explicit message builder — `stub.call("Class",
//! "method", args, kws)` — rather than an attribute-transparent proxy
//! that forwards arbitrary method names (REDESIGN FLAGS, §9: Rust has
//! no `__getattr__` equivalent, and a builder keeps call sites
//! statically checkable).

// Layer 1: Standard library imports
use std::collections::BTreeMap;
use std::sync::Arc;

// Layer 2: Third-party crate imports
use serde_json::Value;

// Layer 3: Internal module imports
use crate::envelope::{Request, Window};
use crate::transport::{Destination, Producer, Reader};
use crate::util::Sn;

use super::error::ClientError;
use super::model::Timeout;
use super::policy::{Asynchronous, ProgressReport, Synchronous};
use super::watchdog::Watchdog;

/// One outstanding call's overrides; `None` fields fall back to the
/// [`Stub`]'s defaults.
///
/// `progress`, when set, is invoked for every `progress` reply observed
/// during [`Stub::call_with`]'s phase B wait (§4.7, §8 scenario 5).
#[derive(Clone, Default)]
pub struct CallOptions {
    pub window: Option<Window>,
    pub secret: Option<String>,
    pub timeout: Option<Timeout>,
    pub progress: Option<Arc<dyn Fn(ProgressReport) + Send + Sync>>,
}

impl std::fmt::Debug for CallOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CallOptions")
            .field("window", &self.window)
            .field("secret", &self.secret)
            .field("timeout", &self.timeout)
            .field("progress", &self.progress.is_some())
            .finish()
    }
}

/// A bound handle to one remote agent's queue, built from a
/// [`Producer`]/[`Reader`] pair and a reply address.
///
/// `reader`/`reply_destination` back [`Stub::call`] (phase A/B
/// search); `watchdog`, when present, backs [`Stub::call_async`].
pub struct Stub {
    self_address: String,
    destination: Destination,
    reply_destination: Destination,
    producer: Arc<dyn Producer>,
    reader: Arc<dyn Reader>,
    watchdog: Option<Arc<Watchdog>>,
    default_timeout: Timeout,
    default_secret: Option<String>,
}

impl Stub {
    pub fn new(
        self_address: impl Into<String>,
        destination: Destination,
        reply_destination: Destination,
        producer: Arc<dyn Producer>,
        reader: Arc<dyn Reader>,
    ) -> Self {
        Self {
            self_address: self_address.into(),
            destination,
            reply_destination,
            producer,
            reader,
            watchdog: None,
            default_timeout: Timeout::default(),
            default_secret: None,
        }
    }

    /// Attach a [`Watchdog`] over a reader bound to the same reply
    /// address, enabling [`Stub::call_async`]. The watchdog is started
    /// if it is not running already.
    pub fn with_watchdog(mut self, watchdog: Arc<Watchdog>) -> Self {
        watchdog.start();
        self.watchdog = Some(watchdog);
        self
    }

    pub fn with_default_timeout(mut self, timeout: Timeout) -> Self {
        self.default_timeout = timeout;
        self
    }

    pub fn with_default_secret(mut self, secret: impl Into<String>) -> Self {
        self.default_secret = Some(secret.into());
        self
    }

    /// Synchronous call: blocks through `started` then through
    /// progress/terminal, per [`Synchronous`].
    pub async fn call(
        &self,
        classname: impl Into<String>,
        method: impl Into<String>,
        args: Vec<Value>,
        kws: BTreeMap<String, Value>,
    ) -> Result<Value, ClientError> {
        self.call_with(classname, method, args, kws, CallOptions::default()).await
    }

    pub async fn call_with(
        &self,
        classname: impl Into<String>,
        method: impl Into<String>,
        args: Vec<Value>,
        kws: BTreeMap<String, Value>,
        options: CallOptions,
    ) -> Result<Value, ClientError> {
        let request = Request::new(classname, method).with_args(args).with_kws(kws);
        let timeout = options.timeout.unwrap_or(self.default_timeout);
        let secret = options.secret.or_else(|| self.default_secret.clone());
        let policy = Synchronous::new(timeout);
        policy
            .invoke(
                self.producer.as_ref(),
                self.reader.as_ref(),
                &self.destination,
                &self.reply_destination,
                &self.self_address,
                request,
                options.window,
                secret,
                options.progress.as_deref(),
            )
            .await
    }

    /// Asynchronous call: sends and returns the request's `sn`
    /// immediately; `callback` fires from the attached [`Watchdog`]'s
    /// drain loop once a terminal reply arrives.
    pub async fn call_async(
        &self,
        classname: impl Into<String>,
        method: impl Into<String>,
        args: Vec<Value>,
        kws: BTreeMap<String, Value>,
        options: CallOptions,
        callback: impl FnOnce(Result<Value, ClientError>) + Send + 'static,
    ) -> Result<Sn, ClientError> {
        let watchdog = self.watchdog.clone().ok_or(ClientError::WatchdogMissing)?;
        let request = Request::new(classname, method).with_args(args).with_kws(kws);
        let secret = options.secret.or_else(|| self.default_secret.clone());
        let policy = Asynchronous::new(watchdog);
        policy
            .invoke(
                self.producer.as_ref(),
                &self.destination,
                &self.reply_destination,
                &self.self_address,
                request,
                options.window,
                secret,
                callback,
            )
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::envelope::{Envelope, ReplyResult, Routing};
    use crate::transport::InMemoryTransportFactory;
    use parking_lot::Mutex;
    use serde_json::json;
    use std::time::Duration;

    #[tokio::test]
    async fn call_round_trips_through_echo() {
        let factory = InMemoryTransportFactory::new();
        let agent = Destination::direct("agent-1");
        let reply = Destination::direct("client-1");

        let stub = Stub::new(
            "client",
            agent.clone(),
            reply.clone(),
            Arc::new(factory.producer()),
            Arc::new(factory.reader(reply.clone())),
        )
        .with_default_timeout(Timeout::new(Duration::from_millis(200), Duration::from_millis(200)));

        let agent_reader = factory.reader(agent.clone());
        let agent_producer = factory.producer();
        let responder = async move {
            let incoming = agent_reader.fetch(Duration::from_secs(1)).await.unwrap().unwrap();
            let sn = incoming.sn;
            agent_producer
                .send(&reply, Envelope::started(Routing::new("agent-1", "client-1"), sn, None))
                .await
                .unwrap();
            agent_producer
                .send(
                    &reply,
                    Envelope::reply(Routing::new("agent-1", "client-1"), sn, None, ReplyResult::success(json!(7))),
                )
                .await
                .unwrap();
        };

        let (result, _) = tokio::join!(stub.call("Calc", "square", vec![json!(7)], BTreeMap::new()), responder);
        assert_eq!(result.unwrap(), json!(7));
    }

    #[tokio::test]
    async fn call_async_invokes_callback_from_watchdog() {
        let factory = InMemoryTransportFactory::new();
        let agent = Destination::direct("agent-3");
        let reply = Destination::direct("client-3");

        let watchdog = Watchdog::new(Arc::new(factory.reader(reply.clone())));
        let stub = Stub::new(
            "client",
            agent.clone(),
            reply.clone(),
            Arc::new(factory.producer()),
            Arc::new(factory.reader(reply.clone())),
        )
        .with_watchdog(Arc::clone(&watchdog));

        let result: Arc<Mutex<Option<Result<Value, ClientError>>>> = Arc::new(Mutex::new(None));
        let result_clone = Arc::clone(&result);
        let sn = stub
            .call_async(
                "Calc",
                "square",
                vec![json!(3)],
                BTreeMap::new(),
                CallOptions::default(),
                move |r| *result_clone.lock() = Some(r),
            )
            .await
            .unwrap();

        let agent_reader = factory.reader(agent);
        let agent_producer = factory.producer();
        let incoming = agent_reader.fetch(Duration::from_secs(1)).await.unwrap().unwrap();
        assert_eq!(incoming.sn, sn);
        agent_producer
            .send(&reply, Envelope::reply(Routing::new("agent-3", "client-3"), sn, None, ReplyResult::success(json!(9))))
            .await
            .unwrap();

        tokio::time::timeout(Duration::from_secs(1), async {
            loop {
                if result.lock().is_some() {
                    break;
                }
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        })
        .await
        .unwrap();

        watchdog.stop().await;
        assert_eq!(result.lock().take().unwrap().unwrap(), json!(9));
    }

    #[tokio::test]
    async fn call_with_progress_fires_callback_for_each_tick() {
        let factory = InMemoryTransportFactory::new();
        let agent = Destination::direct("agent-4");
        let reply = Destination::direct("client-4");

        let stub = Stub::new(
            "client",
            agent.clone(),
            reply.clone(),
            Arc::new(factory.producer()),
            Arc::new(factory.reader(reply.clone())),
        )
        .with_default_timeout(Timeout::new(Duration::from_millis(200), Duration::from_millis(200)));

        let agent_reader = factory.reader(agent.clone());
        let agent_producer = factory.producer();
        let responder = async move {
            let incoming = agent_reader.fetch(Duration::from_secs(1)).await.unwrap().unwrap();
            let sn = incoming.sn;
            agent_producer
                .send(&reply, Envelope::started(Routing::new("agent-4", "client-4"), sn, None))
                .await
                .unwrap();
            for completed in 1..=2u64 {
                agent_producer
                    .send(
                        &reply,
                        Envelope::progress(Routing::new("agent-4", "client-4"), sn, None, Some(2), Some(completed), None),
                    )
                    .await
                    .unwrap();
            }
            agent_producer
                .send(
                    &reply,
                    Envelope::reply(Routing::new("agent-4", "client-4"), sn, None, ReplyResult::success(json!("done"))),
                )
                .await
                .unwrap();
        };

        let seen: Arc<Mutex<Vec<Option<u64>>>> = Arc::new(Mutex::new(Vec::new()));
        let seen_clone = Arc::clone(&seen);
        let options = CallOptions {
            progress: Some(Arc::new(move |report: ProgressReport| seen_clone.lock().push(report.completed))),
            ..CallOptions::default()
        };

        let (result, _) =
            tokio::join!(stub.call_with("Calc", "crunch", Vec::new(), BTreeMap::new(), options), responder);
        assert_eq!(result.unwrap(), json!("done"));
        assert_eq!(*seen.lock(), vec![Some(1), Some(2)]);
    }

    #[tokio::test]
    async fn call_async_without_watchdog_reports_missing_watchdog() {
        let factory = InMemoryTransportFactory::new();
        let agent = Destination::direct("agent-5");
        let reply = Destination::direct("client-5");
        let stub = Stub::new(
            "client",
            agent,
            reply.clone(),
            Arc::new(factory.producer()),
            Arc::new(factory.reader(reply)),
        );

        let err = stub
            .call_async("Calc", "square", vec![json!(1)], BTreeMap::new(), CallOptions::default(), |_| {})
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::WatchdogMissing));
    }
}
