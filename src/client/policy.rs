//! Calling conventions (`gofer.rmi.policy`): [`Synchronous`] blocks the
//! caller through both reply phases; [`Asynchronous`] sends and returns
//! immediately, resolving a [`Trigger`] later via a [`super::Watchdog`].

// Layer 1: Standard library imports
use std::sync::Arc;
use std::time::Duration;

// Layer 2: Third-party crate imports
use parking_lot::Mutex as SyncMutex;
use serde_json::Value;
use tokio::time::Instant;

// Layer 3: Internal module imports
use crate::envelope::{Envelope, ReplyResult, Request, Routing, Window};
use crate::transport::{Destination, Producer, Reader};
use crate::util::Sn;

use super::error::{ClientError, TimeoutPhase};
use super::model::Timeout;
use super::watchdog::Watchdog;

/// Build the outbound request envelope shared by both policies.
fn build_request(
    self_address: &str,
    destination: &Destination,
    reply_destination: &Destination,
    request: Request,
    window: Option<Window>,
    secret: Option<String>,
) -> Envelope {
    let mut envelope = Envelope::request(Routing::new(self_address, destination.to_string()), request)
        .with_replyto(reply_destination.to_string());
    if let Some(window) = window {
        envelope = envelope.with_window(window);
    }
    if let Some(secret) = secret {
        envelope = envelope.with_secret(secret);
    }
    envelope
}

/// Fold a terminal reply's [`ReplyResult`] into the client-facing
/// `Result` (§7: remote exceptions "escape to the caller unchanged").
pub(super) fn reply_to_result(sn: Sn, envelope: Envelope) -> Result<Value, ClientError> {
    match envelope.result {
        Some(ReplyResult::Success { retval }) => Ok(retval),
        Some(ReplyResult::Failure { exval, xmodule, xclass, xargs, .. }) => {
            Err(ClientError::RemoteException { sn, exval, xclass, xmodule, xargs })
        }
        None => Err(ClientError::RequestTimeout { sn, phase: TimeoutPhase::ReplyMissing }),
    }
}

/// One intermediate progress tick, as delivered to the callback passed
/// to [`Synchronous::invoke`] (`rmi/policy.py`'s `Synchronous.__on_progress`).
#[derive(Debug, Clone)]
pub struct ProgressReport {
    pub sn: Sn,
    pub any: Option<Value>,
    pub total: Option<u64>,
    pub completed: Option<u64>,
    pub details: Option<Value>,
}

/// Blocks through phase A (waiting for `started`) and phase B (waiting
/// for progress/terminal), per `gofer.rmi.policy.Synchronous`.
pub struct Synchronous {
    timeout: Timeout,
}

impl Synchronous {
    pub fn new(timeout: Timeout) -> Self {
        Self { timeout }
    }

    #[allow(clippy::too_many_arguments)]
    pub async fn invoke(
        &self,
        producer: &dyn Producer,
        reader: &dyn Reader,
        destination: &Destination,
        reply_destination: &Destination,
        self_address: &str,
        request: Request,
        window: Option<Window>,
        secret: Option<String>,
        progress: Option<&(dyn Fn(ProgressReport) + Send + Sync)>,
    ) -> Result<Value, ClientError> {
        let envelope = build_request(self_address, destination, reply_destination, request, window, secret);
        let sn = envelope.sn;
        producer.send(destination, envelope).await?;

        self.wait_for_started(reader, sn).await?;
        self.wait_for_terminal(reader, sn, progress).await
    }

    async fn wait_for_started(&self, reader: &dyn Reader, sn: Sn) -> Result<(), ClientError> {
        let deadline = Instant::now() + self.timeout.start;
        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return Err(ClientError::RequestTimeout { sn, phase: TimeoutPhase::StartedMissing });
            }
            match reader.search(sn, remaining).await? {
                Some(envelope) if envelope.is_started() => return Ok(()),
                // A progress or terminal reply arriving before `started`
                // (e.g. a very fast handler) also satisfies phase A.
                Some(envelope) if envelope.is_progress() || envelope.is_terminal() => return Ok(()),
                Some(_) => continue,
                None => return Err(ClientError::RequestTimeout { sn, phase: TimeoutPhase::StartedMissing }),
            }
        }
    }

    /// Phase B: a single budget initialized to `timeout.duration` and
    /// decremented by each observed elapsed interval. A progress tick
    /// keeps the call alive but does not reset the budget
    /// (`gofer.rmi.policy.Synchronous.__get_reply`: `timeout -= elapsed`,
    /// never reset).
    async fn wait_for_terminal(
        &self,
        reader: &dyn Reader,
        sn: Sn,
        progress: Option<&(dyn Fn(ProgressReport) + Send + Sync)>,
    ) -> Result<Value, ClientError> {
        let mut remaining = self.timeout.duration;
        loop {
            if remaining.is_zero() {
                return Err(ClientError::RequestTimeout { sn, phase: TimeoutPhase::ReplyMissing });
            }
            let started_at = Instant::now();
            let envelope = reader.search(sn, remaining).await?;
            remaining = remaining.saturating_sub(started_at.elapsed());
            match envelope {
                Some(envelope) if envelope.is_terminal() => return reply_to_result(sn, envelope),
                Some(envelope) if envelope.is_progress() => {
                    if let Some(callback) = progress {
                        callback(ProgressReport {
                            sn,
                            any: envelope.any,
                            total: envelope.total,
                            completed: envelope.completed,
                            details: envelope.details,
                        });
                    }
                    continue;
                }
                Some(_) => continue,
                None => return Err(ClientError::RequestTimeout { sn, phase: TimeoutPhase::ReplyMissing }),
            }
        }
    }
}

impl Default for Synchronous {
    fn default() -> Self {
        Self::new(Timeout::default())
    }
}

/// Fire-once continuation for an asynchronous call
/// (`gofer.rmi.policy.Trigger`): the first call to [`Trigger::fire`]
/// runs the callback; every later call returns
/// [`ClientError::TriggerAlreadyFired`].
pub struct Trigger {
    sn: Sn,
    callback: SyncMutex<Option<Box<dyn FnOnce(Result<Value, ClientError>) + Send>>>,
}

impl Trigger {
    pub fn new(sn: Sn, callback: impl FnOnce(Result<Value, ClientError>) + Send + 'static) -> Self {
        Self { sn, callback: SyncMutex::new(Some(Box::new(callback))) }
    }

    pub fn fire(&self, result: Result<Value, ClientError>) -> Result<(), ClientError> {
        let callback = self.callback.lock().take();
        match callback {
            Some(callback) => {
                callback(result);
                Ok(())
            }
            None => Err(ClientError::TriggerAlreadyFired { sn: self.sn }),
        }
    }

    pub fn has_fired(&self) -> bool {
        self.callback.lock().is_none()
    }
}

/// A prepared asynchronous call that has not yet been dispatched — the
/// manual-trigger mode of `gofer.rmi.policy.Asynchronous.send`/
/// `broadcast` (`trigger == 1`): building one registers nothing and
/// sends nothing. The request is only handed to the producer, and the
/// watchdog only told to expect a reply, once [`Deferred::fire`] runs
/// (mirrors `Trigger.__call__`/`__send` in the original, which defer the
/// actual send the same way).
pub struct Deferred {
    envelope: Envelope,
    destination: Destination,
    watchdog: Arc<Watchdog>,
}

impl Deferred {
    pub fn sn(&self) -> Sn {
        self.envelope.sn
    }

    /// Dispatch the request and register `callback` to resolve once a
    /// reply for it arrives. Consumes `self`, so a `Deferred` can only
    /// ever fire once.
    pub async fn fire(
        self,
        producer: &dyn Producer,
        callback: impl FnOnce(Result<Value, ClientError>) + Send + 'static,
    ) -> Result<Sn, ClientError> {
        let sn = self.envelope.sn;
        self.watchdog.register(sn, Arc::new(Trigger::new(sn, callback)));
        if let Err(err) = producer.send(&self.destination, self.envelope).await {
            self.watchdog.deregister(sn);
            return Err(err.into());
        }
        Ok(sn)
    }
}

/// Sends and returns immediately; the caller's [`Trigger`] resolves
/// later, off a [`Watchdog`] draining the reply queue
/// (`gofer.rmi.policy.Asynchronous`).
pub struct Asynchronous {
    watchdog: Arc<Watchdog>,
}

impl Asynchronous {
    pub fn new(watchdog: Arc<Watchdog>) -> Self {
        Self { watchdog }
    }

    /// Build the request without sending it (manual-trigger mode, §9 /
    /// `trigger == 1`): the caller decides when to actually dispatch by
    /// calling [`Deferred::fire`].
    pub fn prepare(
        &self,
        destination: &Destination,
        reply_destination: &Destination,
        self_address: &str,
        request: Request,
        window: Option<Window>,
        secret: Option<String>,
    ) -> Deferred {
        let envelope = build_request(self_address, destination, reply_destination, request, window, secret);
        Deferred {
            envelope,
            destination: destination.clone(),
            watchdog: Arc::clone(&self.watchdog),
        }
    }

    /// Send immediately and register `callback` — the default,
    /// automatic-trigger mode.
    #[allow(clippy::too_many_arguments)]
    pub async fn invoke(
        &self,
        producer: &dyn Producer,
        destination: &Destination,
        reply_destination: &Destination,
        self_address: &str,
        request: Request,
        window: Option<Window>,
        secret: Option<String>,
        callback: impl FnOnce(Result<Value, ClientError>) + Send + 'static,
    ) -> Result<Sn, ClientError> {
        self.prepare(destination, reply_destination, self_address, request, window, secret)
            .fire(producer, callback)
            .await
    }

    /// Send the same request to every destination in `destinations`,
    /// each under its own serial number (`gofer.rmi.policy.Asynchronous.broadcast`).
    /// `callback` is shared across all destinations and told which `sn`
    /// each reply correlates to.
    #[allow(clippy::too_many_arguments)]
    pub async fn broadcast(
        &self,
        producer: &dyn Producer,
        destinations: &[Destination],
        reply_destination: &Destination,
        self_address: &str,
        request: Request,
        window: Option<Window>,
        secret: Option<String>,
        callback: Arc<dyn Fn(Sn, Result<Value, ClientError>) + Send + Sync>,
    ) -> Result<Vec<Sn>, ClientError> {
        let mut sns = Vec::with_capacity(destinations.len());
        for destination in destinations {
            let envelope =
                build_request(self_address, destination, reply_destination, request.clone(), window.clone(), secret.clone());
            let sn = envelope.sn;
            let callback = Arc::clone(&callback);
            self.watchdog
                .register(sn, Arc::new(Trigger::new(sn, move |result| callback(sn, result))));
            if let Err(err) = producer.send(destination, envelope).await {
                self.watchdog.deregister(sn);
                return Err(err.into());
            }
            sns.push(sn);
        }
        Ok(sns)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::envelope::{Request, Status};
    use crate::transport::InMemoryTransportFactory;
    use parking_lot::Mutex;
    use serde_json::json;

    fn request() -> Request {
        Request::new("TestAdmin", "echo").with_args(vec![json!("hi")])
    }

    #[tokio::test]
    async fn synchronous_round_trip_resolves_on_terminal_reply() {
        let factory = InMemoryTransportFactory::new();
        let agent = Destination::direct("agent-1");
        let reply = Destination::direct("client-1");
        let producer = factory.producer();
        let reader = factory.reader(reply.clone());
        let agent_reader = factory.reader(agent.clone());
        let agent_producer = factory.producer();

        let policy = Synchronous::new(Timeout::new(Duration::from_millis(200), Duration::from_millis(200)));
        let call = policy.invoke(&producer, &reader, &agent, &reply, "client", request(), None, None, None);

        let responder = async {
            let incoming = agent_reader.fetch(Duration::from_secs(1)).await.unwrap().unwrap();
            let sn = incoming.sn;
            let started = Envelope::started(Routing::new("agent-1", "client-1"), sn, None);
            agent_producer.send(&reply, started).await.unwrap();
            let terminal = Envelope::reply(
                Routing::new("agent-1", "client-1"),
                sn,
                None,
                ReplyResult::success(json!("hi")),
            );
            agent_producer.send(&reply, terminal).await.unwrap();
        };

        let (result, _) = tokio::join!(call, responder);
        assert_eq!(result.unwrap(), json!("hi"));
    }

    #[tokio::test]
    async fn synchronous_times_out_when_started_never_arrives() {
        let factory = InMemoryTransportFactory::new();
        let agent = Destination::direct("agent-2");
        let reply = Destination::direct("client-2");
        let producer = factory.producer();
        let reader = factory.reader(reply.clone());

        let policy = Synchronous::new(Timeout::new(Duration::from_millis(20), Duration::from_millis(20)));
        let err = policy
            .invoke(&producer, &reader, &agent, &reply, "client", request(), None, None, None)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ClientError::RequestTimeout { phase: TimeoutPhase::StartedMissing, .. }
        ));
    }

    #[tokio::test]
    async fn progress_ticks_invoke_callback_but_do_not_reset_the_budget() {
        let factory = InMemoryTransportFactory::new();
        let agent = Destination::direct("agent-5");
        let reply = Destination::direct("client-5");
        let producer = factory.producer();
        let reader = factory.reader(reply.clone());
        let agent_reader = factory.reader(agent.clone());
        let agent_producer = factory.producer();

        // Phase B budget is 150ms; the responder ticks progress every
        // 40ms forever. Under a reset-on-progress policy this call would
        // never time out; with a decrementing budget it must still fail
        // once the cumulative elapsed time passes 150ms.
        let policy = Synchronous::new(Timeout::new(Duration::from_millis(200), Duration::from_millis(150)));
        let seen = Arc::new(Mutex::new(Vec::new()));
        let seen_clone = Arc::clone(&seen);
        let callback = move |report: ProgressReport| seen_clone.lock().push(report.completed);
        let call = policy.invoke(
            &producer,
            &reader,
            &agent,
            &reply,
            "client",
            request(),
            None,
            None,
            Some(&callback),
        );

        let responder = async {
            let incoming = agent_reader.fetch(Duration::from_secs(1)).await.unwrap().unwrap();
            let sn = incoming.sn;
            let started = Envelope::started(Routing::new("agent-5", "client-5"), sn, None);
            agent_producer.send(&reply, started).await.unwrap();
            for tick in 0..10u64 {
                tokio::time::sleep(Duration::from_millis(40)).await;
                let progress = Envelope::progress(Routing::new("agent-5", "client-5"), sn, None, Some(10), Some(tick), None);
                if agent_producer.send(&reply, progress).await.is_err() {
                    break;
                }
            }
        };

        let (result, _) = tokio::join!(call, responder);
        assert!(matches!(
            result,
            Err(ClientError::RequestTimeout { phase: TimeoutPhase::ReplyMissing, .. })
        ));
        assert!(!seen.lock().is_empty());
    }

    #[test]
    fn trigger_fires_exactly_once() {
        let sn = Sn::new();
        let trigger = Trigger::new(sn, |_| {});
        assert!(trigger.fire(Ok(json!(null))).is_ok());
        assert!(matches!(
            trigger.fire(Ok(json!(null))),
            Err(ClientError::TriggerAlreadyFired { .. })
        ));
    }

    #[test]
    fn status_enum_is_exhaustively_covered_by_started_check() {
        // Sanity: `Status::Accepted`/`Rejected` are not mistaken for `started`.
        assert_ne!(Status::Accepted, Status::Started);
    }

    #[tokio::test]
    async fn deferred_does_not_send_until_fired() {
        let factory = InMemoryTransportFactory::new();
        let agent = Destination::direct("agent-6");
        let reply = Destination::direct("client-6");
        let producer = factory.producer();
        let agent_reader = factory.reader(agent.clone());

        let watchdog = Watchdog::new(Arc::new(factory.reader(reply.clone())));
        let policy = Asynchronous::new(watchdog);
        let deferred = policy.prepare(&agent, &reply, "client", request(), None, None);
        let sn = deferred.sn();

        assert!(agent_reader.fetch(Duration::from_millis(50)).await.unwrap().is_none());

        deferred.fire(&producer, |_| {}).await.unwrap();
        let sent = agent_reader.fetch(Duration::from_secs(1)).await.unwrap().unwrap();
        assert_eq!(sent.sn, sn);
    }

    #[tokio::test]
    async fn broadcast_sends_to_every_destination_with_distinct_sns() {
        let factory = InMemoryTransportFactory::new();
        let reply = Destination::direct("client-7");
        let producer = factory.producer();
        let agent_a = Destination::direct("agent-7a");
        let agent_b = Destination::direct("agent-7b");

        let watchdog = Watchdog::new(Arc::new(factory.reader(reply.clone())));
        let policy = Asynchronous::new(watchdog);
        let results: Arc<Mutex<Vec<(Sn, Result<Value, ClientError>)>>> = Arc::new(Mutex::new(Vec::new()));
        let results_clone = Arc::clone(&results);
        let callback: Arc<dyn Fn(Sn, Result<Value, ClientError>) + Send + Sync> =
            Arc::new(move |sn, result| results_clone.lock().push((sn, result)));

        let sns = policy
            .broadcast(
                &producer,
                &[agent_a.clone(), agent_b.clone()],
                &reply,
                "client",
                request(),
                None,
                None,
                callback,
            )
            .await
            .unwrap();
        assert_eq!(sns.len(), 2);
        assert_ne!(sns[0], sns[1]);

        let reader_a = factory.reader(agent_a);
        let reader_b = factory.reader(agent_b);
        let first = reader_a.fetch(Duration::from_secs(1)).await.unwrap().unwrap();
        let second = reader_b.fetch(Duration::from_secs(1)).await.unwrap().unwrap();
        assert!(sns.contains(&first.sn));
        assert!(sns.contains(&second.sn));
    }
}
