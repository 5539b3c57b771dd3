//! Request consumer (§4.6, component C6): the agent-side receive loop.

pub mod error;
pub mod state;

pub use error::ConsumerError;
pub use state::ConsumerState;

// Layer 1: Standard library imports
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

// Layer 2: Third-party crate imports
use async_trait::async_trait;
use parking_lot::Mutex as SyncMutex;
use tokio::sync::Mutex as AsyncMutex;
use tokio::task::JoinHandle;
use tracing::{info, warn};

// Layer 3: Internal module imports
use crate::auth::Authenticator;
use crate::dispatcher::{Dispatcher, ProgressReporter, Return};
use crate::envelope::{Envelope, ReplyResult, Routing, SUPPORTED_VERSION};
use crate::pending::{PendingScheduler, PendingStore, ReplaySink};
use crate::pool::{Job, ThreadPool};
use crate::transport::{Destination, Producer, Reader};
use crate::util::Sn;

/// Fetch tick duration (§4.6 step 1: "Fetch with `WAIT=3s` ticks").
pub const FETCH_WAIT: Duration = Duration::from_secs(3);
/// Shutdown join budget (§5 "Cancellation / shutdown").
pub const STOP_JOIN_BUDGET: Duration = Duration::from_secs(10);

/// The agent-side receive loop for one plugin's queue.
///
/// Owns its [`Reader`] (one receiver-link), one [`Producer`] for
/// replies, the plugin's [`Dispatcher`] and [`ThreadPool`], and its
/// [`PendingStore`] (§3 "Ownership").
pub struct RequestConsumer {
    self_address: String,
    reader: Arc<dyn Reader>,
    producer: Arc<dyn Producer>,
    dispatcher: Arc<Dispatcher>,
    pool: Arc<ThreadPool<Return>>,
    pending: Arc<PendingStore>,
    authenticator: Option<Arc<dyn Authenticator>>,
    state: SyncMutex<ConsumerState>,
    stopping: Arc<AtomicBool>,
    receive_loop: AsyncMutex<Option<JoinHandle<()>>>,
    scheduler: AsyncMutex<Option<PendingScheduler>>,
}

impl RequestConsumer {
    pub fn new(
        self_address: impl Into<String>,
        reader: Arc<dyn Reader>,
        producer: Arc<dyn Producer>,
        dispatcher: Arc<Dispatcher>,
        pool: Arc<ThreadPool<Return>>,
        pending: Arc<PendingStore>,
        authenticator: Option<Arc<dyn Authenticator>>,
    ) -> Arc<Self> {
        Arc::new(Self {
            self_address: self_address.into(),
            reader,
            producer,
            dispatcher,
            pool,
            pending,
            authenticator,
            state: SyncMutex::new(ConsumerState::Created),
            stopping: Arc::new(AtomicBool::new(false)),
            receive_loop: AsyncMutex::new(None),
            scheduler: AsyncMutex::new(None),
        })
    }

    pub fn state(&self) -> ConsumerState {
        *self.state.lock()
    }

    fn transition(&self, next: ConsumerState) {
        let mut state = self.state.lock();
        debug_assert!(state.can_transition_to(next), "illegal consumer transition");
        *state = next;
    }

    /// Open the receiver, start the pending-store replay task, and
    /// begin the receive loop on its own task (§4.6 "On `start`").
    pub async fn start(self: &Arc<Self>) -> Result<(), ConsumerError> {
        if self.state() != ConsumerState::Created {
            return Err(ConsumerError::AlreadyStarted);
        }
        self.transition(ConsumerState::Opened);

        let sink = Arc::new(ReplaySinkImpl {
            consumer: Arc::clone(self),
        });
        let scheduler = PendingScheduler::spawn(Arc::clone(&self.pending), sink);
        *self.scheduler.lock().await = Some(scheduler);

        self.transition(ConsumerState::Running);
        let consumer = Arc::clone(self);
        let handle = tokio::spawn(async move { consumer.receive_loop().await });
        *self.receive_loop.lock().await = Some(handle);
        Ok(())
    }

    /// Flip the run flag, wait for the next fetch tick to notice, then
    /// join the pending receiver and the pool within their budgets
    /// (§5 "Cancellation / shutdown").
    pub async fn stop(&self) -> Result<(), ConsumerError> {
        if self.state() == ConsumerState::Created {
            return Err(ConsumerError::NotRunning);
        }
        self.transition(ConsumerState::Stopping);
        self.stopping.store(true, Ordering::Relaxed);

        if let Some(handle) = self.receive_loop.lock().await.take() {
            let _ = tokio::time::timeout(STOP_JOIN_BUDGET, handle).await;
        }
        if let Some(mut scheduler) = self.scheduler.lock().await.take() {
            scheduler.stop().await;
        }
        self.reader.close().await?;
        self.producer.close().await?;
        self.transition(ConsumerState::Stopped);
        Ok(())
    }

    async fn receive_loop(self: Arc<Self>) {
        while !self.stopping.load(Ordering::Relaxed) {
            match self.reader.fetch(FETCH_WAIT).await {
                Ok(Some(envelope)) => {
                    self.process(envelope).await;
                    if let Err(err) = self.reader.ack().await {
                        warn!(error = %err, "failed to ack inbound envelope");
                    }
                }
                Ok(None) => continue,
                Err(err) => {
                    warn!(error = %err, "fetch failed; receive loop exiting");
                    break;
                }
            }
        }
    }

    /// Steps 2-6 of §4.6, shared between the live fetch path and the
    /// pending-store replay path (which re-injects an envelope "as if
    /// newly received" with no underlying delivery to ack).
    async fn process(&self, envelope: Envelope) {
        if envelope.version != SUPPORTED_VERSION {
            warn!(sn = %envelope.sn, version = %envelope.version, "version mismatch; discarding");
            return;
        }

        if let Some(auth) = &self.authenticator {
            let verified = match &envelope.signature {
                Some(signature) => {
                    let mut unsigned = envelope.clone();
                    unsigned.signature = None;
                    let body = match serde_json::to_vec(&unsigned) {
                        Ok(body) => body,
                        Err(_) => return,
                    };
                    auth.verify(&body, signature).is_ok()
                }
                None => false,
            };
            if !verified {
                self.reply_rejection(&envelope, "AuthFailure", "envelope signature verification failed")
                    .await;
                return;
            }
        }

        if let Some(window) = envelope.window {
            if window.future() {
                if let Err(err) = self.pending.admit(envelope).await {
                    warn!(error = %err, "failed to admit envelope to pending store");
                }
                return;
            }
            if window.past() {
                self.reply_rejection(&envelope, "WindowMissed", "request window has already closed")
                    .await;
                return;
            }
        }

        if let Some(replyto) = envelope.replyto.clone() {
            self.send_started(&replyto, &envelope).await;
        }

        let request = match &envelope.request {
            Some(request) => request.clone(),
            None => return,
        };
        let dispatcher = Arc::clone(&self.dispatcher);
        let replyto = envelope.replyto.clone();
        let sn = envelope.sn;
        let any = envelope.any.clone();
        let self_address = self.self_address.clone();
        let producer = Arc::clone(&self.producer);

        let progress = ConsumerProgressReporter {
            producer: Arc::clone(&producer),
            self_address: self_address.clone(),
            replyto: replyto.clone(),
            sn,
            any: any.clone(),
        };

        // §4.5: enqueue on the pool either way — a pool of size 1
        // (`concurrent() == false`) already serializes this per-plugin.
        let run = Box::pin(async move { dispatcher.dispatch(&request, &progress).await });
        let job = Job::new(run).with_on_done(move |result| {
            tokio::spawn(deliver_reply(producer, self_address, replyto, sn, any, result));
        });
        if let Err(err) = self.pool.submit(job).await {
            warn!(error = %err, "failed to submit dispatch job");
        }
    }

    async fn send_started(&self, replyto: &str, envelope: &Envelope) {
        let Ok(destination) = replyto.parse::<Destination>() else {
            warn!(replyto, "malformed replyto address");
            return;
        };
        let reply = Envelope::started(
            Routing::new(self.self_address.clone(), replyto.to_string()),
            envelope.sn,
            envelope.any.clone(),
        );
        if let Err(err) = self.producer.send(&destination, reply).await {
            info!(error = %err, "failed to send started reply (non-fatal, per §4.6)");
        }
    }

    async fn reply_rejection(&self, envelope: &Envelope, exclass: &str, exmsg: &str) {
        let Some(replyto) = &envelope.replyto else {
            return;
        };
        let Ok(destination) = replyto.parse::<Destination>() else {
            return;
        };
        let result = ReplyResult::Failure {
            exval: exmsg.to_string(),
            xmodule: None,
            xclass: Some(exclass.to_string()),
            xstate: None,
            xargs: None,
        };
        let reply = Envelope::reply(
            Routing::new(self.self_address.clone(), replyto.clone()),
            envelope.sn,
            envelope.any.clone(),
            result,
        );
        if let Err(err) = self.producer.send(&destination, reply).await {
            info!(error = %err, "failed to send rejection reply (non-fatal, per §4.6)");
        }
    }
}

async fn deliver_reply(
    producer: Arc<dyn Producer>,
    self_address: String,
    replyto: Option<String>,
    sn: crate::util::Sn,
    any: Option<serde_json::Value>,
    result: Return,
) {
    let Some(replyto) = replyto else {
        return;
    };
    let Ok(destination) = replyto.parse::<Destination>() else {
        warn!(replyto, "malformed replyto address");
        return;
    };
    let reply = Envelope::reply(Routing::new(self_address, replyto), sn, any, result.into());
    if let Err(err) = producer.send(&destination, reply).await {
        info!(error = %err, "failed to send terminal reply (non-fatal, per §4.6)");
    }
}

/// Turns a dispatched method's [`ProgressReporter::report`] calls into
/// `progress` envelopes addressed back to the caller (§8 scenario 5).
struct ConsumerProgressReporter {
    producer: Arc<dyn Producer>,
    self_address: String,
    replyto: Option<String>,
    sn: Sn,
    any: Option<serde_json::Value>,
}

#[async_trait]
impl ProgressReporter for ConsumerProgressReporter {
    async fn report(&self, completed: u64, total: Option<u64>, details: Option<serde_json::Value>) {
        let Some(replyto) = &self.replyto else {
            return;
        };
        let Ok(destination) = replyto.parse::<Destination>() else {
            warn!(replyto, "malformed replyto address");
            return;
        };
        let reply = Envelope::progress(
            Routing::new(self.self_address.clone(), replyto.clone()),
            self.sn,
            self.any.clone(),
            total,
            Some(completed),
            details,
        );
        if let Err(err) = self.producer.send(&destination, reply).await {
            info!(error = %err, "failed to send progress reply (non-fatal, per §4.6)");
        }
    }
}

struct ReplaySinkImpl {
    consumer: Arc<RequestConsumer>,
}

#[async_trait]
impl ReplaySink for ReplaySinkImpl {
    async fn replay(&self, envelope: Envelope) {
        self.consumer.process(envelope).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatcher::{RemoteConstraints, RemoteFn};
    use crate::envelope::Request;
    use crate::transport::InMemoryTransportFactory;
    use serde_json::json;
    use tempfile::tempdir;

    async fn build_consumer(dir: &std::path::Path) -> (Arc<RequestConsumer>, InMemoryTransportFactory, Destination) {
        let factory = InMemoryTransportFactory::new();
        let self_dest = Destination::direct("agent-1");
        let dispatcher = Arc::new(Dispatcher::new());
        dispatcher
            .register(
                "TestAdmin",
                "echo",
                Arc::new(RemoteFn::new(|args: &[serde_json::Value], _kws, _progress| {
                    let args = args.to_vec();
                    async move { Return::success(args.first().cloned().unwrap_or(json!(null))) }
                })),
                RemoteConstraints::default(),
            )
            .unwrap();
        let pool = Arc::new(ThreadPool::new(1));
        let pending = Arc::new(PendingStore::open(dir.join("pending.log")).await.unwrap());
        let reader = Arc::new(factory.reader(self_dest.clone()));
        let producer = Arc::new(factory.producer());
        let consumer = RequestConsumer::new(
            self_dest.routing_key.clone(),
            reader,
            producer,
            dispatcher,
            pool,
            pending,
            None,
        );
        (consumer, factory, self_dest)
    }

    #[tokio::test]
    async fn echo_round_trip_produces_terminal_reply() {
        let dir = tempdir().unwrap();
        let (consumer, factory, self_dest) = build_consumer(dir.path()).await;
        consumer.start().await.unwrap();

        let reply_dest = Destination::direct("client-reply");
        let request_producer = factory.producer();
        let request_env = Envelope::request(
            Routing::new("client", self_dest.routing_key.clone()),
            Request::new("TestAdmin", "echo").with_args(vec![json!("hi")]),
        )
        .with_replyto(reply_dest.to_string());
        let sn = request_env.sn;
        request_producer.send(&self_dest, request_env).await.unwrap();

        let reply_reader = factory.reader(reply_dest);
        let started = reply_reader.fetch(Duration::from_secs(2)).await.unwrap().unwrap();
        assert!(started.is_started());
        assert_eq!(started.sn, sn);

        let terminal = reply_reader.fetch(Duration::from_secs(2)).await.unwrap().unwrap();
        assert!(terminal.is_terminal());
        assert_eq!(terminal.sn, sn);
        assert_eq!(terminal.result, Some(ReplyResult::Success { retval: json!("hi") }));

        consumer.stop().await.unwrap();
    }

    #[tokio::test]
    async fn past_window_yields_window_missed() {
        let dir = tempdir().unwrap();
        let (consumer, factory, self_dest) = build_consumer(dir.path()).await;
        consumer.start().await.unwrap();

        let reply_dest = Destination::direct("client-reply-2");
        let request_producer = factory.producer();
        let window = crate::envelope::Window::new(
            chrono::Utc::now() - chrono::Duration::seconds(60),
            Duration::from_secs(10),
        );
        let request_env = Envelope::request(
            Routing::new("client", self_dest.routing_key.clone()),
            Request::new("TestAdmin", "echo").with_args(vec![json!("hi")]),
        )
        .with_replyto(reply_dest.to_string())
        .with_window(window);
        request_producer.send(&self_dest, request_env).await.unwrap();

        let reply_reader = factory.reader(reply_dest);
        let terminal = reply_reader.fetch(Duration::from_secs(2)).await.unwrap().unwrap();
        assert!(terminal.is_terminal());
        match terminal.result {
            Some(ReplyResult::Failure { xclass, .. }) => assert_eq!(xclass.as_deref(), Some("WindowMissed")),
            other => panic!("expected WindowMissed failure, got {other:?}"),
        }

        consumer.stop().await.unwrap();
    }
}
