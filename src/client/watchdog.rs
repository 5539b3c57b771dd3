//! Asynchronous reply watchdog (`gofer.rmi.policy.Asynchronous`,
//! `Watchdog`): a background task that drains a client's reply queue
//! and fires the [`Trigger`] registered for each `sn` as replies
//! arrive, so a caller of [`super::Asynchronous`] never blocks.

// Layer 1: Standard library imports
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

// Layer 2: Third-party crate imports
use dashmap::DashMap;
use parking_lot::Mutex as SyncMutex;
use tokio::task::JoinHandle;
use tracing::warn;

// Layer 3: Internal module imports
use crate::transport::Reader;
use crate::util::Sn;

use super::policy::{reply_to_result, Trigger};

const POLL_WAIT: Duration = Duration::from_secs(3);

/// Tracks one [`Trigger`] per outstanding asynchronous call and fires
/// it when a matching reply (progress or terminal) is fetched off
/// `reader`.
pub struct Watchdog {
    reader: Arc<dyn Reader>,
    triggers: Arc<DashMap<Sn, Arc<Trigger>>>,
    stopping: Arc<AtomicBool>,
    handle: SyncMutex<Option<JoinHandle<()>>>,
}

impl Watchdog {
    pub fn new(reader: Arc<dyn Reader>) -> Arc<Self> {
        Arc::new(Self {
            reader,
            triggers: Arc::new(DashMap::new()),
            stopping: Arc::new(AtomicBool::new(false)),
            handle: SyncMutex::new(None),
        })
    }

    /// Register `trigger` under `sn`, replacing any address a caller
    /// left no longer waiting on (there should be none).
    pub fn register(&self, sn: Sn, trigger: Arc<Trigger>) {
        self.triggers.insert(sn, trigger);
    }

    pub fn deregister(&self, sn: Sn) {
        self.triggers.remove(&sn);
    }

    /// Start the drain loop on its own task. Idempotent: calling twice
    /// on an already-running watchdog is a no-op.
    pub fn start(self: &Arc<Self>) {
        let mut handle = self.handle.lock();
        if handle.is_some() {
            return;
        }
        let watchdog = Arc::clone(self);
        *handle = Some(tokio::spawn(async move { watchdog.run().await }));
    }

    async fn run(self: Arc<Self>) {
        while !self.stopping.load(Ordering::Relaxed) {
            match self.reader.fetch(POLL_WAIT).await {
                Ok(Some(envelope)) => {
                    let sn = envelope.sn;
                    if envelope.is_progress() {
                        // A progress tick keeps the call alive but does
                        // not resolve the trigger yet.
                        continue;
                    }
                    if envelope.is_terminal() {
                        if let Some((_, trigger)) = self.triggers.remove(&sn) {
                            let _ = trigger.fire(reply_to_result(sn, envelope));
                        }
                    }
                    if let Err(err) = self.reader.ack().await {
                        warn!(error = %err, "watchdog failed to ack reply");
                    }
                }
                Ok(None) => continue,
                Err(err) => {
                    warn!(error = %err, "watchdog fetch failed; drain loop exiting");
                    break;
                }
            }
        }
    }

    /// Stop the drain loop and join it. Any triggers still registered
    /// are left unfired — the caller's own timeout handling takes over.
    pub async fn stop(&self) {
        self.stopping.store(true, Ordering::Relaxed);
        let handle = self.handle.lock().take();
        if let Some(handle) = handle {
            let _ = handle.await;
        }
        let _ = self.reader.close().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::envelope::{Envelope, ReplyResult, Routing, Request};
    use crate::transport::{Destination, InMemoryTransportFactory};
    use parking_lot::Mutex;
    use serde_json::json;
    use std::time::Duration as StdDuration;

    #[tokio::test]
    async fn fires_trigger_on_terminal_reply() {
        let factory = InMemoryTransportFactory::new();
        let reply_dest = Destination::direct("watchdog-reply");
        let reader = Arc::new(factory.reader(reply_dest.clone()));
        let producer = factory.producer();

        let watchdog = Watchdog::new(reader);
        watchdog.start();

        let request = Request::new("TestAdmin", "echo");
        let req_env = Envelope::request(Routing::new("client", "agent-1"), request);
        let sn = req_env.sn;

        let fired: Arc<Mutex<Option<Result<serde_json::Value, super::super::error::ClientError>>>> =
            Arc::new(Mutex::new(None));
        let fired_clone = Arc::clone(&fired);
        let trigger = Arc::new(Trigger::new(sn, move |result| {
            *fired_clone.lock() = Some(result);
        }));
        watchdog.register(sn, trigger);

        let reply = Envelope::reply(
            Routing::new("agent-1", "client"),
            sn,
            None,
            ReplyResult::success(json!("ok")),
        );
        producer.send(&reply_dest, reply).await.unwrap();

        tokio::time::timeout(StdDuration::from_secs(1), async {
            loop {
                if fired.lock().is_some() {
                    break;
                }
                tokio::time::sleep(StdDuration::from_millis(10)).await;
            }
        })
        .await
        .unwrap();

        watchdog.stop().await;
        assert_eq!(fired.lock().take().unwrap().unwrap(), json!("ok"));
    }
}
