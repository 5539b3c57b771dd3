//! The pending store's timer thread (§4.3 "Replay").

// Layer 1: Standard library imports
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration as StdDuration;

// Layer 2: Third-party crate imports
use async_trait::async_trait;
use chrono::Utc;
use tokio::task::JoinHandle;

// Layer 3: Internal module imports
use super::store::PendingStore;
use crate::envelope::Envelope;

/// Idle poll interval used when the store is empty or the earliest
/// entry's window has not opened far enough in the future to bother
/// sleeping for the exact duration.
const IDLE_POLL: StdDuration = StdDuration::from_millis(200);
const MAX_SLEEP: StdDuration = StdDuration::from_secs(1);

/// Re-injects a replayed envelope into the dispatch path "as if newly
/// received" (§4.3). The sink runs the same window check a freshly
/// fetched envelope would, so a window that has since lapsed still
/// produces the normal `WindowMissed` terminal reply.
#[async_trait]
pub trait ReplaySink: Send + Sync {
    async fn replay(&self, envelope: Envelope);
}

/// Owns one [`PendingStore`] and the background task that wakes at the
/// earliest `window.begin` and replays it.
pub struct PendingScheduler {
    stopping: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl PendingScheduler {
    /// Spawn the timer task. Each tick re-checks the earliest entry so
    /// that a newer, earlier admission wakes the loop on its next poll
    /// rather than after the previously-earliest entry's full delay.
    pub fn spawn<S>(store: Arc<PendingStore>, sink: Arc<S>) -> Self
    where
        S: ReplaySink + 'static,
    {
        let stopping = Arc::new(AtomicBool::new(false));
        let loop_stopping = Arc::clone(&stopping);
        let handle = tokio::spawn(async move {
            while !loop_stopping.load(Ordering::Relaxed) {
                let Some(entry) = store.earliest() else {
                    tokio::time::sleep(IDLE_POLL).await;
                    continue;
                };
                let begin = entry
                    .envelope
                    .window
                    .map(|w| w.begin)
                    .unwrap_or_else(Utc::now);
                let now = Utc::now();
                if begin > now {
                    let remaining = (begin - now)
                        .to_std()
                        .unwrap_or(StdDuration::ZERO)
                        .min(MAX_SLEEP);
                    tokio::time::sleep(remaining).await;
                    continue;
                }
                sink.replay(entry.envelope.clone()).await;
                let _ = store.remove(entry.sn()).await;
            }
        });
        Self {
            stopping,
            handle: Some(handle),
        }
    }

    /// Signal the timer task to stop and wait for it to exit.
    pub async fn stop(&mut self) {
        self.stopping.store(true, Ordering::Relaxed);
        if let Some(handle) = self.handle.take() {
            let _ = handle.await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::envelope::{Request, Routing, Window};
    use parking_lot::Mutex;
    use std::time::Duration;
    use tempfile::tempdir;

    struct RecordingSink {
        replayed: Arc<Mutex<Vec<Envelope>>>,
    }

    #[async_trait]
    impl ReplaySink for RecordingSink {
        async fn replay(&self, envelope: Envelope) {
            self.replayed.lock().push(envelope);
        }
    }

    #[tokio::test]
    async fn replays_once_window_opens() {
        let dir = tempdir().unwrap();
        let store = Arc::new(PendingStore::open(dir.path().join("p.log")).await.unwrap());
        let env = Envelope::request(Routing::new("client", "agent-1"), Request::new("TestAdmin", "echo"))
            .with_window(Window::new(
                Utc::now() + chrono::Duration::milliseconds(50),
                Duration::from_secs(60),
            ));
        let sn = env.sn;
        store.admit(env).await.unwrap();

        let replayed = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::new(RecordingSink {
            replayed: Arc::clone(&replayed),
        });
        let mut scheduler = PendingScheduler::spawn(Arc::clone(&store), sink);

        tokio::time::sleep(Duration::from_millis(300)).await;
        scheduler.stop().await;

        assert_eq!(replayed.lock().len(), 1);
        assert_eq!(replayed.lock()[0].sn, sn);
        assert!(store.is_empty());
    }
}
